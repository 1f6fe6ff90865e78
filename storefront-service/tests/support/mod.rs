#![allow(dead_code)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common_auth::{AuthSettings, TokenVerifier};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use storefront_service::{router, AppState};
use tower::ServiceExt;

pub const KID: &str = "storefront-test";
pub const AUDIENCE: &str = "storefront-api";

/// A storefront router whose verifier trusts a mock issuer serving one RSA key.
pub struct TestApp {
    pub server: MockServer,
    pub router: Router,
    encoding: EncodingKey,
}

impl TestApp {
    pub async fn start() -> Self {
        Self::with_jwks_status(200).await
    }

    /// Same app, but the issuer's key-set endpoint answers with `status`;
    /// anything other than 200 comes back with a non-JSON body.
    pub async fn with_jwks_status(status: u16) -> Self {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation");
        let public_key = private_key.to_public_key();
        let private_pem = private_key.to_pkcs1_pem(LineEnding::LF).expect("private pem");
        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key");

        let server = MockServer::start_async().await;
        let jwks = json!({
            "keys": [{
                "kid": KID,
                "kty": "RSA",
                "use": "sig",
                "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be())
            }]
        });
        server
            .mock_async(|when, then| {
                when.method(GET).path("/.well-known/jwks.json");
                if status == 200 {
                    then.status(200).json_body(jwks);
                } else {
                    then.status(status).body("upstream unavailable");
                }
            })
            .await;

        let settings = AuthSettings::new()
            .with_issuer(format!("{}/", server.base_url()))
            .with_audience(AUDIENCE);
        let verifier = Arc::new(TokenVerifier::new(Arc::new(settings)));
        let router = router(AppState::new(verifier));

        Self {
            server,
            router,
            encoding,
        }
    }

    pub fn issuer(&self) -> String {
        format!("{}/", self.server.base_url())
    }

    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(KID.to_string());
        encode(&header, claims, &self.encoding).expect("sign token")
    }

    /// An access token with every standard claim in place.
    pub fn access_token(&self, permissions: Value) -> String {
        self.sign(&json!({
            "iss": self.issuer(),
            "aud": [AUDIENCE],
            "sub": "kp_admin",
            "exp": now() + 600,
            "permissions": permissions
        }))
    }

    /// A webhook event token: no iss or aud, as the provider sends them.
    pub fn event_token(&self, event_type: &str, user: Value) -> String {
        self.sign(&json!({
            "type": event_type,
            "data": {"user": user},
            "event_id": "evt_1"
        }))
    }

    pub async fn send(&self, request: Request<Body>) -> (u16, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response");
        read(response).await
    }
}

pub async fn read(response: Response<Body>) -> (u16, Value) {
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64
}
