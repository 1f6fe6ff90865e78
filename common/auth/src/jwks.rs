use std::time::Duration;

use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::JWKS_SUFFIX;

/// Failures while retrieving a key set. Converted to an [`crate::AuthError`]
/// by the verifier; never shown to clients.
#[derive(Debug, Error)]
pub enum JwksError {
    #[error("failed to fetch JWKS from {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to parse JWKS response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("JWKS key '{kid}' uses unsupported key type '{kty}'")]
    UnsupportedKey { kid: String, kty: String },
    #[error("JWKS key '{0}' missing required RSA components")]
    MissingComponents(String),
    #[error("failed to parse decoding key for kid '{0}': {1}")]
    KeyParse(String, String),
}

/// `{issuer}/.well-known/jwks.json`, with any trailing slash on the issuer trimmed.
pub fn jwks_url_for(issuer: &str) -> String {
    format!("{}{JWKS_SUFFIX}", issuer.trim_end_matches('/'))
}

/// Fetches the key set of an issuer. Every call goes to the network; nothing is cached.
#[derive(Clone)]
pub struct JwksFetcher {
    client: Client,
    timeout: Duration,
}

impl JwksFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    pub async fn fetch(&self, issuer: &str) -> Result<JwkSet, JwksError> {
        let url = jwks_url_for(issuer);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| JwksError::Fetch {
                url: url.clone(),
                reason: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(JwksError::Fetch {
                reason: format!("HTTP {}", response.status()),
                url,
            });
        }

        response.json::<JwkSet>().await.map_err(|err| JwksError::Decode {
            url,
            reason: err.to_string(),
        })
    }
}

/// Parsed `{"keys": [...]}` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Entry whose `kid` matches. Duplicate kids are not expected; the last one listed wins.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .rev()
            .find(|key| key.kid.as_deref() == Some(kid))
    }
}

/// One key record. Fields are optional so that a single unusable entry does
/// not invalidate the whole set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Jwk {
    pub kid: Option<String>,
    pub kty: Option<String>,
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    pub alg: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

impl Jwk {
    pub fn decoding_key(&self) -> Result<DecodingKey, JwksError> {
        let kid = self.kid.clone().unwrap_or_default();
        let kty = self.kty.as_deref().unwrap_or("RSA");
        if kty != "RSA" {
            return Err(JwksError::UnsupportedKey {
                kid,
                kty: kty.to_owned(),
            });
        }

        let (Some(modulus), Some(exponent)) = (self.n.as_deref(), self.e.as_deref()) else {
            return Err(JwksError::MissingComponents(kid));
        };

        DecodingKey::from_rsa_components(modulus, exponent)
            .map_err(|err| JwksError::KeyParse(kid, err.to_string()))
    }
}
