use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::claims::{unverified_claims, VerifiedPayload};
use crate::config::AuthSettings;
use crate::error::{AuthError, AuthResult};
use crate::issuer::{expected_issuer, resolve_issuer};
use crate::jwks::{jwks_url_for, JwksFetcher};

/// How much claim validation a caller is willing to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyMode {
    /// Issuer, expiry (when present) and audience are all enforced.
    #[default]
    Strict,
    /// Strict first; on a claim failure retry with signature-only checks and
    /// require the payload to look like a webhook event.
    SignatureOnlyFallback,
}

/// Result of the strict pass, before the mode decides what to do with it.
enum StrictOutcome {
    Verified(VerifiedPayload),
    ClaimsRejected(AuthError),
}

#[derive(Clone)]
pub struct TokenVerifier {
    settings: Arc<AuthSettings>,
    fetcher: JwksFetcher,
}

impl TokenVerifier {
    pub fn new(settings: Arc<AuthSettings>) -> Self {
        let fetcher = JwksFetcher::new(settings.jwks_timeout);
        Self { settings, fetcher }
    }

    /// Verify a compact token and return its claims.
    pub async fn verify(&self, token: &str, mode: VerifyMode) -> AuthResult<VerifiedPayload> {
        let header = decode_header(token).map_err(|err| {
            debug!(error = %err, "token header is not decodable");
            AuthError::Unparseable
        })?;
        let claims = unverified_claims(token);

        let (issuer, source) = resolve_issuer(&self.settings, &claims)?;
        let jwks_url = jwks_url_for(&issuer);
        let key_set = self.fetcher.fetch(&issuer).await.map_err(|err| {
            warn!(error = %err, jwks_url = %jwks_url, "JWKS fetch failed");
            AuthError::Unparseable
        })?;

        let kid = header.kid.as_deref().ok_or(AuthError::MalformedAuthorization)?;
        let jwk = key_set.find(kid).ok_or_else(|| {
            debug!(kid, jwks_url = %jwks_url, "no JWKS entry for kid");
            AuthError::NoMatchingKey
        })?;
        let key = jwk.decoding_key().map_err(|err| {
            warn!(error = %err, "JWKS entry is not a usable RSA key");
            AuthError::Unparseable
        })?;

        debug!(
            issuer = %issuer,
            issuer_source = ?source,
            jwks_url = %jwks_url,
            kid,
            aud = ?claims.get("aud"),
            iss = ?claims.get("iss"),
            exp = ?claims.get("exp"),
            "verifying token"
        );

        let strict = self.strict_validation(&issuer, &claims)?;
        match self.strict_pass(token, &key, &strict, mode)? {
            StrictOutcome::Verified(payload) => Ok(payload),
            StrictOutcome::ClaimsRejected(err) => match mode {
                VerifyMode::Strict => Err(err),
                VerifyMode::SignatureOnlyFallback => {
                    info!(
                        reason = %err,
                        "claim validation failed; attempting signature-only verification"
                    );
                    self.signature_only_pass(token, &key).map_err(|relaxed_err| {
                        warn!(error = %relaxed_err, "signature-only verification failed");
                        AuthError::InvalidClaims
                    })
                }
            },
        }
    }

    fn strict_validation(
        &self,
        issuer: &str,
        claims: &Map<String, Value>,
    ) -> AuthResult<Validation> {
        let mut validation = self.base_validation()?;
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = self.settings.leeway_seconds;
        validation.set_issuer(&[expected_issuer(issuer)]);
        validation.required_spec_claims.insert("iss".to_owned());

        if !claims.contains_key("exp") {
            validation.validate_exp = false;
            validation.required_spec_claims.remove("exp");
        }
        Ok(validation)
    }

    fn strict_pass(
        &self,
        token: &str,
        key: &DecodingKey,
        validation: &Validation,
        mode: VerifyMode,
    ) -> AuthResult<StrictOutcome> {
        let claims = match decode::<Map<String, Value>>(token, key, validation) {
            Ok(data) => data.claims,
            Err(err) => {
                return match err.kind() {
                    ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
                    ErrorKind::InvalidIssuer
                    | ErrorKind::InvalidAudience
                    | ErrorKind::InvalidSubject
                    | ErrorKind::ImmatureSignature
                    | ErrorKind::MissingRequiredClaim(_) => {
                        debug!(error = %err, "token claims rejected");
                        Ok(StrictOutcome::ClaimsRejected(AuthError::InvalidClaims))
                    }
                    _ => {
                        debug!(error = %err, "token failed verification");
                        Err(AuthError::Unparseable)
                    }
                };
            }
        };

        let payload = VerifiedPayload::new(claims);
        match self.check_audience(&payload) {
            Ok(()) => Ok(StrictOutcome::Verified(payload)),
            Err(err) if mode == VerifyMode::SignatureOnlyFallback => {
                Ok(StrictOutcome::ClaimsRejected(err))
            }
            Err(err) => Err(err),
        }
    }

    fn signature_only_pass(&self, token: &str, key: &DecodingKey) -> AuthResult<VerifiedPayload> {
        let mut relaxed = self.base_validation()?;
        relaxed.validate_aud = false;
        relaxed.validate_exp = false;
        relaxed.validate_nbf = false;
        relaxed.required_spec_claims.clear();

        let data = decode::<Map<String, Value>>(token, key, &relaxed).map_err(|err| {
            debug!(error = %err, "signature-only decode failed");
            AuthError::InvalidClaims
        })?;

        let payload = VerifiedPayload::new(data.claims);
        if !payload.has_event_shape() {
            return Err(AuthError::InvalidPayload);
        }
        Ok(payload)
    }

    fn check_audience(&self, payload: &VerifiedPayload) -> AuthResult<()> {
        let Some(expected) = self.settings.audience.as_deref() else {
            return Ok(());
        };

        match payload.audience() {
            Some(Value::Array(items)) => {
                if items.iter().any(|item| item.as_str() == Some(expected)) {
                    Ok(())
                } else {
                    Err(AuthError::AudienceNotPresent)
                }
            }
            Some(Value::String(aud)) if aud == expected => Ok(()),
            _ => Err(AuthError::IncorrectAudience),
        }
    }

    /// Key-set entries are RSA only, and a validation listing algorithms of
    /// another family fails every decode, so only RSA algorithms are kept.
    fn base_validation(&self) -> AuthResult<Validation> {
        let algorithms: Vec<Algorithm> = self
            .settings
            .algorithms
            .iter()
            .copied()
            .filter(|algorithm| is_rsa(*algorithm))
            .collect();
        let Some(first) = algorithms.first().copied() else {
            warn!(algorithms = ?self.settings.algorithms, "no RSA algorithm configured");
            return Err(AuthError::Unparseable);
        };
        let mut validation = Validation::new(first);
        validation.algorithms = algorithms;
        Ok(validation)
    }
}

fn is_rsa(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}
