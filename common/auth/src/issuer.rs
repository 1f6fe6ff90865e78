use serde_json::{Map, Value};
use tracing::warn;

use crate::config::{AuthSettings, JWKS_SUFFIX};
use crate::error::{AuthError, AuthResult};

/// Where the trusted issuer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuerSource {
    Domain,
    TokenClaim,
    IssuerOverride,
    JwksUrlOverride,
}

/// Derive the issuer base URL the token will be checked against.
///
/// First match wins: configured domain, the token's own `iss`, the issuer
/// override, then the JWKS URL override with the well-known suffix stripped.
/// A configured domain must beat the self-declared `iss`, otherwise a token
/// could point verification at an attacker-controlled key set.
pub fn resolve_issuer(
    settings: &AuthSettings,
    claims: &Map<String, Value>,
) -> AuthResult<(String, IssuerSource)> {
    if let Some(domain) = settings.domain.as_deref() {
        return Ok((format!("https://{domain}"), IssuerSource::Domain));
    }

    if let Some(iss) = claims.get("iss").and_then(Value::as_str).filter(|iss| !iss.is_empty()) {
        return Ok((iss.to_owned(), IssuerSource::TokenClaim));
    }

    if let Some(issuer) = settings.issuer.as_deref() {
        return Ok((issuer.to_owned(), IssuerSource::IssuerOverride));
    }

    if let Some(url) = settings.jwks_url.as_deref() {
        let issuer = url.strip_suffix(JWKS_SUFFIX).unwrap_or(url);
        return Ok((issuer.to_owned(), IssuerSource::JwksUrlOverride));
    }

    warn!(
        claims = ?claims,
        "No issuer found (domain, issuer override, JWKS URL override or token iss)"
    );
    Err(AuthError::InvalidIssuer)
}

/// The exact `iss` value a token must carry: the issuer with one trailing slash.
pub(crate) fn expected_issuer(issuer: &str) -> String {
    format!("{}/", issuer.trim_end_matches('/'))
}
