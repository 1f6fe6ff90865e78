use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Well-known path every issuer publishes its signing keys under.
pub const JWKS_SUFFIX: &str = "/.well-known/jwks.json";

/// Runtime configuration for verifying externally issued tokens.
///
/// Built once at start-up and shared behind an `Arc`; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Tenant domain (e.g. `workspace.kinde.com`). Takes precedence over every other issuer source.
    pub domain: Option<String>,
    /// Explicit issuer override.
    pub issuer: Option<String>,
    /// Explicit JWKS URL override; only used to derive the issuer.
    pub jwks_url: Option<String>,
    /// Expected audience. `None` disables the audience check.
    pub audience: Option<String>,
    /// Accepted signing algorithms, in configured order.
    pub algorithms: Vec<Algorithm>,
    /// Upper bound for a single JWKS request.
    pub jwks_timeout: Duration,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            domain: None,
            issuer: None,
            jwks_url: None,
            audience: None,
            algorithms: vec![Algorithm::RS256],
            jwks_timeout: Duration::from_secs(5),
            leeway_seconds: 0,
        }
    }
}

impl AuthSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = non_empty(domain.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = non_empty(issuer.into());
        self
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = non_empty(url.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = non_empty(audience.into());
        self
    }

    /// Replace the accepted algorithms. An empty list keeps the RS256 default.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        if !algorithms.is_empty() {
            self.algorithms = algorithms;
        }
        self
    }

    pub fn with_jwks_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_timeout = timeout;
        self
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

/// Parse a comma separated algorithm list such as `"RS256, RS512"`.
///
/// Blank entries are skipped; an entirely blank list yields `[RS256]`.
pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, jsonwebtoken::errors::Error> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let algorithm = name.parse::<Algorithm>()?;
        if !algorithms.contains(&algorithm) {
            algorithms.push(algorithm);
        }
    }

    if algorithms.is_empty() {
        algorithms.push(Algorithm::RS256);
    }
    Ok(algorithms)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
