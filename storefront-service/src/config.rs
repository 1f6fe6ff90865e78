use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use common_auth::{parse_algorithms, AuthSettings};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub auth: AuthSettings,
    pub listen_addr: SocketAddr,
}

impl ServiceConfig {
    /// Read once at start-up; the result is never mutated afterwards.
    pub fn from_env() -> Result<Self> {
        let algorithms = parse_algorithms(
            &env::var("KINDE_ALGORITHMS").unwrap_or_else(|_| "RS256".to_string()),
        )
        .context("KINDE_ALGORITHMS must be a comma separated list of JWT algorithms")?;
        let jwks_timeout_secs = env::var("KINDE_JWKS_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(5);
        let leeway_seconds = env::var("KINDE_LEEWAY_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);

        let mut auth = AuthSettings::new()
            .with_algorithms(algorithms)
            .with_jwks_timeout(Duration::from_secs(jwks_timeout_secs.max(1)))
            .with_leeway(leeway_seconds);
        if let Ok(domain) = env::var("KINDE_DOMAIN") {
            auth = auth.with_domain(domain);
        }
        if let Ok(audience) = env::var("KINDE_AUDIENCE") {
            auth = auth.with_audience(audience);
        }
        if let Ok(issuer) = env::var("KINDE_ISSUER") {
            auth = auth.with_issuer(issuer);
        }
        if let Ok(url) = env::var("KINDE_JWKS_URL") {
            auth = auth.with_jwks_url(url);
        }

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let ip: IpAddr = host.parse().with_context(|| format!("HOST '{host}' is not an IP address"))?;

        Ok(Self {
            auth,
            listen_addr: SocketAddr::from((ip, port)),
        })
    }
}
