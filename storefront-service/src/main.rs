use std::sync::Arc;

use common_auth::TokenVerifier;
use storefront_service::{router, AppState, ServiceConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env()?;
    info!(
        domain = ?config.auth.domain,
        issuer = ?config.auth.issuer,
        jwks_url = ?config.auth.jwks_url,
        audience = ?config.auth.audience,
        algorithms = ?config.auth.algorithms,
        "token verification configured"
    );

    let verifier = Arc::new(TokenVerifier::new(Arc::new(config.auth)));
    let app = router(AppState::new(verifier));

    info!(addr = %config.listen_addr, "starting storefront-service");
    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
