use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::claims::VerifiedPayload;
use crate::extractors::bearer_token;
use crate::verifier::{TokenVerifier, VerifyMode};

/// Outcome of the protected-route guard. Deliberately carries no detail:
/// clients only ever see a bare status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    Unauthorized,
    Forbidden,
}

impl GuardError {
    pub fn status(self) -> StatusCode {
        match self {
            GuardError::Unauthorized => StatusCode::UNAUTHORIZED,
            GuardError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// Require `permission` to be present in the payload's `permissions` claim.
///
/// An empty permission means any verified token is enough.
pub fn check_permissions(
    permission: &str,
    payload: Option<&VerifiedPayload>,
) -> Result<(), GuardError> {
    let payload = payload.ok_or(GuardError::Unauthorized)?;
    if permission.is_empty() {
        return Ok(());
    }

    if payload.permissions().contains(permission) {
        Ok(())
    } else {
        debug!(permission, sub = ?payload.subject(), "permission_check_failed");
        Err(GuardError::Forbidden)
    }
}

/// Bearer extraction, strict verification and a permission check, bundled
/// for one route (or group of routes).
#[derive(Clone)]
pub struct AuthGuard {
    verifier: Arc<TokenVerifier>,
    permission: Arc<str>,
}

impl AuthGuard {
    pub fn new(verifier: Arc<TokenVerifier>, permission: impl Into<String>) -> Self {
        Self {
            verifier,
            permission: Arc::from(permission.into()),
        }
    }

    /// Guard that only requires a valid token.
    pub fn authenticated(verifier: Arc<TokenVerifier>) -> Self {
        Self::new(verifier, "")
    }

    pub async fn authorize(&self, headers: &HeaderMap) -> Result<VerifiedPayload, GuardError> {
        let token = bearer_token(headers)?;
        let payload = self
            .verifier
            .verify(token, VerifyMode::Strict)
            .await
            .map_err(|err| {
                debug!(code = err.code(), status = %err.status(), "token rejected by guard");
                GuardError::Unauthorized
            })?;
        check_permissions(&self.permission, Some(&payload))?;
        Ok(payload)
    }
}

/// Middleware for `axum::middleware::from_fn_with_state(guard, require_auth)`.
///
/// On success the verified payload is stored in the request extensions, where
/// the [`VerifiedPayload`] extractor picks it up.
pub async fn require_auth(State(guard): State<AuthGuard>, mut request: Request, next: Next) -> Response {
    match guard.authorize(request.headers()).await {
        Ok(payload) => {
            request.extensions_mut().insert(payload);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
