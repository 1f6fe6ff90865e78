use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Every way token verification can fail. Each variant resolves to a fixed
/// `(code, status)` pair; library errors never escape unconverted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Issuer not found")]
    InvalidIssuer,
    #[error("Authorization malformed.")]
    MalformedAuthorization,
    #[error("Unable to find the appropriate key.")]
    NoMatchingKey,
    #[error("Unable to parse authentication token.")]
    Unparseable,
    #[error("The required audience is not present in the token.")]
    AudienceNotPresent,
    #[error("Incorrect audience. Please, check the audience.")]
    IncorrectAudience,
    #[error("Token expired.")]
    TokenExpired,
    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,
    #[error("Required event payload missing")]
    InvalidPayload,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::MalformedAuthorization
            | AuthError::NoMatchingKey
            | AuthError::Unparseable => "invalid_header",
            AuthError::AudienceNotPresent | AuthError::IncorrectAudience => "invalid_audience",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::InvalidPayload => "invalid_payload",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NoMatchingKey | AuthError::Unparseable => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    description: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            description: self.description(),
        };
        (self.status(), Json(body)).into_response()
    }
}
