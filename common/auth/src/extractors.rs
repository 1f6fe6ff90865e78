use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};

use crate::claims::VerifiedPayload;
use crate::guards::GuardError;

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GuardError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(GuardError::Unauthorized)?
        .to_str()
        .map_err(|_| GuardError::Unauthorized)?;
    parse_bearer(value)
}

/// Exactly two whitespace separated parts, scheme compared case-insensitively.
pub fn parse_bearer(raw: &str) -> Result<&str, GuardError> {
    let mut parts = raw.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GuardError::Unauthorized);
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GuardError::Unauthorized);
    }
    Ok(token)
}

/// Handlers behind [`crate::guards::require_auth`] take the verified claims as an argument.
#[async_trait]
impl<S> FromRequestParts<S> for VerifiedPayload
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedPayload>()
            .cloned()
            .ok_or(GuardError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parse_bearer_accepts_valid_token() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
    }

    #[test]
    fn parse_bearer_scheme_is_case_insensitive() {
        assert_eq!(parse_bearer("bEaReR abc.def.ghi"), Ok("abc.def.ghi"));
    }

    #[test]
    fn parse_bearer_rejects_wrong_scheme() {
        assert_eq!(parse_bearer("Basic abc"), Err(GuardError::Unauthorized));
    }

    #[test]
    fn parse_bearer_rejects_wrong_part_count() {
        assert_eq!(parse_bearer("Bearer abc def"), Err(GuardError::Unauthorized));
        assert_eq!(parse_bearer("Bearer"), Err(GuardError::Unauthorized));
        assert_eq!(parse_bearer("   "), Err(GuardError::Unauthorized));
    }

    #[test]
    fn bearer_token_requires_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(GuardError::Unauthorized));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));
    }
}
