use serde_json::{Map, Value};

use crate::api_error::{ApiError, ApiResult};

pub const USER_CREATED: &str = "user.created";
pub const USER_DELETED: &str = "user.deleted";

/// `data.user` of an identity-provider event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookUser {
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl WebhookUser {
    fn from_object(user: &Map<String, Value>) -> Self {
        Self {
            id: text(user, "id"),
            email: text(user, "email"),
            first_name: text(user, "first_name"),
            last_name: text(user, "last_name"),
            username: text(user, "username"),
        }
    }
}

/// The events the register endpoint acts on. Updates are never applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    UserCreated(WebhookUser),
    UserDeleted(WebhookUser),
}

impl WebhookEvent {
    pub fn from_claims(claims: &Map<String, Value>) -> ApiResult<Self> {
        let user = claims
            .get("data")
            .and_then(Value::as_object)
            .and_then(|data| data.get("user"))
            .and_then(Value::as_object)
            .filter(|user| !user.is_empty())
            .map(WebhookUser::from_object);

        match (claims.get("type").and_then(Value::as_str), user) {
            (Some(USER_CREATED), Some(user)) => Ok(Self::UserCreated(user)),
            (Some(USER_DELETED), Some(user)) => Ok(Self::UserDeleted(user)),
            _ => Err(ApiError::BadRequest("Unsupported event or missing user")),
        }
    }
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}
