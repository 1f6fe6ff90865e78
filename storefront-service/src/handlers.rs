use axum::extract::State;
use axum::Json;
use common_auth::{VerifiedPayload, VerifyMode};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api_error::{ApiError, ApiResult};
use crate::app::AppState;
use crate::users::DirectoryError;
use crate::webhook::WebhookEvent;

pub async fn health() -> &'static str {
    "ok"
}

/// Identity-provider webhook. The raw body is the signed event token.
pub async fn register(State(state): State<AppState>, body: String) -> ApiResult<Json<Value>> {
    let payload = state
        .verifier
        .verify(body.trim(), VerifyMode::SignatureOnlyFallback)
        .await?;

    match WebhookEvent::from_claims(payload.as_map())? {
        WebhookEvent::UserCreated(user) => match state.users.create(&user).await {
            Ok(record) => {
                info!(user_id = record.id, kinde_id = ?record.kinde_id, "user provisioned from webhook");
                Ok(Json(json!({
                    "success": true,
                    "user": {"id": record.id, "username": record.username, "email": record.email}
                })))
            }
            Err(DirectoryError::MissingEmail) => Err(ApiError::BadRequest("User email missing")),
            Err(DirectoryError::AlreadyExists) => Err(ApiError::Conflict("User already exists")),
        },
        WebhookEvent::UserDeleted(user) => {
            let email = user
                .email
                .ok_or(ApiError::BadRequest("User email missing for delete"))?;
            match state.users.remove_by_email(&email).await {
                Some(record) => {
                    info!(user_id = record.id, "user removed by webhook");
                    Ok(Json(json!({"success": true, "deleted_email": email})))
                }
                None => {
                    warn!(kinde_id = ?user.id, "delete webhook for unknown user");
                    Err(ApiError::NotFound("User not found"))
                }
            }
        }
    }
}

pub async fn list_users(_payload: VerifiedPayload, State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "users": state.users.list().await }))
}

pub async fn me(payload: VerifiedPayload) -> Json<Value> {
    Json(json!({
        "sub": payload.subject(),
        "permissions": payload.permissions(),
    }))
}
