use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::routing::{get, post};
use axum::{middleware, Router};
use common_auth::{require_auth, AuthGuard, TokenVerifier};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers::{health, list_users, me, register};
use crate::users::UserDirectory;

pub const READ_USERS: &str = "read:users";

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub users: Arc<UserDirectory>,
}

impl AppState {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            verifier,
            users: Arc::new(UserDirectory::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let users = Router::new()
        .route("/users", get(list_users))
        .route_layer(middleware::from_fn_with_state(
            AuthGuard::new(state.verifier.clone(), READ_USERS),
            require_auth,
        ));
    let profile = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            AuthGuard::authenticated(state.verifier.clone()),
            require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/healthz", get(health))
        .route("/register", post(register))
        .merge(users)
        .merge(profile)
        .with_state(state)
        .layer(cors)
}
