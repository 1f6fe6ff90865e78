pub mod api_error;
pub mod app;
pub mod config;
pub mod handlers;
pub mod users;
pub mod webhook;

pub use api_error::{ApiError, ApiResult};
pub use app::{router, AppState, READ_USERS};
pub use config::ServiceConfig;
