pub mod auth;
pub mod identity;
pub mod response;
pub mod tenant;

pub use auth::{authenticate, AuthUser};
pub use identity::{tenant_of, user_of, HeaderIdentity, RequestIdentity, UserIdentity};
pub use response::{ApiResponse, ApiResult, Attachment, Page};
pub use tenant::resolve_tenant;

use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Panic recovery hook for `CatchPanicLayer`: log and render the uniform
/// 500 envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "handler panicked");
    ApiError::internal("internal server error").into_response()
}
