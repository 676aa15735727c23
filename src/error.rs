// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::ServiceError;

/// HTTP API error with the status code and client-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    Internal(String),

    // 503 Service Unavailable
    Unavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg)
            | ApiError::Unavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// The canonical 401 used whenever a user identity is required but absent.
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("unauthorized".to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ApiError::Unavailable(message.into())
    }

    /// Missing tenant on any tenant-scoped route.
    pub fn missing_tenant() -> Self {
        ApiError::BadRequest("tenant id not found".to_string())
    }

    /// Classify a Service failure. `failure` is the generic phrase shown to
    /// clients when the cause is internal, e.g. "failed to generate report".
    pub fn from_service(err: ServiceError, operation: &str, failure: &str) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Invalid(msg) => ApiError::BadRequest(msg),
            ServiceError::Unavailable(msg) => {
                tracing::warn!(operation, cause = %msg, "downstream unavailable");
                ApiError::Unavailable(format!("{failure}: service unavailable"))
            }
            ServiceError::Cancelled => {
                tracing::debug!(operation, "request scope cancelled");
                ApiError::Unavailable("request cancelled".to_string())
            }
            ServiceError::Internal(cause) => {
                // Don't expose internal causes to clients
                tracing::error!(operation, error = %cause, "service failure");
                ApiError::Internal(failure.to_string())
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::internal("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::unavailable("x").status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn body_is_single_error_field() {
        assert_eq!(ApiError::missing_tenant().to_json(), json!({"error": "tenant id not found"}));
        assert_eq!(ApiError::unauthorized().to_json(), json!({"error": "unauthorized"}));
    }

    #[test]
    fn internal_service_errors_are_masked() {
        let err = ApiError::from_service(
            ServiceError::Internal("connection reset by peer".into()),
            "analytics.report",
            "failed to generate report",
        );
        assert_eq!(err, ApiError::Internal("failed to generate report".into()));
    }

    #[test]
    fn domain_service_errors_keep_their_message() {
        let err = ApiError::from_service(ServiceError::Conflict("call already ended".into()), "calls.end", "failed to end call");
        assert_eq!(err, ApiError::Conflict("call already ended".into()));

        let err = ApiError::from_service(ServiceError::Invalid("unknown report type".into()), "analytics.report", "failed");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unavailable_hides_cause() {
        let err = ApiError::from_service(ServiceError::Unavailable("openai timeout".into()), "ai.query", "failed to process query");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message().contains("openai"));
    }
}
