use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body decoded into a per-operation command record.
///
/// Unlike `axum::Json` every rejection is rendered in the uniform error
/// envelope, and a missing body is a distinct failure. Unknown fields are
/// ignored.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::bad_request("request body too large")
            } else {
                ApiError::bad_request("invalid request body")
            }
        })?;

        decode(&bytes).map(Payload)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("request body is required"));
    }

    serde_json::from_slice(bytes).map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        ApiError::bad_request("invalid request body")
    })
}

/// Non-empty text field, trimmed. Empty yields `<field> is required`.
pub fn required_text<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Command {
        query: String,
        #[serde(default)]
        priority: Option<String>,
    }

    #[test]
    fn empty_body_is_required() {
        let err = decode::<Command>(b"").unwrap_err();
        assert_eq!(err.message(), "request body is required");
        let err = decode::<Command>(b"  \n").unwrap_err();
        assert_eq!(err.message(), "request body is required");
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = decode::<Command>(b"{\"query\":").unwrap_err();
        assert_eq!(err.message(), "invalid request body");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cmd: Command = decode(br#"{"query":"hi","surprise":true}"#).unwrap();
        assert_eq!(cmd.query, "hi");
        assert!(cmd.priority.is_none());
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("query", Some(" hi ")).unwrap(), "hi");
        assert_eq!(required_text("query", Some("  ")).unwrap_err().message(), "query is required");
        assert_eq!(required_text("query", None).unwrap_err().message(), "query is required");
    }
}
