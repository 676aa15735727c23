use axum::{
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;
use crate::extract::PageRequest;
use crate::services::ReportFormat;

/// Marks endpoints that keep their documented shape but have no backing
/// implementation yet.
pub const UNIMPLEMENTED_HEADER: HeaderName = HeaderName::from_static("x-unimplemented");

/// Successful JSON response. The payload is rendered at the top level, with
/// no envelope.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: StatusCode,
    pub unimplemented: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn ok(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            status_code,
            unimplemented: false,
        }
    }

    /// Flag the response with `X-Unimplemented: true`.
    pub fn placeholder(mut self) -> Self {
        self.unimplemented = true;
        self
    }
}

impl ApiResponse<()> {
    /// 204 No Content; the body is always empty.
    pub fn no_content() -> Self {
        Self::with_status((), StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut response = if self.status_code == StatusCode::NO_CONTENT {
            self.status_code.into_response()
        } else {
            match serde_json::to_value(&self.data) {
                Ok(value) => (self.status_code, Json(value)).into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize response payload");
                    return ApiError::internal("failed to encode response").into_response();
                }
            }
        };

        if self.unimplemented {
            response
                .headers_mut()
                .insert(UNIMPLEMENTED_HEADER, HeaderValue::from_static("true"));
        }
        response
    }
}

/// Paged list envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            data,
            total,
            page: request.page_number(),
            limit: request.limit,
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }
}

/// Exported report streamed as a file download.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub format: ReportFormat,
}

impl Attachment {
    pub fn new(bytes: Vec<u8>, format: ReportFormat) -> Self {
        Self { bytes, format }
    }

    pub fn filename(&self) -> String {
        format!("report.{}", self.format.extension())
    }
}

impl IntoResponse for Attachment {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename={}", self.filename());
        let disposition = match HeaderValue::from_str(&disposition) {
            Ok(value) => value,
            Err(_) => return ApiError::internal("failed to encode response").into_response(),
        };

        (
            StatusCode::OK,
            [
                (CONTENT_TYPE, HeaderValue::from_static(self.format.content_type())),
                (CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_is_bare_json() {
        let response = ApiResponse::ok(json!({"status": "ok"})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert!(response.headers().get(UNIMPLEMENTED_HEADER).is_none());
    }

    #[test]
    fn created_and_no_content() {
        assert_eq!(ApiResponse::created(json!({})).into_response().status(), StatusCode::CREATED);
        let response = ApiResponse::no_content().into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn placeholder_is_flagged() {
        let response = ApiResponse::ok(json!({"message": "Site created"})).placeholder().into_response();
        assert_eq!(response.headers()[UNIMPLEMENTED_HEADER], "true");
    }

    #[test]
    fn page_numbering() {
        let page: Page<i32> = Page::new(vec![1, 2], 42, &PageRequest { offset: 20, limit: 20 });
        assert_eq!(page.page, 2);
        assert_eq!(
            serde_json::to_value(Page::<i32>::empty(&PageRequest::default())).unwrap(),
            json!({"data": [], "total": 0, "page": 1, "limit": 10})
        );
    }

    #[test]
    fn attachment_headers() {
        let response = Attachment::new(b"a,b\n1,2\n".to_vec(), ReportFormat::Csv).into_response();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/csv");
        assert_eq!(response.headers()[CONTENT_DISPOSITION], "attachment; filename=report.csv");
    }
}
