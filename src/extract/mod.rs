//! Request decoding: path, query and body into typed commands.

mod page;
mod params;
mod payload;
mod tag;

pub use page::PageRequest;
pub use params::{parse_date, PathParams, QueryParams};
pub use payload::{required_text, Payload};
pub use tag::{parse_tag, Tag};

use axum::http::Method;

/// Resolve a field that may arrive in both the query string and the body.
/// Mutating verbs prefer the body; reads prefer the query.
pub fn prefer<T>(method: &Method, query: Option<T>, body: Option<T>) -> Option<T> {
    if *method == Method::POST || *method == Method::PUT || *method == Method::PATCH {
        body.or(query)
    } else {
        query.or(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_wins_on_post_and_put() {
        assert_eq!(prefer(&Method::POST, Some("q"), Some("b")), Some("b"));
        assert_eq!(prefer(&Method::PUT, Some("q"), Some("b")), Some("b"));
        assert_eq!(prefer(&Method::POST, Some("q"), None), Some("q"));
    }

    #[test]
    fn query_wins_on_get() {
        assert_eq!(prefer(&Method::GET, Some("q"), Some("b")), Some("q"));
        assert_eq!(prefer(&Method::GET, None, Some("b")), Some("b"));
        assert_eq!(prefer::<&str>(&Method::GET, None, None), None);
    }
}
