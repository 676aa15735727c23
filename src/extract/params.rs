use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use chrono::NaiveDate;

use super::PageRequest;
use crate::error::ApiError;

/// Route variables, e.g. `{id}` or `{category}`, decoded on demand.
#[derive(Debug, Clone, Default)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    /// Integer variable; a missing or non-numeric value yields `Invalid <label>`.
    pub fn int(&self, name: &str, label: &str) -> Result<i64, ApiError> {
        self.0
            .get(name)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {label}")))
    }

    pub fn text(&self, name: &str) -> Result<&str, ApiError> {
        self.0
            .get(name)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {name}")))
    }
}

impl From<HashMap<String, String>> for PathParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PathParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(map) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("invalid path parameters"))?;
        Ok(Self(map))
    }
}

/// Query string with typed accessors. Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn required(&self, name: &str, message: &str) -> Result<&str, ApiError> {
        self.get(name).ok_or_else(|| ApiError::bad_request(message))
    }

    pub fn page(&self) -> Result<PageRequest, ApiError> {
        PageRequest::from_query(self.get("offset"), self.get("limit"))
    }

    /// Required `YYYY-MM-DD` date. A missing value is reported the same
    /// way as a malformed one.
    pub fn date(&self, name: &str) -> Result<NaiveDate, ApiError> {
        parse_date(name, self.get(name).unwrap_or_default())
    }
}

impl From<HashMap<String, String>> for QueryParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(map) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("invalid query string"))?;
        Ok(Self(map))
    }
}

/// Strict ISO calendar date. Anything other than a zero-padded
/// `YYYY-MM-DD` is rejected with `invalid <field> format`.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    let invalid = || ApiError::bad_request(format!("invalid {field} format"));

    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(invalid());
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn strict_dates() {
        assert_eq!(
            parse_date("start_date", "2024-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        for bad in ["2024-1-31", "2024/01/31", "20240131", "2024-02-30", "2024-01-31T00:00:00Z", ""] {
            let err = parse_date("start_date", bad).unwrap_err();
            assert_eq!(err.message(), "invalid start_date format", "input {bad:?}");
        }
    }

    #[test]
    fn int_path_params() {
        let params = PathParams::from(HashMap::from([("id".to_string(), "12".to_string())]));
        assert_eq!(params.int("id", "lead ID").unwrap(), 12);

        let params = PathParams::from(HashMap::from([("id".to_string(), "abc".to_string())]));
        assert_eq!(params.int("id", "lead ID").unwrap_err().message(), "Invalid lead ID");
    }

    #[test]
    fn empty_query_values_are_absent() {
        let q = query(&[("metric", ""), ("limit", "5")]);
        assert_eq!(q.get("metric"), None);
        assert_eq!(q.required("metric", "metric parameter required").unwrap_err().message(), "metric parameter required");
        assert_eq!(q.page().unwrap().limit, 5);
    }

    #[test]
    fn query_dates_are_required() {
        assert_eq!(
            query(&[("end_date", "2024-01-31")]).date("end_date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert_eq!(query(&[]).date("end_date").unwrap_err().message(), "invalid end_date format");
        assert_eq!(query(&[("end_date", " ")]).date("end_date").unwrap_err().message(), "invalid end_date format");
        assert!(query(&[("end_date", "01-31-2024")]).date("end_date").is_err());
    }
}
