use serde::Serialize;

use crate::error::ApiError;

/// Offset/limit window applied uniformly to list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Build from raw query values. Out-of-range limits are clamped, a
    /// negative offset is rejected.
    pub fn from_query(offset: Option<&str>, limit: Option<&str>) -> Result<Self, ApiError> {
        let limit = match limit {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::bad_request("Invalid limit"))?,
            None => Self::DEFAULT_LIMIT,
        };

        let offset = match offset {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::bad_request("Invalid offset"))?,
            None => 0,
        };
        if offset < 0 {
            return Err(ApiError::bad_request("offset must not be negative"));
        }

        Ok(Self {
            offset,
            limit: Self::clamp_limit(limit),
        })
    }

    pub fn clamp_limit(limit: i64) -> i64 {
        if limit <= 0 {
            Self::DEFAULT_LIMIT
        } else {
            limit.min(Self::MAX_LIMIT)
        }
    }

    /// 1-based page number reported in paged envelopes.
    pub fn page_number(&self) -> i64 {
        self.offset / self.limit + 1
    }

    /// Apply the window to an already-materialized list.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}
