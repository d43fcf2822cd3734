//! Pagination helper
//!
//! Translates raw page/limit query parameters into skip/limit values and
//! shapes the pagination envelope. Parameters arrive as raw strings so
//! that absent or non-numeric values fall back to defaults; out-of-range
//! numeric values are rejected before any data access.

use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Validated pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Parse raw query values.
    ///
    /// Absent or non-numeric values default to page 1, limit 10. After
    /// defaulting, page < 1 or limit outside 1..=100 is a client error.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppError> {
        let page = page
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT);

        if page < DEFAULT_PAGE || limit < 1 || limit > MAX_LIMIT {
            return Err(AppError::Validation(vec![format!(
                "Invalid pagination parameters. Page must be >= 1, limit between 1-{}",
                MAX_LIMIT
            )]));
        }

        Ok(Self { page, limit })
    }

    /// Records to skip before the requested page. Saturates so an
    /// astronomically large page yields an empty page, not a panic.
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Total page count for `total` records: ceil(total / limit).
    pub fn pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

/// Pagination envelope
///
/// Total and data always reflect the same filter predicate.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(pagination: Pagination, total: i64, data: Vec<T>) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            pages: pagination.pages(total),
            data,
        }
    }
}
