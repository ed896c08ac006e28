//! # Paging
//!
//! Page/limit normalization, sort direction and the list envelope.
//!
//! ```text
//! ?page=2&limit=10          → PageRequest { page: 2, limit: 10 }  offset 10
//! ?page=0&limit=-4          → PageRequest { page: 1, limit: <default> }
//! (nothing)                 → PageRequest { page: 1, limit: <default> }
//!
//! Response: { "items": [...], "total": 25, "page": 2, "limit": 10 }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::numeric::to_number;

/// Query-string parameters shared by every list endpoint.
///
/// Kept as raw strings so resource filter structs can `#[serde(flatten)]`
/// this in; numbers are read through [`to_number`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListParams {
    /// Page/limit only, for callers outside HTTP.
    pub fn paged(page: i64, limit: i64) -> Self {
        ListParams {
            page: Some(page.to_string()),
            limit: Some(limit.to_string()),
            ..ListParams::default()
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(order.as_sql().to_ascii_lowercase());
        self
    }

    pub fn page_request(&self, default_limit: u32) -> PageRequest {
        let read = |raw: &Option<String>| raw.as_ref().map(|s| to_number(s).trunc() as i64);
        PageRequest::normalize(read(&self.page), read(&self.limit), default_limit)
    }

    /// Trimmed search term, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        SortOrder::parse(self.sort_order.as_deref())
    }
}

/// Reads a truthy query flag (`true`, `1`, `yes`).
pub fn is_truthy(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes")
    )
}

/// Reads a two-sided query flag: absent or blank is `None`, otherwise
/// whether it is truthy.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| is_truthy(Some(s)))
}

/// A normalized page request: `page >= 1`, `limit >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Falls back to page 1 and `default_limit` when a value is missing or
    /// not positive.
    ///
    /// ```rust
    /// use zarmind_core::PageRequest;
    ///
    /// assert_eq!(PageRequest::normalize(Some(2), Some(10), 20), PageRequest { page: 2, limit: 10 });
    /// assert_eq!(PageRequest::normalize(Some(0), Some(-1), 20), PageRequest { page: 1, limit: 20 });
    /// assert_eq!(PageRequest::normalize(None, None, 50), PageRequest { page: 1, limit: 50 });
    /// ```
    pub fn normalize(page: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        let default_limit = default_limit.max(1);
        let positive = |v: Option<i64>| v.filter(|n| *n > 0).map(|n| n.min(u32::MAX as i64) as u32);
        PageRequest {
            page: positive(page).unwrap_or(1),
            limit: positive(limit).unwrap_or(default_limit),
        }
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// Sort direction, `asc` or `desc` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive parse; anything else is `None` so the resource
    /// default applies.
    pub fn parse(raw: Option<&str>) -> Option<SortOrder> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => Some(SortOrder::Asc),
            Some("desc") => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One page of a filtered list plus the total matching the same filter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        PagedResult {
            items,
            total,
            page: request.page,
            limit: request.limit,
        }
    }

    /// Converts every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}
