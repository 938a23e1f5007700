//! Offset pagination
//!
//! Pages are 1-based. A list operation normalizes the requested page, counts
//! the matching rows, builds a [`PaginationMeta`] and calls
//! [`PaginationMeta::ensure_in_bounds`] before fetching any data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when the caller does not send one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the page size a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Requested page past the last page
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("page {requested} is beyond the last page {total_page}")]
pub struct PageOutOfBounds {
    pub requested: u32,
    pub total_page: u32,
}

/// A normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Normalize raw query values
    ///
    /// Missing or zero page becomes 1. Missing limit becomes `default_limit`;
    /// any limit is clamped into `1..=max_limit`.
    pub fn normalize(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
        max_limit: u32,
    ) -> Self {
        let max_limit = max_limit.max(1);
        let page = page.filter(|p| *p >= 1).unwrap_or(1).min(u32::MAX as i64) as u32;
        let limit = match limit {
            Some(l) if l >= 1 => l.min(max_limit as i64) as u32,
            Some(_) => 1,
            None => default_limit.clamp(1, max_limit),
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination descriptor returned alongside list data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_page: u32,
    pub current_page: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub total_data: u64,
}

impl PaginationMeta {
    /// Build the descriptor for `current_page` of `total_data` rows
    ///
    /// There is always at least one page, even when nothing matched.
    pub fn new(current_page: u32, limit: u32, total_data: u64) -> Self {
        let limit = limit.max(1) as u64;
        let total_page = total_data.div_ceil(limit).max(1).min(u32::MAX as u64) as u32;

        let prev_page = if current_page <= 1 {
            None
        } else {
            Some(current_page - 1)
        };
        let next_page = if current_page >= total_page {
            None
        } else {
            Some(current_page + 1)
        };

        Self {
            total_page,
            current_page,
            prev_page,
            next_page,
            total_data,
        }
    }

    pub fn for_request(request: &PageRequest, total_data: u64) -> Self {
        Self::new(request.page, request.limit, total_data)
    }

    pub fn ensure_in_bounds(&self) -> Result<(), PageOutOfBounds> {
        if self.current_page > self.total_page {
            return Err(PageOutOfBounds {
                requested: self.current_page,
                total_page: self.total_page,
            });
        }
        Ok(())
    }
}

/// Slice one page out of an already ordered, in-memory result set
pub fn page_slice<'a, T>(items: &'a [T], request: &PageRequest) -> &'a [T] {
    let start = (request.offset().max(0) as usize).min(items.len());
    let end = start.saturating_add(request.limit as usize).min(items.len());
    &items[start..end]
}
