//! Pagination types for list endpoints.
//!
//! Pages are 0-indexed. A page size of zero is rejected rather than clamped.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request parameters for paginated queries, as supplied by a caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page index (0-indexed). Defaults to the first page.
    #[serde(default)]
    pub page: u64,
    /// Number of items per page. `None` means the configured default.
    #[serde(default)]
    pub page_size: Option<u64>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page index (0-indexed).
    pub page: u64,
    /// Number of items per page, always positive.
    pub page_size: u64,
}

impl PageRequest {
    /// Resolves the request against the configured default and maximum sizes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the page size is zero or exceeds `max_size`.
    pub fn resolve(self, default_size: u64, max_size: u64) -> Result<Page, AppError> {
        let page_size = self.page_size.unwrap_or(default_size);
        if page_size == 0 {
            return Err(AppError::Validation("page_size must be positive".into()));
        }
        if page_size > max_size {
            return Err(AppError::Validation(format!(
                "page_size must not exceed {max_size}"
            )));
        }
        Ok(Page {
            page: self.page,
            page_size,
        })
    }
}

impl Page {
    /// Calculates the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size)
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Number of pages needed to show `total` items, `page_size` at a time.
///
/// An empty collection has zero pages. `page_size` must be positive.
#[must_use]
pub const fn page_count(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page index.
    pub page: u64,
    /// Items per page.
    pub page_size: u64,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta {
                page: page.page,
                page_size: page.page_size,
                total,
                total_pages: page_count(total, page.page_size),
            },
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
