//! Pagination

use serde::{Deserialize, Serialize};

/// Default page size when none (or a non-positive one) is requested.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// A normalized page request (1-based).
///
/// # Examples
///
/// ```
/// use tenancy_org::PageRequest;
///
/// let page = PageRequest::new(0, 0);
/// assert_eq!(page.page, 1);
/// assert_eq!(page.per_page, 10);
/// assert_eq!(PageRequest::new(3, 20).offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,

    /// Items per page
    pub per_page: u32,
}

impl PageRequest {
    /// Build a request, clamping out-of-range values.
    pub fn new(page: i64, per_page: i64) -> Self {
        let page = if page < 1 { 1 } else { page.min(u32::MAX as i64) as u32 };
        let per_page = if per_page < 1 {
            DEFAULT_PER_PAGE
        } else {
            per_page.min(MAX_PER_PAGE as i64) as u32
        };
        Self { page, per_page }
    }

    /// Number of items to skip.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }

    /// Number of items to take.
    pub fn limit(&self) -> usize {
        self.per_page as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE as i64)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Total matching items across all pages
    pub total: u64,

    /// 1-based page number
    pub page: u32,

    /// Items per page
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Assemble a page from a request and a storage result.
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
        }
    }

    /// Total number of pages.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page as u64)
    }

    /// Map the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}
