//! Shared API response types

use crate::models::PagedResult;
use serde::Serialize;

/// Paginated list envelope
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PageResponse<T> {
    /// Build the envelope from a service page, mapping each item
    pub fn from_page<U>(page: PagedResult<U>, map: impl Fn(U) -> T) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items.into_iter().map(map).collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}
