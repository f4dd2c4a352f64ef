//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Total number of matching items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Builds pagination metadata for `total` items.
    #[must_use]
    pub fn new(page: u32, limit: u32, total: usize) -> Self {
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginationMeta::new(1, 10, 21).total_pages, 3);
        assert_eq!(PaginationMeta::new(1, 10, 20).total_pages, 2);
        assert_eq!(PaginationMeta::new(1, 10, 0).total_pages, 0);
    }
}
