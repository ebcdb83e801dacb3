//! Paginated response

use serde::{Deserialize, Serialize};

/// One page of a filtered, ordered listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Items of this page
    pub data: Vec<T>,
    /// Number of rows matching the filter, ignoring pagination
    pub total: u64,
    /// Page index (1-based)
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Number of pages (at least 1)
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        Self {
            data,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        }
    }
}

/// `ceil(total / limit)` with a floor of one page
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 || total == 0 {
        return 1;
    }
    total.div_ceil(limit as u64).min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 9), 1);
        assert_eq!(total_pages(9, 9), 1);
        assert_eq!(total_pages(10, 9), 2);
        assert_eq!(total_pages(18, 9), 2);
        assert_eq!(total_pages(19, 9), 3);
        assert_eq!(total_pages(5, 0), 1);
    }

    #[test]
    fn test_new_page() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 12, 2, 3);
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.data.len(), 3);
    }
}
