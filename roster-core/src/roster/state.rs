//! Roster state snapshot

use shared::error::AppError;
use shared::models::{Member, PaginatedResponse, total_pages};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RosterStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

/// The in-memory page currently shown
#[derive(Debug, Clone, PartialEq)]
pub struct RosterPage {
    /// Creation time descending
    pub items: Vec<Member>,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    /// Authoritative count from the store, not `items.len()`
    pub total_count: u64,
    pub search_term: String,
}

impl RosterPage {
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size,
            total_count: 0,
            search_term: String::new(),
        }
    }

    pub fn from_response(response: PaginatedResponse<Member>, search_term: String) -> Self {
        Self {
            items: response.data,
            page: response.page,
            page_size: response.limit,
            total_count: response.total,
            search_term,
        }
    }

    /// At least one page, even when nothing matches
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    /// Clamp a requested page into `[1, total_pages]`
    pub fn clamp_page(&self, requested: u32) -> u32 {
        requested.clamp(1, self.total_pages())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterState {
    pub status: RosterStatus,
    pub page: RosterPage,
    /// Upcoming birthdays, nearest first
    pub birthdays: Vec<Member>,
    /// Error of the last failed load, cleared by the next successful one
    pub last_error: Option<AppError>,
}

impl RosterState {
    pub fn empty(page_size: u32) -> Self {
        Self {
            status: RosterStatus::Idle,
            page: RosterPage::empty(page_size),
            birthdays: Vec::new(),
            last_error: None,
        }
    }
}

/// What happened to a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the roster
    Applied,
    /// A newer request started first; the response was discarded
    Superseded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page() {
        let mut page = RosterPage::empty(9);
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.clamp_page(0), 1);
        assert_eq!(page.clamp_page(5), 1);

        page.total_count = 10;
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.clamp_page(2), 2);
        assert_eq!(page.clamp_page(3), 2);
    }
}
