//! Member query engine
//!
//! Filtered, ordered, windowed reads with an exact matching count.

use std::sync::Arc;

use shared::backend::{Filter, Order, RowStore, SelectQuery};
use shared::error::{AppError, AppResult};
use shared::models::{Member, PaginatedResponse};

use crate::db::repository::member;

/// Columns the search term is matched against (OR)
pub const SEARCH_COLUMNS: [&str; 2] = ["full_name", "phone"];

#[derive(Clone)]
pub struct MemberQueryEngine {
    store: Arc<dyn RowStore>,
    table: String,
}

impl MemberQueryEngine {
    pub fn new(store: Arc<dyn RowStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Build the select for one page
    ///
    /// Creation time descending, id descending as tie-breaker so windows
    /// never overlap when timestamps collide.
    pub fn build_query(search_term: &str, page: u32, page_size: u32) -> SelectQuery {
        let mut query = SelectQuery::new()
            .order(Order::desc("created_at"))
            .order(Order::desc("id"))
            .range(
                (page.saturating_sub(1) as u64) * page_size as u64,
                page_size as u64,
            )
            .count_exact();

        let term = search_term.trim();
        if !term.is_empty() {
            query = query.filter(Filter::Or(
                SEARCH_COLUMNS
                    .iter()
                    .map(|column| Filter::contains(*column, term))
                    .collect(),
            ));
        }
        query
    }

    /// One page of members plus the total matching the search term
    pub async fn list(
        &self,
        search_term: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<PaginatedResponse<Member>> {
        if page == 0 || page_size == 0 {
            return Err(AppError::with_message(
                shared::error::ErrorCode::ValueOutOfRange,
                "page and page size start at 1",
            )
            .with_detail("page", page)
            .with_detail("page_size", page_size));
        }

        let query = Self::build_query(search_term, page, page_size);
        let rows = member::select(self.store.as_ref(), &self.table, &query)
            .await
            .map_err(|e| e.into_query_error())?;

        let total = rows
            .total
            .ok_or_else(|| AppError::query("Row store did not report an exact count"))?;

        if rows.members.len() > page_size as usize {
            return Err(AppError::query(format!(
                "Row store returned {} rows for a window of {}",
                rows.members.len(),
                page_size
            )));
        }

        tracing::debug!(
            term = search_term,
            page,
            page_size,
            returned = rows.members.len(),
            total,
            "Member page loaded"
        );
        Ok(PaginatedResponse::new(rows.members, total, page, page_size))
    }
}
