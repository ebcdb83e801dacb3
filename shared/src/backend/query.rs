//! Generic filtered / ordered / paginated read

use serde_json::Value;

/// Row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column == value`
    Eq { column: String, value: Value },
    /// Case-insensitive substring match on a text column
    Contains { column: String, value: String },
    /// `column >= value`
    Gte { column: String, value: Value },
    /// `column < value`
    Lt { column: String, value: Value },
    /// Any of the inner filters
    Or(Vec<Filter>),
    /// All of the inner filters
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn contains(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Window of rows: `[offset, offset + limit)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: u64,
    pub limit: u64,
}

impl Range {
    /// Inclusive index of the last row in the window
    pub fn last(&self) -> u64 {
        (self.offset + self.limit).saturating_sub(1)
    }
}

/// Select request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub filter: Option<Filter>,
    pub order: Vec<Order>,
    pub range: Option<Range>,
    /// Ask for the exact number of rows matching the filter
    pub count_exact: bool,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.range = Some(Range { offset, limit });
        self
    }

    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }
}

/// Select response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectResult {
    pub rows: Vec<Value>,
    /// Exact count of matching rows, when requested
    pub total: Option<u64>,
}
