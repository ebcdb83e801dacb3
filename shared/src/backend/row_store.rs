use async_trait::async_trait;
use serde_json::Value;

use super::{BackendResult, SelectQuery, SelectResult};

/// Row store contract
///
/// Every row carries an `id` assigned by the store on insert.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Filtered, ordered, windowed read
    async fn select(&self, table: &str, query: &SelectQuery) -> BackendResult<SelectResult>;

    /// Insert a row and return it as stored
    async fn insert(&self, table: &str, row: Value) -> BackendResult<Value>;

    /// Patch a row by id; `None` when the id does not exist
    async fn update(&self, table: &str, id: &str, patch: Value) -> BackendResult<Option<Value>>;

    /// Delete a row by id; `false` when the id does not exist
    async fn delete(&self, table: &str, id: &str) -> BackendResult<bool>;

    /// Call a server-side function returning rows
    async fn rpc(&self, function: &str, args: Value) -> BackendResult<Vec<Value>>;
}
