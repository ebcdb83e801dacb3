//! Member Repository

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use shared::backend::{Filter, Order, RowStore, SelectQuery};
use shared::models::{Member, MemberInsert, MemberPatch};

use super::{RepoError, RepoResult};

/// Rows of one select, with the exact count when requested
#[derive(Debug, Clone, Default)]
pub struct MemberRows {
    pub members: Vec<Member>,
    pub total: Option<u64>,
}

fn decode(row: Value) -> RepoResult<Member> {
    let id = row.get("id").map(|v| v.to_string()).unwrap_or_default();
    serde_json::from_value(row).map_err(|e| RepoError::Decode(format!("member {}: {}", id, e)))
}

fn decode_all(rows: Vec<Value>) -> RepoResult<Vec<Member>> {
    rows.into_iter().map(decode).collect()
}

fn encode<T: serde::Serialize>(value: &T) -> RepoResult<Value> {
    serde_json::to_value(value).map_err(|e| RepoError::Decode(e.to_string()))
}

pub async fn select(store: &dyn RowStore, table: &str, query: &SelectQuery) -> RepoResult<MemberRows> {
    let result = store.select(table, query).await?;
    Ok(MemberRows {
        members: decode_all(result.rows)?,
        total: result.total,
    })
}

pub async fn find_by_id(store: &dyn RowStore, table: &str, id: &str) -> RepoResult<Option<Member>> {
    let query = SelectQuery::new().filter(Filter::eq("id", id)).range(0, 1);
    let result = store.select(table, &query).await?;
    result.rows.into_iter().next().map(decode).transpose()
}

pub async fn create(store: &dyn RowStore, table: &str, data: &MemberInsert) -> RepoResult<Member> {
    let row = store.insert(table, encode(data)?).await?;
    decode(row)
}

pub async fn update(store: &dyn RowStore, table: &str, id: &str, data: &MemberPatch) -> RepoResult<Member> {
    let row = store
        .update(table, id, encode(data)?)
        .await?
        .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
    decode(row)
}

/// Returns `false` when the id does not exist
pub async fn delete(store: &dyn RowStore, table: &str, id: &str) -> RepoResult<bool> {
    Ok(store.delete(table, id).await?)
}

/// Server-side birthday aggregate; year is not part of the request
pub async fn upcoming_birthdays(
    store: &dyn RowStore,
    function: &str,
    month: u32,
    day: u32,
) -> RepoResult<Vec<Member>> {
    let rows = store.rpc(function, json!({ "month": month, "day": day })).await?;
    decode_all(rows)
}

/// Members created in `[from, to)`, oldest first
pub async fn find_created_between(
    store: &dyn RowStore,
    table: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> RepoResult<Vec<Member>> {
    let query = SelectQuery::new()
        .filter(Filter::And(vec![
            Filter::gte("created_at", from.to_rfc3339()),
            Filter::lt("created_at", to.to_rfc3339()),
        ]))
        .order(Order::asc("created_at"))
        .order(Order::asc("id"));
    let result = store.select(table, &query).await?;
    decode_all(result.rows)
}
