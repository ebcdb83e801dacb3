//! PostgREST-style row store
//!
//! Filters become query parameters (`col=op.value`, `or=(...)`), windows
//! become a `Range` header, and exact counts come back in `Content-Range`.

use async_trait::async_trait;
use http::StatusCode;
use reqwest::Method;
use serde_json::Value;
use shared::backend::{BackendResult, Filter, Order, RowStore, SelectQuery, SelectResult};

use crate::{ClientError, HttpClient};

const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone)]
pub struct RestRowStore {
    http: HttpClient,
}

/// Render a JSON value as a filter operand
fn operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Quote an operand inside `or=(...)` when it contains reserved characters
fn quote_reserved(value: &str) -> String {
    if value.contains([',', '.', ':', '(', ')', '"', '\\', ' ']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Escape LIKE wildcards so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `op.value` for a single-column filter
fn operator(filter: &Filter) -> Option<(&str, String)> {
    match filter {
        Filter::Eq { column, value } if value.is_null() => Some((column, "is.null".to_string())),
        Filter::Eq { column, value } => Some((column, format!("eq.{}", operand(value)))),
        Filter::Contains { column, value } => {
            Some((column, format!("ilike.*{}*", escape_like(value))))
        }
        Filter::Gte { column, value } => Some((column, format!("gte.{}", operand(value)))),
        Filter::Lt { column, value } => Some((column, format!("lt.{}", operand(value)))),
        Filter::Or(_) | Filter::And(_) => None,
    }
}

/// Filter inside a logical group: `col.op.value`, `or(...)`, `and(...)`
fn nested(filter: &Filter) -> String {
    match filter {
        Filter::Or(inner) => format!("or({})", inner.iter().map(nested).collect::<Vec<_>>().join(",")),
        Filter::And(inner) => format!("and({})", inner.iter().map(nested).collect::<Vec<_>>().join(",")),
        single => match operator(single) {
            Some((column, op)) => match op.split_once('.') {
                Some((name, value)) => format!("{}.{}.{}", column, name, quote_reserved(value)),
                None => format!("{}.{}", column, op),
            },
            None => String::new(),
        },
    }
}

/// Query parameters for a filter
pub fn encode_filter(filter: &Filter) -> Vec<(String, String)> {
    match filter {
        Filter::And(inner) => inner.iter().flat_map(encode_filter).collect(),
        Filter::Or(inner) => vec![(
            "or".to_string(),
            format!("({})", inner.iter().map(nested).collect::<Vec<_>>().join(",")),
        )],
        single => operator(single)
            .map(|(column, op)| vec![(column.to_string(), op)])
            .unwrap_or_default(),
    }
}

/// `order` parameter value
pub fn encode_order(order: &[Order]) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    Some(
        order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Total from `Content-Range: 0-8/10` or `*/0`; `None` for `*`
pub fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/').and_then(|(_, total)| total.trim().parse().ok())
}

/// Parameters selecting one row by id
fn id_param(id: &str) -> [(String, String); 1] {
    [("id".to_string(), format!("eq.{}", id))]
}

fn table_path(table: &str) -> String {
    format!("rest/v1/{}", table)
}

impl RestRowStore {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RowStore for RestRowStore {
    async fn select(&self, table: &str, query: &SelectQuery) -> BackendResult<SelectResult> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(filter) = &query.filter {
            params.extend(encode_filter(filter));
        }
        if let Some(order) = encode_order(&query.order) {
            params.push(("order".to_string(), order));
        }
        // an empty window cannot be expressed as a Range header
        if query.range.is_some_and(|r| r.limit == 0) {
            params.push(("limit".to_string(), "0".to_string()));
        }

        let mut request = self.http.request(Method::GET, &table_path(table)).query(&params);
        if let Some(range) = query.range.filter(|r| r.limit > 0) {
            request = request
                .header("Range-Unit", "items")
                .header(http::header::RANGE, format!("{}-{}", range.offset, range.last()));
        }
        if query.count_exact {
            request = request.header("Prefer", "count=exact");
        }

        let response = request.send().await.map_err(ClientError::from)?;
        let total = response
            .headers()
            .get(http::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .filter(|_| query.count_exact);

        // window past the end
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            tracing::debug!(table, ?total, "Range not satisfiable, empty window");
            return Ok(SelectResult {
                rows: Vec::new(),
                total,
            });
        }

        let response = HttpClient::check(response).await?;
        let rows: Vec<Value> = HttpClient::handle_response(response).await?;
        Ok(SelectResult { rows, total })
    }

    async fn insert(&self, table: &str, row: Value) -> BackendResult<Value> {
        let request = self
            .http
            .request(Method::POST, &table_path(table))
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&row);
        let rows: Vec<Value> = self.http.send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("insert returned no row".into()).into())
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> BackendResult<Option<Value>> {
        let request = self
            .http
            .request(Method::PATCH, &table_path(table))
            .query(&id_param(id))
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&patch);
        let rows: Vec<Value> = self.http.send_json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, table: &str, id: &str) -> BackendResult<bool> {
        let request = self
            .http
            .request(Method::DELETE, &table_path(table))
            .query(&id_param(id))
            .header("Prefer", PREFER_REPRESENTATION);
        let rows: Vec<Value> = self.http.send_json(request).await?;
        Ok(!rows.is_empty())
    }

    async fn rpc(&self, function: &str, args: Value) -> BackendResult<Vec<Value>> {
        let rows: Vec<Value> = self
            .http
            .post(&format!("rest/v1/rpc/{}", function), &args)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_search_filter() {
        let filter = Filter::Or(vec![
            Filter::contains("full_name", "ani"),
            Filter::contains("phone", "ani"),
        ]);
        assert_eq!(
            encode_filter(&filter),
            vec![(
                "or".to_string(),
                "(full_name.ilike.*ani*,phone.ilike.*ani*)".to_string()
            )]
        );
    }

    #[test]
    fn test_encode_reserved_characters_are_quoted() {
        let filter = Filter::Or(vec![Filter::contains("full_name", "Siregar, M.")]);
        assert_eq!(
            encode_filter(&filter)[0].1,
            r#"(full_name.ilike."*Siregar, M.*")"#
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(
            encode_filter(&Filter::contains("full_name", "a_b")),
            vec![("full_name".to_string(), "ilike.*a\\_b*".to_string())]
        );
    }

    #[test]
    fn test_encode_and_flattens() {
        let filter = Filter::And(vec![
            Filter::gte("created_at", "2024-01-01T00:00:00+07:00"),
            Filter::lt("created_at", "2024-02-01T00:00:00+07:00"),
            Filter::eq("id", Value::Null),
        ]);
        assert_eq!(
            encode_filter(&filter),
            vec![
                ("created_at".to_string(), "gte.2024-01-01T00:00:00+07:00".to_string()),
                ("created_at".to_string(), "lt.2024-02-01T00:00:00+07:00".to_string()),
                ("id".to_string(), "is.null".to_string()),
            ]
        );
    }

    #[test]
    fn test_encode_order() {
        assert_eq!(encode_order(&[]), None);
        assert_eq!(
            encode_order(&[Order::desc("created_at"), Order::asc("id")]).as_deref(),
            Some("created_at.desc,id.asc")
        );
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-8/10"), Some(10));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-8/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }
}
