//! Memory collaborators (same-process)
//!
//! In-process implementations of the row, blob and auth contracts. Used for
//! single-process runs and tests; each supports failure injection, and the
//! row store can delay selects to reproduce out-of-order responses.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared::backend::{
    AuthProvider, BackendError, BackendResult, BlobStore, Filter, PutOptions, RowStore, SelectQuery,
    SelectResult,
};
use shared::models::{AdminRole, Identity};

use crate::services::birthday::BirthdayWindow;
use crate::utils::time::parse_storage_date;

// ============================================================================
// Row store
// ============================================================================

/// Server-side function over the rows of one table
pub type RpcHandler = Arc<dyn Fn(&[Value], &Value) -> BackendResult<Vec<Value>> + Send + Sync>;

fn injected(what: &str) -> BackendError {
    BackendError::Transport(format!("injected {} failure", what))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn field<'a>(row: &'a Value, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => {
            let actual = field(row, column);
            actual == value || (as_text(actual).is_some() && as_text(actual) == as_text(value))
        }
        Filter::Contains { column, value } => field(row, column)
            .as_str()
            .is_some_and(|s| s.to_lowercase().contains(&value.to_lowercase())),
        Filter::Gte { column, value } => {
            !field(row, column).is_null() && compare_values(field(row, column), value) != Ordering::Less
        }
        Filter::Lt { column, value } => {
            !field(row, column).is_null() && compare_values(field(row, column), value) == Ordering::Less
        }
        Filter::Or(inner) => inner.iter().any(|f| matches(row, f)),
        Filter::And(inner) => inner.iter().all(|f| matches(row, f)),
    }
}

/// Row store kept in memory
pub struct MemoryRowStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    rpcs: RwLock<HashMap<String, (String, RpcHandler)>>,
    last_created: Mutex<DateTime<Utc>>,
    select_delays: Mutex<VecDeque<Duration>>,
    select_calls: AtomicUsize,
    fail_selects: AtomicBool,
    fail_inserts: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
    fail_rpcs: AtomicBool,
}

impl Default for MemoryRowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            rpcs: RwLock::new(HashMap::new()),
            last_created: Mutex::new(DateTime::<Utc>::MIN_UTC),
            select_delays: Mutex::new(VecDeque::new()),
            select_calls: AtomicUsize::new(0),
            fail_selects: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_rpcs: AtomicBool::new(false),
        }
    }

    /// Register a server-side function over `table`
    pub fn register_rpc(&self, function: impl Into<String>, table: impl Into<String>, handler: RpcHandler) {
        self.rpcs.write().insert(function.into(), (table.into(), handler));
    }

    /// Register the birthday aggregate: args `{month, day}`, rows of `table`
    /// whose birth date falls within `window`
    pub fn with_birthday_rpc(self, function: &str, table: &str, window: BirthdayWindow) -> Self {
        let handler: RpcHandler = Arc::new(move |rows, args| {
            let month = args.get("month").and_then(Value::as_u64).unwrap_or(0) as u32;
            let day = args.get("day").and_then(Value::as_u64).unwrap_or(0) as u32;
            // leap reference year so 29 Feb is a valid request
            let as_of = NaiveDate::from_ymd_opt(2000, month, day)
                .ok_or_else(|| BackendError::Rejected {
                    status: 400,
                    message: format!("invalid month/day {}/{}", month, day),
                })?;

            Ok(rows
                .iter()
                .filter(|row| {
                    row.get("birthday")
                        .and_then(Value::as_str)
                        .and_then(parse_storage_date)
                        .is_some_and(|birth| window.contains(birth, as_of))
                })
                .cloned()
                .collect())
        });
        self.register_rpc(function, table, handler);
        self
    }

    /// Strictly increasing creation timestamps
    fn next_created_at(&self) -> String {
        let mut last = self.last_created.lock();
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + chrono::Duration::microseconds(1)
        };
        *last = next;
        next.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn prepare_row(&self, row: Value) -> BackendResult<Value> {
        let Value::Object(mut obj) = row else {
            return Err(BackendError::Rejected {
                status: 400,
                message: "row must be an object".into(),
            });
        };
        if !obj.contains_key("id") {
            obj.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if !obj.contains_key("created_at") {
            obj.insert("created_at".into(), Value::String(self.next_created_at()));
        }
        Ok(Value::Object(obj))
    }

    /// Insert a row directly, bypassing failure injection
    pub fn seed(&self, table: &str, row: Value) -> BackendResult<Value> {
        let row = self.prepare_row(row)?;
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    /// Snapshot of a table in insertion order
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.tables.read().get(table).map(Vec::len).unwrap_or(0)
    }

    /// Number of selects served (including failed ones)
    pub fn select_calls(&self) -> usize {
        self.select_calls.load(AtomicOrdering::SeqCst)
    }

    /// Delay the next select that arrives by `delay`
    pub fn delay_next_select(&self, delay: Duration) {
        self.select_delays.lock().push_back(delay);
    }

    pub fn fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn fail_rpcs(&self, fail: bool) {
        self.fail_rpcs.store(fail, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn select(&self, table: &str, query: &SelectQuery) -> BackendResult<SelectResult> {
        self.select_calls.fetch_add(1, AtomicOrdering::SeqCst);
        let delay = self.select_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_selects.load(AtomicOrdering::SeqCst) {
            return Err(injected("select"));
        }

        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.filter.as_ref().is_none_or(|f| matches(row, f)))
            .collect();

        rows.sort_by(|a, b| {
            query.order.iter().fold(Ordering::Equal, |acc, order| {
                acc.then_with(|| {
                    let cmp = compare_values(field(a, &order.column), field(b, &order.column));
                    if order.ascending { cmp } else { cmp.reverse() }
                })
            })
        });

        let total = rows.len() as u64;
        let rows = match query.range {
            Some(range) => rows
                .into_iter()
                .skip(range.offset as usize)
                .take(range.limit as usize)
                .collect(),
            None => rows,
        };

        Ok(SelectResult {
            rows,
            total: query.count_exact.then_some(total),
        })
    }

    async fn insert(&self, table: &str, row: Value) -> BackendResult<Value> {
        if self.fail_inserts.load(AtomicOrdering::SeqCst) {
            return Err(injected("insert"));
        }
        self.seed(table, row)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> BackendResult<Option<Value>> {
        if self.fail_updates.load(AtomicOrdering::SeqCst) {
            return Err(injected("update"));
        }
        let Value::Object(patch) = patch else {
            return Err(BackendError::Rejected {
                status: 400,
                message: "patch must be an object".into(),
            });
        };

        let mut tables = self.tables.write();
        let Some(row) = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| as_text(field(r, "id")).as_deref() == Some(id)))
        else {
            return Ok(None);
        };

        if let Value::Object(obj) = row {
            for (key, value) in patch {
                // identity and creation time are immutable
                if key != "id" && key != "created_at" {
                    obj.insert(key, value);
                }
            }
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, table: &str, id: &str) -> BackendResult<bool> {
        if self.fail_deletes.load(AtomicOrdering::SeqCst) {
            return Err(injected("delete"));
        }
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| as_text(field(r, "id")).as_deref() != Some(id));
        Ok(rows.len() < before)
    }

    async fn rpc(&self, function: &str, args: Value) -> BackendResult<Vec<Value>> {
        if self.fail_rpcs.load(AtomicOrdering::SeqCst) {
            return Err(injected("rpc"));
        }
        let Some((table, handler)) = self.rpcs.read().get(function).cloned() else {
            return Err(BackendError::Rejected {
                status: 404,
                message: format!("function {} not found", function),
            });
        };
        let rows = self.rows(&table);
        handler(&rows, &args)
    }
}

// ============================================================================
// Blob store
// ============================================================================

#[derive(Debug, Clone)]
struct StoredBlob {
    content: Vec<u8>,
    options: PutOptions,
}

/// Blob store kept in memory; keys listed in lexical order
pub struct MemoryBlobStore {
    base_url: String,
    objects: RwLock<BTreeMap<String, StoredBlob>>,
    fail_puts: AtomicBool,
    fail_lists: AtomicBool,
    fail_removes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(BTreeMap::new()),
            fail_puts: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
        }
    }

    /// Store an object directly, bypassing failure injection
    pub fn insert_raw(&self, key: &str, content: Vec<u8>) {
        self.objects.write().insert(
            key.to_string(),
            StoredBlob {
                content,
                options: PutOptions::default(),
            },
        );
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn content(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).map(|b| b.content.clone())
    }

    /// Options the object was last written with
    pub fn options(&self, key: &str) -> Option<PutOptions> {
        self.objects.read().get(key).map(|b| b.options.clone())
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, content: Vec<u8>, options: PutOptions) -> BackendResult<()> {
        if self.fail_puts.load(AtomicOrdering::SeqCst) {
            return Err(injected("put"));
        }
        let mut objects = self.objects.write();
        if !options.upsert && objects.contains_key(key) {
            return Err(BackendError::Rejected {
                status: 409,
                message: format!("object {} already exists", key),
            });
        }
        objects.insert(key.to_string(), StoredBlob { content, options });
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn list(&self) -> BackendResult<Vec<String>> {
        if self.fail_lists.load(AtomicOrdering::SeqCst) {
            return Err(injected("list"));
        }
        Ok(self.keys())
    }

    async fn remove(&self, keys: &[String]) -> BackendResult<()> {
        if self.fail_removes.load(AtomicOrdering::SeqCst) {
            return Err(injected("remove"));
        }
        let mut objects = self.objects.write();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}

// ============================================================================
// Auth provider
// ============================================================================

/// Auth provider with a fixed set of accounts
#[derive(Default)]
pub struct StaticAuthProvider {
    current: RwLock<Option<Identity>>,
    roles: RwLock<HashMap<String, AdminRole>>,
    accounts: RwLock<HashMap<String, (String, Identity)>>,
    fail_role_lookup: AtomicBool,
}

impl StaticAuthProvider {
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Signed in as a regular user (no admin row)
    pub fn user(identity: Identity) -> Self {
        let provider = Self::default();
        *provider.current.write() = Some(identity);
        provider
    }

    /// Signed in as an administrator (role 1)
    pub fn admin(identity: Identity) -> Self {
        Self::with_role(
            identity,
            AdminRole {
                role: shared::models::ADMIN_ROLE,
                name: Some("Admin".into()),
            },
        )
    }

    pub fn with_role(identity: Identity, role: AdminRole) -> Self {
        let provider = Self::default();
        provider.roles.write().insert(identity.id.clone(), role);
        *provider.current.write() = Some(identity);
        provider
    }

    /// Add a password account, optionally with an admin role value
    pub fn with_account(self, email: &str, password: &str, identity: Identity, role: Option<i32>) -> Self {
        if let Some(role) = role {
            self.roles
                .write()
                .insert(identity.id.clone(), AdminRole { role, name: None });
        }
        self.accounts
            .write()
            .insert(email.to_string(), (password.to_string(), identity));
        self
    }

    pub fn set_current(&self, identity: Option<Identity>) {
        *self.current.write() = identity;
    }

    pub fn fail_role_lookup(&self, fail: bool) {
        self.fail_role_lookup.store(fail, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_user(&self) -> BackendResult<Option<Identity>> {
        Ok(self.current.read().clone())
    }

    async fn admin_role(&self, identity: &Identity) -> BackendResult<Option<AdminRole>> {
        if self.fail_role_lookup.load(AtomicOrdering::SeqCst) {
            return Err(injected("role lookup"));
        }
        Ok(self.roles.read().get(&identity.id).cloned())
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Identity> {
        let identity = match self.accounts.read().get(email) {
            Some((expected, identity)) if expected == password => identity.clone(),
            _ => return Err(BackendError::Unauthorized),
        };
        *self.current.write() = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        *self.current.write() = None;
        Ok(())
    }
}
