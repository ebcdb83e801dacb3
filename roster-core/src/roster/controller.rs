//! Roster Controller
//!
//! Owns the roster state and turns user actions into service calls.
//!
//! # Supersession
//!
//! Every load (`search`, `change_page`, `refresh`) takes a token from one
//! increasing sequence. A response is applied only if its token is still
//! the latest issued; anything older is discarded.
//!
//! # Failure policy
//!
//! A failed load moves to `Error` and keeps the last good page. A failed
//! delete resynchronizes with a full refresh instead of undoing the
//! optimistic removal item by item.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use shared::backend::{BlobStore, RowStore};
use shared::error::{AppError, AppResult, ErrorCategory};
use shared::models::{Member, MemberCreate, MemberUpdate, PhotoUpload};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::debounce::SearchDebouncer;
use super::state::{LoadOutcome, RosterPage, RosterState, RosterStatus};
use crate::auth::{AuthContext, Session};
use crate::core::Config;
use crate::services::{
    BirthdayNotifier, BirthdayWindow, MemberMutationService, MemberQueryEngine, PhotoAssetManager,
};
use crate::utils::time::{Clock, SystemClock};

/// Everything the controller is wired to
pub struct RosterParts {
    pub query: MemberQueryEngine,
    pub mutations: Arc<MemberMutationService>,
    pub birthdays: BirthdayNotifier,
    pub auth: Arc<AuthContext>,
    pub clock: Arc<dyn Clock>,
    pub page_size: u32,
    pub search_debounce: Duration,
}

impl RosterParts {
    /// Wire the services from configuration
    pub fn from_config(
        config: &Config,
        rows: Arc<dyn RowStore>,
        blobs: Arc<dyn BlobStore>,
        auth: Arc<AuthContext>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let photos = PhotoAssetManager::new(blobs).with_max_bytes(config.max_photo_bytes);
        Self {
            query: MemberQueryEngine::new(rows.clone(), &config.member_table),
            mutations: Arc::new(MemberMutationService::new(
                rows.clone(),
                &config.member_table,
                photos,
                auth.clone(),
                clock.clone(),
            )),
            birthdays: BirthdayNotifier::new(
                rows,
                &config.birthday_rpc,
                BirthdayWindow::new(config.birthday_window_days),
            ),
            auth,
            clock,
            page_size: config.page_size,
            search_debounce: config.search_debounce(),
        }
    }
}

struct Inner {
    query: MemberQueryEngine,
    mutations: Arc<MemberMutationService>,
    birthdays: BirthdayNotifier,
    auth: Arc<AuthContext>,
    clock: Arc<dyn Clock>,
    page_size: u32,
    state: watch::Sender<RosterState>,
    query_seq: AtomicU64,
    birthday_seq: AtomicU64,
}

impl Inner {
    fn current_query(&self) -> (String, u32) {
        let state = self.state.borrow();
        (state.page.search_term.clone(), state.page.page)
    }

    async fn load(&self, term: String, page: u32) -> AppResult<LoadOutcome> {
        if let Err(e) = self.auth.require_user() {
            self.state.send_modify(|s| {
                s.status = RosterStatus::Error;
                s.last_error = Some(e.clone());
            });
            return Err(e);
        }

        let token = self.query_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.status = RosterStatus::Loading);
        tracing::debug!(token, term = %term, page, "Loading roster page");

        let result = self.query.list(&term, page, self.page_size).await;

        let mut outcome = LoadOutcome::Superseded;
        let mut failure = None;
        self.state.send_if_modified(|s| {
            if self.query_seq.load(Ordering::SeqCst) != token {
                return false;
            }
            match result {
                Ok(response) => {
                    s.page = RosterPage::from_response(response, term);
                    s.status = RosterStatus::Idle;
                    s.last_error = None;
                    outcome = LoadOutcome::Applied;
                }
                Err(e) => {
                    // keep the last good page on screen
                    s.status = RosterStatus::Error;
                    s.last_error = Some(e.clone());
                    failure = Some(e);
                }
            }
            true
        });

        if let Some(e) = failure {
            tracing::warn!(token, page, error = %e, "Roster load failed, keeping last page");
            return Err(e);
        }

        match outcome {
            LoadOutcome::Applied => self.refresh_birthdays().await,
            LoadOutcome::Superseded => tracing::debug!(token, "Discarded stale roster response"),
        }
        Ok(outcome)
    }

    async fn refresh(&self) -> AppResult<LoadOutcome> {
        let (term, page) = self.current_query();
        self.load(term, page).await
    }

    async fn refresh_birthdays(&self) {
        let token = self.birthday_seq.fetch_add(1, Ordering::SeqCst) + 1;
        match self.birthdays.compute_upcoming(self.clock.today()).await {
            Ok(upcoming) => {
                self.state.send_if_modified(|s| {
                    if self.birthday_seq.load(Ordering::SeqCst) != token {
                        return false;
                    }
                    s.birthdays = upcoming;
                    true
                });
            }
            Err(e) => tracing::warn!(error = %e, "Birthday refresh failed, keeping previous list"),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.auth.require_admin()?;
        if self.mutations.is_busy(id) {
            return Err(AppError::member_busy(id));
        }

        // optimistic removal
        let removed = self.state.send_if_modified(|s| {
            let before = s.page.items.len();
            s.page.items.retain(|m| m.id != id);
            let removed = s.page.items.len() < before;
            if removed {
                s.page.total_count = s.page.total_count.saturating_sub(1);
            }
            removed
        });

        match self.mutations.delete(id).await {
            Ok(()) => {
                let (emptied, page, term) = {
                    let s = self.state.borrow();
                    (s.page.items.is_empty(), s.page.page, s.page.search_term.clone())
                };
                if emptied && page > 1 {
                    tracing::debug!(member_id = %id, page, "Page emptied by delete, stepping back");
                    if let Err(e) = self.load(term, page - 1).await {
                        tracing::warn!(error = %e, "Reload after delete failed");
                    }
                } else if removed {
                    self.refresh_birthdays().await;
                } else {
                    // not on the visible page; only the count and birthdays moved
                    if let Err(e) = self.refresh().await {
                        tracing::warn!(error = %e, "Reload after delete failed");
                    }
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(member_id = %id, error = %e, "Delete failed, resynchronizing roster");
                if let Err(refresh_err) = self.refresh().await {
                    tracing::warn!(error = %refresh_err, "Resynchronization after failed delete failed");
                }
                Err(e)
            }
        }
    }

    /// Drop all roster data (session ended)
    fn clear(&self) {
        self.query_seq.fetch_add(1, Ordering::SeqCst);
        self.birthday_seq.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(RosterState::empty(self.page_size));
    }
}

/// Roster state machine
///
/// Must be created inside a Tokio runtime: construction spawns the session
/// watcher. Dropping the controller (or calling [`shutdown`]) stops the
/// watcher and any pending debounced search.
///
/// [`shutdown`]: RosterController::shutdown
pub struct RosterController {
    inner: Arc<Inner>,
    debouncer: SearchDebouncer,
    root: CancellationToken,
}

impl RosterController {
    pub fn new(parts: RosterParts) -> Self {
        let (state, _) = watch::channel(RosterState::empty(parts.page_size));
        let inner = Arc::new(Inner {
            query: parts.query,
            mutations: parts.mutations,
            birthdays: parts.birthdays,
            auth: parts.auth,
            clock: parts.clock,
            page_size: parts.page_size,
            state,
            query_seq: AtomicU64::new(0),
            birthday_seq: AtomicU64::new(0),
        });

        let root = CancellationToken::new();
        spawn_session_watcher(inner.clone(), root.clone());

        Self {
            inner,
            debouncer: SearchDebouncer::new(parts.search_debounce, root.clone()),
            root,
        }
    }

    /// Controller over the wall clock in the configured time zone
    pub fn from_config(
        config: &Config,
        rows: Arc<dyn RowStore>,
        blobs: Arc<dyn BlobStore>,
        auth: Arc<AuthContext>,
    ) -> Self {
        let clock = Arc::new(SystemClock { tz: config.tz() });
        Self::new(RosterParts::from_config(config, rows, blobs, auth, clock))
    }

    // ========== Queries ==========

    /// New search term; always starts at page 1
    pub async fn search(&self, term: &str) -> AppResult<LoadOutcome> {
        self.inner.load(term.trim().to_string(), 1).await
    }

    /// Debounced [`search`](Self::search) for keystroke input
    pub fn search_debounced(&self, term: &str) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let term = term.trim().to_string();
        self.debouncer.schedule(async move {
            if let Err(e) = inner.load(term, 1).await {
                tracing::warn!(error = %e, "Debounced search failed");
            }
        })
    }

    /// Go to page `n`, clamped into `[1, total_pages]`
    pub async fn change_page(&self, n: u32) -> AppResult<LoadOutcome> {
        let (term, page) = {
            let state = self.inner.state.borrow();
            (state.page.search_term.clone(), state.page.clamp_page(n))
        };
        self.inner.load(term, page).await
    }

    /// Re-run the current query
    pub async fn refresh(&self) -> AppResult<LoadOutcome> {
        self.inner.refresh().await
    }

    // ========== Mutations ==========

    /// Create a member, then reload the roster
    pub async fn create(&self, data: MemberCreate, photo: Option<PhotoUpload>) -> AppResult<Member> {
        let member = self.inner.mutations.create(data, photo).await?;
        if let Err(e) = self.inner.refresh().await {
            tracing::warn!(error = %e, "Roster refresh after create failed");
        }
        Ok(member)
    }

    /// Update a member, then reload the roster
    pub async fn update(
        &self,
        id: &str,
        data: MemberUpdate,
        photo: Option<PhotoUpload>,
    ) -> AppResult<Member> {
        let result = self.inner.mutations.update(id, data, photo).await;
        // a stale id is corrected by re-reading as well
        let stale = matches!(&result, Err(e) if e.category() == ErrorCategory::NotFound);
        if result.is_ok() || stale {
            if let Err(e) = self.inner.refresh().await {
                tracing::warn!(error = %e, "Roster refresh after update failed");
            }
        }
        result
    }

    /// Delete a member with optimistic removal from the current page
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.inner.delete(id).await
    }

    // ========== State ==========

    pub fn snapshot(&self) -> RosterState {
        self.inner.state.borrow().clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<RosterState> {
        self.inner.state.subscribe()
    }

    /// Whether an update/delete of `id` is in flight
    pub fn is_busy(&self, id: &str) -> bool {
        self.inner.mutations.is_busy(id)
    }

    pub fn session(&self) -> Session {
        self.inner.auth.current()
    }

    /// Stop the session watcher and drop any pending debounced search
    pub fn shutdown(&self) {
        self.debouncer.cancel();
        self.root.cancel();
    }
}

impl Drop for RosterController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Clear the roster whenever the session ends
fn spawn_session_watcher(inner: Arc<Inner>, shutdown: CancellationToken) {
    let mut sessions = inner.auth.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let signed_in = sessions.borrow_and_update().is_authenticated();
                    if !signed_in {
                        tracing::info!("Session ended, clearing roster");
                        inner.clear();
                    }
                }
            }
        }
        tracing::debug!("Session watcher stopped");
    });
}
