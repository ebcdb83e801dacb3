//! Search debouncing
//!
//! Each call supersedes the pending one; the work runs only after the
//! quiescence interval passes without a newer call. Cancelling the parent
//! token drops whatever is pending.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct SearchDebouncer {
    delay: Duration,
    root: CancellationToken,
    pending: Mutex<Option<CancellationToken>>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration, root: CancellationToken) -> Self {
        Self {
            delay,
            root,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `work` after the interval unless superseded or cancelled
    pub fn schedule<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.root.child_token();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!("Debounced search dropped");
                }
                _ = tokio::time::sleep(delay) => {
                    work.await;
                }
            }
        })
    }

    /// Drop the pending call, if any
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_collapse_into_last() {
        let debouncer = SearchDebouncer::new(Duration::from_millis(400), CancellationToken::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(parking_lot::Mutex::new(String::new()));

        let mut handles = Vec::new();
        for term in ["a", "an", "ani"] {
            let runs = runs.clone();
            let last = last.clone();
            handles.push(debouncer.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
                *last.lock() = term.to_string();
            }));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(*last.lock(), "ani");
    }

    #[tokio::test(start_paused = true)]
    async fn test_root_cancel_drops_pending() {
        let root = CancellationToken::new();
        let debouncer = SearchDebouncer::new(Duration::from_millis(400), root.clone());
        let runs = Arc::new(AtomicUsize::new(0));

        let r = runs.clone();
        let handle = debouncer.schedule(async move {
            r.fetch_add(1, Ordering::SeqCst);
        });
        root.cancel();
        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
