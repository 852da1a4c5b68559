//! Job cancellation token.

use crate::utils::{now_utc, Timestamp};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Listener invoked with the cancellation reason.
pub type CancelListener = Box<dyn Fn(&str) + Send + Sync>;

/// A recorded cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    /// Why the job should stop.
    pub reason: String,
    /// When the request was made.
    pub requested_at: Timestamp,
}

#[derive(Default)]
struct Shared {
    request: RwLock<Option<CancelRequest>>,
    listeners: RwLock<Vec<CancelListener>>,
    wake: Notify,
}

/// A cloneable stop signal for one job.
///
/// Every clone sees the same request. Only the first request is recorded;
/// later ones are ignored.
#[derive(Clone, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationToken {
    /// Creates a token with no request recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the job stop at its next stage boundary.
    ///
    /// Returns false if a request was already recorded. Listeners run on
    /// the calling thread; a panicking listener is logged and skipped.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        {
            let mut request = self.shared.request.write();
            if request.is_some() {
                return false;
            }
            *request = Some(CancelRequest {
                reason: reason.clone(),
                requested_at: now_utc(),
            });
        }
        debug!(reason = %reason, "Cancellation requested");
        self.shared.wake.notify_waiters();

        for listener in self.shared.listeners.read().iter() {
            notify_listener(listener.as_ref(), &reason);
        }
        true
    }

    /// Registers a listener for the cancellation reason.
    ///
    /// Runs immediately if the token is already cancelled.
    pub fn on_cancel<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        if let Some(reason) = self.reason() {
            notify_listener(&listener, &reason);
            return;
        }
        let mut listeners = self.shared.listeners.write();
        // A cancel may have landed between the check and the lock.
        if let Some(reason) = self.reason() {
            drop(listeners);
            notify_listener(&listener, &reason);
        } else {
            listeners.push(Box::new(listener));
        }
    }

    /// Returns true once a request has been recorded.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.request.read().is_some()
    }

    /// Returns the recorded reason.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.shared.request.read().as_ref().map(|r| r.reason.clone())
    }

    /// Returns the full recorded request.
    #[must_use]
    pub fn request(&self) -> Option<CancelRequest> {
        self.shared.request.read().clone()
    }

    /// Resolves once a request has been recorded.
    ///
    /// Long-running handlers can `select!` on this to give up early.
    pub async fn cancelled(&self) {
        loop {
            let woken = self.shared.wake.notified();
            if self.is_cancelled() {
                return;
            }
            woken.await;
        }
    }
}

fn notify_listener(listener: &(dyn Fn(&str) + Send + Sync), reason: &str) {
    if catch_unwind(AssertUnwindSafe(|| listener(reason))).is_err() {
        warn!(reason, "Cancellation listener panicked");
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("request", &self.request())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[test]
    fn test_fresh_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.request().is_none());
    }

    #[test]
    fn test_first_request_wins_across_clones() {
        let token = CancellationToken::new();
        let remote = token.clone();

        assert!(remote.cancel("user removed the file"));
        assert!(!token.cancel("dashboard reset"));
        assert!(token.is_cancelled());
        assert_eq!(token.reason().as_deref(), Some("user removed the file"));
    }

    #[test]
    fn test_listener_gets_reason_once() {
        let token = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        token.on_cancel(move |reason| sink.lock().push(reason.to_string()));

        token.cancel("closed tab");
        token.cancel("closed again");
        assert_eq!(*seen.lock(), vec!["closed tab".to_string()]);
    }

    #[test]
    fn test_late_listener_runs_immediately() {
        let token = CancellationToken::new();
        token.cancel("timeout");

        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        token.on_cancel(move |reason| *sink.lock() = Some(reason.to_string()));
        assert_eq!(seen.lock().as_deref(), Some("timeout"));
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let token = CancellationToken::new();
        let seen = Arc::new(Mutex::new(0));
        let sink = seen.clone();
        token.on_cancel(|_| panic!("listener bug"));
        token.on_cancel(move |_| *sink.lock() += 1);

        assert!(token.cancel("stop"));
        assert_eq!(*seen.lock(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel("stop");

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_cancelled_resolves_when_already_set() {
        let token = CancellationToken::new();
        token.cancel("done");
        tokio_test::block_on(token.cancelled());
    }
}
