//! Cancellation scope for handler invocations.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::EngineError;

/// Cancellation state shared between the engine and a handler's context.
///
/// A scope carries a hard deadline set at invocation time and may
/// additionally be cancelled manually with a cause. Context methods check
/// [`err`](CancelScope::err) before every side effect, so handlers that
/// route I/O through the context observe cancellation at every I/O
/// boundary.
#[derive(Clone)]
pub struct CancelScope {
    deadline: Instant,
    cancel_cause: Arc<OnceLock<String>>,
    notify: Arc<Notify>,
}

impl CancelScope {
    /// A scope whose deadline is `duration` from now.
    pub fn with_timeout(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            cancel_cause: Arc::new(OnceLock::new()),
            notify: Arc::new(Notify::new()),
        }
    }

    /// The absolute deadline of this scope.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Cancel the scope with a cause. The first cause wins; later calls
    /// are ignored.
    pub fn cancel(&self, cause: impl Into<String>) {
        let _ = self.cancel_cause.set(cause.into());
        self.notify.notify_waiters();
    }

    /// The scope's current error, if any.
    ///
    /// Manual cancellation takes precedence over the deadline.
    pub fn err(&self) -> Option<EngineError> {
        if let Some(cause) = self.cancel_cause.get() {
            return Some(EngineError::Cancelled(cause.clone()));
        }
        if Instant::now() >= self.deadline {
            return Some(EngineError::DeadlineExceeded);
        }
        None
    }

    /// Wait until the scope is manually cancelled, returning the cause.
    ///
    /// Does not resolve on deadline expiry; the engine races the deadline
    /// separately.
    pub async fn cancelled(&self) -> String {
        loop {
            let notified = self.notify.notified();
            if let Some(cause) = self.cancel_cause.get() {
                return cause.clone();
            }
            notified.await;
        }
    }
}
