//! Deferred question completion
//!
//! A correct answer is graded at once, but the question only completes
//! after the feedback delay. [`PendingCompletion`] is the ticket for that
//! delayed step; the session ignores tickets it no longer holds, so a
//! late callback after a round change or teardown does nothing.
//!
//! [`spawn_deferred_completion`] drives the delay on tokio for callers that
//! share the session behind a mutex.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::LearnSession;

pub type SharedSession = Arc<Mutex<LearnSession>>;

/// Ticket returned by a correct answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCompletion {
    pub ticket: u64,
    pub delay: Duration,
}

/// Handle to a spawned completion task
#[derive(Debug)]
pub struct CompletionHandle {
    pending: PendingCompletion,
    task: JoinHandle<bool>,
}

impl CompletionHandle {
    pub fn pending(&self) -> PendingCompletion {
        self.pending
    }

    /// Abort the timer. The session keeps the pending ticket until it is
    /// cancelled there as well.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the timer. `true` when the question was completed.
    pub async fn join(self) -> bool {
        self.task.await.unwrap_or(false)
    }
}

/// Complete the question after `pending.delay`. Must be called inside a
/// tokio runtime. Only a weak reference to the session is kept.
pub fn spawn_deferred_completion(session: &SharedSession, pending: PendingCompletion) -> CompletionHandle {
    let weak: Weak<Mutex<LearnSession>> = Arc::downgrade(session);
    let task = tokio::spawn(async move {
        tokio::time::sleep(pending.delay).await;
        let Some(session) = weak.upgrade() else {
            debug!(ticket = pending.ticket, "session dropped before completion");
            return false;
        };
        let mut guard = session.lock();
        guard.complete_pending(pending)
    });
    CompletionHandle { pending, task }
}
