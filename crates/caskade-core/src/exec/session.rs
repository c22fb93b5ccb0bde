//! Session state shared between a run and whoever controls it.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Shared handle for one install run.
///
/// Owned by whichever component starts the run and passed into the
/// executor; separate sessions never interfere, so tests can each hold
/// their own.
#[derive(Debug, Clone, Default)]
pub struct InstallSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug, Default)]
struct SessionInner {
    running: AtomicBool,
    current_pid: Mutex<Option<u32>>,
    token: CancellationToken,
}

impl InstallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Pid of the child currently being supervised, if any. At most one
    /// under the sequential policy.
    pub fn current_pid(&self) -> Option<u32> {
        *self.inner.current_pid.lock().unwrap()
    }

    /// Request cancellation. The executor observes this at its next
    /// boundary; a live child is sent SIGTERM and, after the grace period,
    /// SIGKILL.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    /// Resolves once `cancel` has been called.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.inner.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn set_current_pid(&self, pid: Option<u32>) {
        *self.inner.current_pid.lock().unwrap() = pid;
    }
}
