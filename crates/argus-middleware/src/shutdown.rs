//! [`Shutdown`] – cooperative-cancellation token.
//!
//! One token is created at process start and a clone is injected into every
//! component at construction. Loops poll [`Shutdown::is_cancelled`] at their
//! iteration checkpoint; async code races pending waits against
//! [`Shutdown::cancelled`] so a shutdown in progress resolves them promptly
//! instead of after a full timeout.

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Write-once (false→true), process-wide cancellation signal.
///
/// Clones are cheap and observe the same state. Cancellation is cooperative:
/// components finish their current step and exit at the next checkpoint; no
/// execution context is ever interrupted mid-capture or mid-write.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent: the transition happens at most once and
    /// repeated calls are no-ops.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("shutdown requested");
        }
        self.token.cancel();
    }

    /// Synchronous checkpoint used by the detector thread and at the top of
    /// each bridge-loop iteration.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once shutdown has been requested. Completes immediately when
    /// the token is already cancelled, so it is safe to race in a `select!`
    /// arm on every iteration.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
