//! # Two-phase shutdown handshake.
//!
//! [`Stopper`] separates "stop was requested" from "stopping has finished":
//!
//! ```text
//!  requester                       worker loop
//!  ─────────                       ───────────
//!  signal() ─────────────────────► done() resolves
//!  wait() ... blocked                 │ cleanup
//!         ◄──────────────────────── reply()
//!  wait() returns
//! ```
//!
//! ## Rules
//! - `wait()` never returns before `reply()` ran.
//! - `signal()` and `reply()` may be called more than once; later calls are no-ops.
//! - Clones share state, so the requester and the loop each keep their own handle.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// One-shot signal/reply handshake.
#[derive(Clone, Debug, Default)]
pub struct Stopper {
    signal: CancellationToken,
    response: CancellationToken,
}

impl Stopper {
    /// Creates a fresh, unsignaled stopper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.
    pub fn signal(&self) {
        self.signal.cancel();
    }

    /// Resolves once [`signal`](Self::signal) has been called.
    pub fn done(&self) -> WaitForCancellationFuture<'_> {
        self.signal.cancelled()
    }

    /// Returns `true` if shutdown has been requested.
    pub fn is_signaled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Acknowledges that shutdown work is complete.
    pub fn reply(&self) {
        self.response.cancel();
    }

    /// Waits until [`reply`](Self::reply) has been called.
    pub async fn wait(&self) {
        self.response.cancelled().await
    }
}
