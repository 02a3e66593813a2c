//! # Periodic job abstraction and function-backed implementation.
//!
//! A [`Job`] is invoked repeatedly by the [`Scheduler`](crate::Scheduler). Each
//! invocation receives the job's [`CancellationToken`]; parameters the job needs
//! are captured at construction time.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use workvisor::{JobFn, JobRef};
//!
//! let batch_size = 7;
//! let job: JobRef = JobFn::arc("refresh", move |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return;
//!     }
//!     let _ = batch_size;
//! });
//! assert_eq!(job.name(), "refresh");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// # Shared handle to a job object.
pub type JobRef = Arc<dyn Job>;

/// # Recurring asynchronous job.
///
/// Invocations of one job never overlap: its control loop awaits each run before
/// reacting to the next tick or trigger.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Returns a stable, human-readable job name (for logs and events).
    fn name(&self) -> &str;

    /// Runs one invocation.
    ///
    /// `ctx` is cancelled when the job is removed or the scheduler stops; a run in
    /// progress is not interrupted, so long invocations should check it.
    async fn run(&self, ctx: CancellationToken);
}

/// Function-backed job.
///
/// Wraps a closure that *creates* a new future per invocation.
pub struct JobFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> JobFn<F> {
    /// Creates a new function-backed job.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the job and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Job for JobFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) {
        (self.f)(ctx).await
    }
}
