//! # Function-backed unit of work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: FnOnce() -> Fut`. The closure is called once,
//! when a worker picks the unit up, so it may move owned state into the future.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use workvisor::WorkFn;
//!
//! let done = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&done);
//! let _unit = WorkFn::new(move || async move {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//! ```

use std::future::Future;

use async_trait::async_trait;

use crate::work::work::Work;

/// Function-backed unit of work.
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Wraps a closure producing the unit's future.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Work for WorkFn<F>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(self: Box<Self>) {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::BoxWork;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_runs_closure_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let unit = Box::new(WorkFn::new(move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        unit.run().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_boxed_dyn_work_runs_inner() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let inner: BoxWork = Box::new(WorkFn::new(move || async move {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        Box::new(inner).run().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
