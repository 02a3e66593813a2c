//! # Worker: one long-lived execution loop.
//!
//! ## Lifecycle
//! ```text
//! Idle ──announce──► Ready ──unit──► Busy ──► Idle ──► ... ──► Stopped
//!                      │
//!                      └──done──► Stopped
//! ```
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► create a fresh one-shot slot
//!   ├─► announce(slot) on the registry's ready channel
//!   └─► select (unit first):
//!         ├─ unit received  ─► process(unit) ─► continue
//!         ├─ slot dropped   ─► exit (dispatcher gave the reservation back)
//!         └─ done signalled ─► exit
//! }
//! ```
//!
//! ## Rules
//! - At most one unit is in flight per worker; readiness is re-announced only after
//!   the previous unit finished.
//! - A unit handed over before shutdown is always run: the slot is polled before the
//!   done signal.
//! - A panicking unit never ends the loop.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::events::{Event, EventKind};
use crate::panic::{self, Caught};
use crate::pool::registry::RegistryLink;
use crate::work::BoxWork;

/// Personal rendezvous for one idle period: the dispatcher sends exactly one unit.
pub(crate) type Slot = oneshot::Sender<BoxWork>;

/// A single pool worker.
pub(crate) struct Worker {
    id: usize,
    link: RegistryLink,
}

impl Worker {
    /// Creates a worker bound to its registry.
    pub fn new(id: usize, link: RegistryLink) -> Self {
        Self { id, link }
    }

    /// Worker id (1-based).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Runs the announce/receive loop until shutdown.
    pub async fn run(self) {
        self.link
            .bus()
            .publish(Event::new(EventKind::WorkerStarted).with_worker(self.id));
        debug!(worker = self.id, "worker started");

        loop {
            let (slot, mut inbox) = oneshot::channel::<BoxWork>();
            if !self.link.announce(slot).await {
                break;
            }

            tokio::select! {
                biased;
                received = &mut inbox => match received {
                    Ok(work) => self.process(work).await,
                    Err(_) => break,
                },
                _ = self.link.done() => break,
            }
        }

        debug!(worker = self.id, "worker stopped");
        self.link
            .bus()
            .publish(Event::new(EventKind::WorkerStopped).with_worker(self.id));
    }

    /// Runs one unit, containing any panic.
    pub async fn process(&self, work: BoxWork) {
        panic::install_hook();
        let guarded = AssertUnwindSafe(async move { work.run().await });
        if let Err(payload) = guarded.catch_unwind().await {
            let caught = Caught::new(payload.as_ref());
            error!(
                worker = self.id,
                panic = %caught.message,
                stack = %caught.stack,
                "work unit panicked"
            );
            self.link.bus().publish(
                Event::new(EventKind::WorkPanicked)
                    .with_worker(self.id)
                    .with_reason(caught.message),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;
    use crate::pool::registry::WorkerRegistry;
    use crate::work::{Work, WorkFn};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Panics while building its future, before anything is polled.
    struct EagerPanic;

    impl Work for EagerPanic {
        fn run<'async_trait>(
            self: Box<Self>,
        ) -> Pin<Box<dyn Future<Output = ()> + Send + 'async_trait>>
        where
            Self: 'async_trait,
        {
            panic!("eager")
        }
    }

    #[tokio::test]
    async fn test_process_contains_panic() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let registry = WorkerRegistry::new(1, bus);
        let worker = Worker::new(1, registry.link());

        worker
            .process(Box::new(WorkFn::new(|| async { panic!("boom") })))
            .await;

        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::WorkPanicked);
        assert_eq!(ev.worker, Some(1));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_process_runs_unit() {
        let registry = WorkerRegistry::new(1, Bus::new(4));
        let worker = Worker::new(7, registry.link());
        assert_eq!(worker.id(), 7);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        worker
            .process(Box::new(WorkFn::new(move || async move {
                h.fetch_add(1, Ordering::SeqCst);
            })))
            .await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_process_contains_panic_before_first_poll() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let registry = WorkerRegistry::new(1, bus);
        let worker = Worker::new(2, registry.link());

        worker.process(Box::new(EagerPanic)).await;

        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::WorkPanicked);
        assert_eq!(ev.worker, Some(2));
        assert_eq!(ev.reason.as_deref(), Some("eager"));
    }
}
