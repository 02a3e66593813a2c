//! # Runtime events emitted by the pool and the scheduler.
//!
//! The [`EventKind`] enum classifies event types across two sources:
//! - **Pool events**: worker lifecycle, admission rejections, contained panics, shutdown
//! - **Scheduler events**: job registration, activation changes, triggers, contained panics
//!
//! The [`Event`] struct carries optional metadata: worker id, job name and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are observed out of order.
//!
//! ## Example
//! ```rust
//! use workvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkPanicked)
//!     .with_worker(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::WorkPanicked);
//! assert_eq!(ev.worker, Some(3));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Pool events ===
    /// Dispatch loop started.
    PoolStarted,

    /// Dispatch loop finished shutdown (all workers drained).
    PoolStopped,

    /// Worker loop started.
    ///
    /// Sets:
    /// - `worker`: worker id
    WorkerStarted,

    /// Worker loop exited.
    ///
    /// Sets:
    /// - `worker`: worker id
    WorkerStopped,

    /// A unit was refused by `enqueue`/`enqueue_with_timeout`.
    ///
    /// Sets:
    /// - `reason`: `"queue_full"`, `"enqueue_timeout"` or `"closed"`
    WorkRejected,

    /// A unit panicked while running; the worker recovered.
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `reason`: panic message
    WorkPanicked,

    /// Queued units were discarded during shutdown.
    ///
    /// Sets:
    /// - `reason`: `"dropped=<n>"`
    WorkDropped,

    // === Scheduler events ===
    /// Job registered and its control loop spawned.
    ///
    /// Sets:
    /// - `job`: job name
    JobAdded,

    /// Job was executed (tick or trigger) with the activation flag set.
    ///
    /// Sets:
    /// - `job`: job name
    JobStarted,

    /// Job was due but the activation flag was off.
    ///
    /// Sets:
    /// - `job`: job name
    JobSkipped,

    /// Job received a manual trigger.
    ///
    /// Sets:
    /// - `job`: job name
    JobTriggered,

    /// Activation flag switched on.
    JobActivated,

    /// Activation flag switched off.
    JobDeactivated,

    /// Job panicked; the control loop recovered.
    ///
    /// Sets:
    /// - `job`: job name
    /// - `reason`: panic message
    JobPanicked,

    /// Control loop observed cancellation and exited.
    ///
    /// Sets:
    /// - `job`: job name
    JobCancelled,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Worker id (1-based), if applicable.
    pub worker: Option<usize>,
    /// Name of the scheduled job, if applicable.
    pub job: Option<Arc<str>>,
    /// Human-readable reason (panic message, rejection cause, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            job: None,
            reason: None,
        }
    }

    /// Attaches a worker id.
    #[inline]
    pub fn with_worker(mut self, id: usize) -> Self {
        self.worker = Some(id);
        self
    }

    /// Attaches a job name.
    #[inline]
    pub fn with_job(mut self, job: impl Into<Arc<str>>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, EventKind::WorkPanicked | EventKind::JobPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::PoolStarted);
        let b = Event::new(EventKind::PoolStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_is_panic() {
        assert!(Event::new(EventKind::WorkPanicked).is_panic());
        assert!(Event::new(EventKind::JobPanicked).is_panic());
        assert!(!Event::new(EventKind::JobSkipped).is_panic());
    }
}
