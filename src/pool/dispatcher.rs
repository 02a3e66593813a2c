//! # Pool: admission, matching and graceful shutdown.
//!
//! The [`Pool`] owns a bounded job queue, an immediate submission channel, a
//! [`WorkerRegistry`] and a [`Stopper`]. One dispatch loop matches incoming units
//! with idle workers.
//!
//! ## Admission modes
//! | Call                      | Blocks?                          | Result                      |
//! |---------------------------|----------------------------------|-----------------------------|
//! | [`Pool::submit`]          | until a worker accepted the unit | `Result<(), SubmitError>`   |
//! | [`Pool::enqueue`]         | never                            | `false` if the queue is full|
//! | [`Pool::enqueue_with_timeout`] | up to the timeout (0 → 1s)  | `false` on deadline         |
//!
//! ## Dispatch loop
//! ```text
//! loop {
//!   ├─► reserve an idle worker ◄── registry.work()      (or shutdown)
//!   ├─► select (no priority):
//!   │     ├─ immediate channel ─► hand unit to worker ─► ack the submitter
//!   │     ├─ bounded queue     ─► hand unit to worker
//!   │     └─ shutdown          ─► release reservation
//!   └─► repeat
//! }
//! on shutdown:
//!   registry.stop()  (workers finish the unit in hand, then exit)
//!   drain queue      (units never handed to a worker are dropped → WorkDropped)
//!   stopper.reply()
//! ```
//!
//! ## Rules
//! - While every worker is busy the loop waits for a ready worker; that is how a
//!   saturated pool pushes back on `submit` and on the queue.
//! - A worker is reserved **before** a unit is taken, so pending units stay in the
//!   bounded queue and its capacity is exact.
//! - FIFO holds within the queue and within the immediate channel, not across them.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use workvisor::{Pool, PoolConfig, WorkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut pool = Pool::new(PoolConfig::default().with_max_workers(2));
//!     pool.start();
//!
//!     let queued = pool.enqueue(WorkFn::new(|| async { println!("hello from a worker") }));
//!     assert!(queued);
//!
//!     pool.submit(WorkFn::new(|| async {})).await.unwrap();
//!     let _ = pool
//!         .enqueue_with_timeout(WorkFn::new(|| async {}), Duration::from_millis(100))
//!         .await;
//!
//!     pool.stop().await;
//! }
//! ```

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time;
use tracing::{debug, info, warn};

use crate::error::SubmitError;
use crate::events::{Bus, Event, EventKind};
use crate::pool::config::PoolConfig;
use crate::pool::registry::WorkerRegistry;
use crate::pool::stopper::Stopper;
use crate::pool::worker::Worker;
use crate::work::{BoxWork, Work};

/// Timeout used by [`Pool::enqueue_with_timeout`] when given `Duration::ZERO`.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// A unit sent through the immediate channel plus its acceptance ack.
struct Submission {
    work: BoxWork,
    accepted: oneshot::Sender<()>,
}

/// State moved into the dispatch loop on [`Pool::start`].
struct Dispatcher {
    registry: WorkerRegistry,
    immediate: mpsc::Receiver<Submission>,
    queue: mpsc::Receiver<BoxWork>,
    stopper: Stopper,
    bus: Bus,
}

impl Dispatcher {
    async fn run(mut self) {
        self.bus.publish(Event::new(EventKind::PoolStarted));
        info!(workers = self.registry.len(), "pool started");

        loop {
            let slot = tokio::select! {
                biased;
                _ = self.stopper.done() => break,
                slot = self.registry.work().recv() => match slot {
                    Some(slot) => slot,
                    None => break,
                },
            };

            tokio::select! {
                _ = self.stopper.done() => break,
                Some(sub) = self.immediate.recv() => {
                    if slot.send(sub.work).is_ok() {
                        let _ = sub.accepted.send(());
                    }
                }
                Some(work) = self.queue.recv() => {
                    if slot.send(work).is_err() {
                        warn!("worker went away before accepting a queued unit");
                    }
                }
                else => break,
            }
        }

        self.shutdown().await;
    }

    async fn shutdown(mut self) {
        debug!("pool stopping, draining workers");
        self.registry.stop().await;

        self.immediate.close();
        self.queue.close();
        let mut dropped = 0usize;
        while self.queue.try_recv().is_ok() {
            dropped += 1;
        }
        while self.immediate.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!(dropped, "discarded units that never reached a worker");
            self.bus.publish(
                Event::new(EventKind::WorkDropped).with_reason(format!("dropped={dropped}")),
            );
        }

        self.bus.publish(Event::new(EventKind::PoolStopped));
        info!("pool stopped");
        self.stopper.reply();
    }
}

/// Bounded worker pool.
///
/// Lifecycle: [`new`](Pool::new) → [`start`](Pool::start) → submit/enqueue →
/// [`stop`](Pool::stop). A stopped pool cannot be restarted.
pub struct Pool {
    immediate: mpsc::Sender<Submission>,
    queue: mpsc::Sender<BoxWork>,
    stopper: Stopper,
    bus: Bus,
    dispatcher: Option<Dispatcher>,
}

impl Pool {
    /// Creates a pool with its own event bus.
    pub fn new(cfg: PoolConfig) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::with_bus(cfg, bus)
    }

    /// Creates a pool publishing to an existing bus.
    pub fn with_bus(cfg: PoolConfig, bus: Bus) -> Self {
        let mut registry = WorkerRegistry::new(cfg.max_workers, bus.clone());
        for id in 1..=cfg.max_workers {
            let link = registry.link();
            registry.add(Worker::new(id, link));
        }

        let (immediate_tx, immediate_rx) = mpsc::channel(1);
        let (queue_tx, queue_rx) = mpsc::channel(cfg.queue_capacity_clamped());
        let stopper = Stopper::new();

        let dispatcher = Dispatcher {
            registry,
            immediate: immediate_rx,
            queue: queue_rx,
            stopper: stopper.clone(),
            bus: bus.clone(),
        };

        Self {
            immediate: immediate_tx,
            queue: queue_tx,
            stopper,
            bus,
            dispatcher: Some(dispatcher),
        }
    }

    /// Starts the workers and the dispatch loop.
    ///
    /// Must be called from within a tokio runtime. A second call is ignored.
    pub fn start(&mut self) {
        let Some(mut dispatcher) = self.dispatcher.take() else {
            warn!("pool already started");
            return;
        };
        dispatcher.registry.start();
        tokio::spawn(dispatcher.run());
    }

    /// Hands `work` to a worker, waiting as long as every worker is busy.
    ///
    /// Returns once a worker has **accepted** the unit, not once it has finished.
    /// Fails with [`SubmitError::Closed`] if the pool is not running.
    pub async fn submit<W: Work>(&self, work: W) -> Result<(), SubmitError> {
        if self.dispatcher.is_some() || self.stopper.is_signaled() {
            return Err(SubmitError::Closed);
        }
        let (accepted, ack) = oneshot::channel();
        let sub = Submission {
            work: Box::new(work),
            accepted,
        };
        self.immediate
            .send(sub)
            .await
            .map_err(|_| SubmitError::Closed)?;
        ack.await.map_err(|_| SubmitError::Closed)
    }

    /// Tries to place `work` in the bounded queue without waiting.
    ///
    /// Returns `false` immediately if the queue is full or the pool is stopped.
    pub fn enqueue<W: Work>(&self, work: W) -> bool {
        if self.stopper.is_signaled() {
            self.reject("closed");
            return false;
        }
        match self.queue.try_send(Box::new(work)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.reject("queue_full");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.reject("closed");
                false
            }
        }
    }

    /// Waits up to `timeout` for room in the bounded queue.
    ///
    /// `Duration::ZERO` means [`DEFAULT_ENQUEUE_TIMEOUT`].
    pub async fn enqueue_with_timeout<W: Work>(&self, work: W, timeout: Duration) -> bool {
        if self.stopper.is_signaled() {
            self.reject("closed");
            return false;
        }
        let timeout = if timeout.is_zero() {
            DEFAULT_ENQUEUE_TIMEOUT
        } else {
            timeout
        };

        let unit: BoxWork = Box::new(work);
        match time::timeout(timeout, self.queue.send(unit)).await {
            Ok(Ok(())) => true,
            Ok(Err(_closed)) => {
                self.reject("closed");
                false
            }
            Err(_elapsed) => {
                self.reject("enqueue_timeout");
                false
            }
        }
    }

    /// Stops the pool and waits until every worker finished its current unit.
    ///
    /// Units still waiting in the queue are dropped. Calling `stop` on a pool that
    /// was never started only marks it closed.
    pub async fn stop(&self) {
        self.stopper.signal();
        if self.dispatcher.is_some() {
            return;
        }
        self.stopper.wait().await;
    }

    /// Creates a receiver for this pool's events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The bus this pool publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    fn reject(&self, reason: &'static str) {
        debug!(reason, "unit rejected");
        self.bus
            .publish(Event::new(EventKind::WorkRejected).with_reason(reason));
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.stopper.signal();
    }
}
