//! # Worker registry: owns workers, the ready channel and the done signal.
//!
//! ## Architecture
//! ```text
//!                 ┌──────────────────── WorkerRegistry ────────────────────┐
//!                 │                                                        │
//!  Worker 1 ──announce(slot)──►  ready channel (cap = max_workers)  ──work()──► dispatch loop
//!  Worker 2 ──announce(slot)──►                                            │
//!  Worker N ──announce(slot)──►                                            │
//!                 │                                                        │
//!                 │  done: CancellationToken ──► every worker (broadcast)   │
//!                 │  running: JoinSet<()>    ──► outstanding workers        │
//!                 └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - `add()` only before `start()`; workers added later are never spawned.
//! - The ready channel never holds more slots than there are idle workers.
//! - `stop()` cancels `done` once and returns after every worker loop exited.

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error};

use crate::events::Bus;
use crate::pool::worker::{Slot, Worker};

/// The part of the registry a worker needs: where to announce readiness and
/// which signal means shutdown.
#[derive(Clone)]
pub(crate) struct RegistryLink {
    ready: mpsc::Sender<Slot>,
    done: CancellationToken,
    bus: Bus,
}

impl RegistryLink {
    /// Announces the worker as idle. Returns `false` if nobody dispatches anymore.
    pub async fn announce(&self, slot: Slot) -> bool {
        self.ready.send(slot).await.is_ok()
    }

    /// Resolves once the registry is stopping.
    pub fn done(&self) -> WaitForCancellationFuture<'_> {
        self.done.cancelled()
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}

/// Owns the pool's workers and tracks the running ones.
pub(crate) struct WorkerRegistry {
    ready_tx: mpsc::Sender<Slot>,
    ready_rx: mpsc::Receiver<Slot>,
    workers: Vec<Worker>,
    done: CancellationToken,
    running: JoinSet<()>,
    bus: Bus,
}

impl WorkerRegistry {
    /// Creates an empty registry sized for `max_workers` ready announcements.
    pub fn new(max_workers: usize, bus: Bus) -> Self {
        let (ready_tx, ready_rx) = mpsc::channel(max_workers.max(1));
        Self {
            ready_tx,
            ready_rx,
            workers: Vec::with_capacity(max_workers),
            done: CancellationToken::new(),
            running: JoinSet::new(),
            bus,
        }
    }

    /// Returns a link for a worker to be created.
    pub fn link(&self) -> RegistryLink {
        RegistryLink {
            ready: self.ready_tx.clone(),
            done: self.done.clone(),
            bus: self.bus.clone(),
        }
    }

    /// Registers a worker. Must be called before [`start`](Self::start).
    pub fn add(&mut self, worker: Worker) {
        self.workers.push(worker);
    }

    /// Number of registered (not yet started) plus running workers.
    pub fn len(&self) -> usize {
        self.workers.len() + self.running.len()
    }

    /// Spawns every registered worker loop.
    pub fn start(&mut self) {
        for worker in self.workers.drain(..) {
            debug!(worker = worker.id(), "spawning worker");
            self.running.spawn(worker.run());
        }
    }

    /// Receive side of the ready channel: one slot per idle worker.
    pub fn work(&mut self) -> &mut mpsc::Receiver<Slot> {
        &mut self.ready_rx
    }

    /// Broadcasts shutdown and waits for every worker to exit.
    pub async fn stop(&mut self) {
        self.done.cancel();
        while let Some(res) = self.running.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "worker task ended abnormally");
            }
        }
    }
}
