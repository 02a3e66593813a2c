//! # Scheduled-job process: one control loop per job.
//!
//! ## State machine
//! ```text
//! Running(active) ──activation(bool)──► Running(bool)
//! Running(active) ──tick / trigger───► run_guarded(active) ──► Running(active)
//! Running(active) ──cancelled────────► Cancelled (loop exits)
//! ```
//!
//! ## Loop
//! ```text
//! ticker = interval(period)            (first tick completes immediately)
//! loop select {
//!   activation(bool) ─► active = bool                         (no run)
//!   tick             ─► run_guarded(active)
//!   trigger          ─► run_guarded(active) ─► wait next tick, discard it
//!   cancelled        ─► exit
//! }
//! ```
//!
//! ## Rules
//! - `active` is owned by the loop; it is only changed through the activation channel.
//! - A manual trigger consumes the tick slot of its period, so a trigger followed by a
//!   naturally due tick does not run the job twice.
//! - Cancellation is observed between iterations; a run in progress is not interrupted.
//! - Missed ticks are skipped, never bursted.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::events::{Bus, Event, EventKind};
use crate::panic::{self, Caught};
use crate::scheduler::job::{Job, JobRef};

/// Runs `job` once if `active`, containing any panic.
pub(crate) async fn run_guarded(job: &dyn Job, ctx: &CancellationToken, active: bool, bus: &Bus) {
    if !active {
        trace!(job = job.name(), "job inactive, skipping");
        bus.publish(Event::new(EventKind::JobSkipped).with_job(job.name()));
        return;
    }

    bus.publish(Event::new(EventKind::JobStarted).with_job(job.name()));
    panic::install_hook();
    let guarded = AssertUnwindSafe(async { job.run(ctx.clone()).await });
    if let Err(payload) = guarded.catch_unwind().await {
        let caught = Caught::new(payload.as_ref());
        error!(
            job = job.name(),
            panic = %caught.message,
            stack = %caught.stack,
            "scheduled job panicked"
        );
        bus.publish(
            Event::new(EventKind::JobPanicked)
                .with_job(job.name())
                .with_reason(caught.message),
        );
    }
}

/// Everything one job's control loop owns.
pub(crate) struct JobProcess {
    pub job: JobRef,
    pub name: Arc<str>,
    pub interval: Duration,
    pub trigger: mpsc::Receiver<()>,
    pub activation: mpsc::Receiver<bool>,
    pub token: CancellationToken,
    pub active: bool,
    pub bus: Bus,
}

impl JobProcess {
    /// Drives the job until its token is cancelled.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut triggers_open = true;
        let mut activation_open = true;

        debug!(job = %self.name, interval = ?self.interval, active = self.active, "job loop started");

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                update = self.activation.recv(), if activation_open => match update {
                    Some(active) => self.set_active(active),
                    None => activation_open = false,
                },
                _ = ticker.tick() => {
                    run_guarded(self.job.as_ref(), &self.token, self.active, &self.bus).await;
                }
                fired = self.trigger.recv(), if triggers_open => match fired {
                    Some(()) => {
                        self.bus.publish(Event::new(EventKind::JobTriggered).with_job(Arc::clone(&self.name)));
                        run_guarded(self.job.as_ref(), &self.token, self.active, &self.bus).await;

                        tokio::select! {
                            _ = ticker.tick() => {}
                            _ = self.token.cancelled() => break,
                        }
                    }
                    None => triggers_open = false,
                },
            }
        }

        debug!(job = %self.name, "job loop cancelled");
        self.bus
            .publish(Event::new(EventKind::JobCancelled).with_job(self.name));
    }

    fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        let kind = if active {
            EventKind::JobActivated
        } else {
            EventKind::JobDeactivated
        };
        debug!(job = %self.name, active, "job activation changed");
        self.bus
            .publish(Event::new(kind).with_job(Arc::clone(&self.name)));
    }
}
