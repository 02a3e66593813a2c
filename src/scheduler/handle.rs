//! # Caller-side control of one scheduled job.
//!
//! Returned by [`Scheduler::add`](crate::Scheduler::add). It carries the two
//! control channels of the job's loop plus its cancellation token:
//!
//! ```text
//! ScheduleHandle ──trigger()────────► trigger channel    ──► run now, skip next tick
//!                ──set_active(bool)─► activation channel ──► replace active flag
//!                ──cancel()─────────► CancellationToken  ──► loop exits
//! ```
//!
//! Handles are cheap to clone. Dropping every handle does not stop the job.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ScheduleError;

/// Control handle for one scheduled job.
#[derive(Clone, Debug)]
pub struct ScheduleHandle {
    name: Arc<str>,
    trigger: mpsc::Sender<()>,
    activation: mpsc::Sender<bool>,
    token: CancellationToken,
}

impl ScheduleHandle {
    pub(crate) fn new(
        name: Arc<str>,
        trigger: mpsc::Sender<()>,
        activation: mpsc::Sender<bool>,
        token: CancellationToken,
    ) -> Self {
        Self {
            name,
            trigger,
            activation,
            token,
        }
    }

    /// Name of the job this handle controls.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requests one immediate run, waiting while a previous trigger is still pending.
    pub async fn trigger(&self) -> Result<(), ScheduleError> {
        self.trigger
            .send(())
            .await
            .map_err(|_| ScheduleError::Closed)
    }

    /// Requests one immediate run without waiting.
    pub fn try_trigger(&self) -> Result<(), ScheduleError> {
        self.trigger.try_send(()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ScheduleError::Full,
            mpsc::error::TrySendError::Closed(_) => ScheduleError::Closed,
        })
    }

    /// Switches the job on (`true`) or off (`false`) for future ticks and triggers.
    pub async fn set_active(&self, active: bool) -> Result<(), ScheduleError> {
        self.activation
            .send(active)
            .await
            .map_err(|_| ScheduleError::Closed)
    }

    /// Cancels this job only. The loop exits at its next iteration.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the job was cancelled (directly or via its parent).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
