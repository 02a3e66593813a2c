//! Error types used by the pool and the scheduler.
//!
//! This module defines two error enums:
//!
//! - [`SubmitError`]: returned by [`Pool::submit`](crate::Pool::submit) when a unit
//!   could not be handed to a worker.
//! - [`ScheduleError`]: returned by [`ScheduleHandle`](crate::ScheduleHandle)
//!   operations when the scheduled job can no longer be reached.
//!
//! Admission failures of `enqueue`/`enqueue_with_timeout` are **not** errors: they
//! are reported as `false`. Panics inside work units or jobs are contained at the
//! worker / job-loop boundary and never surface here.

use thiserror::Error;

/// # Errors produced by blocking submission.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The pool was never started, or it stopped before a worker accepted the unit.
    #[error("pool is closed")]
    Closed,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workvisor::SubmitError;
    ///
    /// assert_eq!(SubmitError::Closed.as_label(), "submit_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Closed => "submit_closed",
        }
    }
}

/// # Errors produced by scheduled-job handles.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// The job's control loop has exited (cancelled or scheduler stopped).
    #[error("scheduled job is closed")]
    Closed,

    /// A trigger is already pending for this job.
    #[error("trigger already pending")]
    Full,
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::Closed => "schedule_closed",
            ScheduleError::Full => "schedule_trigger_pending",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(SubmitError::Closed.as_label(), "submit_closed");
        assert_eq!(ScheduleError::Closed.as_label(), "schedule_closed");
        assert_eq!(ScheduleError::Full.as_label(), "schedule_trigger_pending");
    }

    #[test]
    fn test_display() {
        assert_eq!(SubmitError::Closed.to_string(), "pool is closed");
        assert_eq!(ScheduleError::Full.to_string(), "trigger already pending");
    }
}
