//! Periodic job scheduling.
//!
//! Each job gets its own control loop reacting to ticks, manual triggers,
//! activation updates and cancellation. Public types: [`Scheduler`],
//! [`ScheduleHandle`], [`Job`], [`JobFn`] and [`JobRef`].

mod core;
mod handle;
mod job;
mod process;

pub use self::core::{Scheduler, MIN_INTERVAL};
pub use handle::ScheduleHandle;
pub use job::{Job, JobFn, JobRef};
