//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to observe
//! what the pool and the scheduler are doing.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Worker` loops, the pool dispatch loop, `Pool::enqueue*`,
//!   scheduled-job control loops.
//! - **Consumers**: anything holding a receiver from `Pool::subscribe()` or
//!   `Scheduler::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
