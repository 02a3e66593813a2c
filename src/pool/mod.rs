//! Worker pool: bounded queue, immediate submission and a fixed set of workers.
//!
//! The only public types from this module are [`Pool`], [`PoolConfig`] and
//! [`Stopper`].
//!
//! Internal modules:
//! - [`dispatcher`]: the pool and its dispatch loop (admission + matching + shutdown);
//! - [`registry`]: owns workers, the ready channel and the done signal;
//! - [`worker`]: one announce/receive/process loop per worker;
//! - [`stopper`]: signal/wait/reply shutdown handshake;
//! - [`config`]: pool settings and their sentinel values.

mod config;
mod dispatcher;
mod registry;
mod stopper;
mod worker;

pub use config::{PoolConfig, DEFAULT_QUEUE_CAPACITY};
pub use dispatcher::{Pool, DEFAULT_ENQUEUE_TIMEOUT};
pub use stopper::Stopper;
