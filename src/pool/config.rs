//! # Pool configuration.
//!
//! Provides [`PoolConfig`] centralized settings for a [`Pool`](crate::Pool).
//!
//! ## Sentinel values
//! - `job_queue_capacity = 0` → 100 (see [`DEFAULT_QUEUE_CAPACITY`])
//! - `bus_capacity = 0` → 1 (a broadcast channel needs at least one slot)
//! - `max_workers = 0` is accepted but yields a pool that never dispatches

use std::num::NonZeroUsize;
use std::thread;

/// Bounded queue capacity used when `job_queue_capacity` is left at `0`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Configuration for a worker pool.
///
/// ## Field semantics
/// - `max_workers`: number of workers created and started
/// - `job_queue_capacity`: capacity of the bounded queue used by `enqueue*` (`0` = 100)
/// - `bus_capacity`: event bus ring buffer size (min 1)
///
/// # Example
/// ```
/// use workvisor::PoolConfig;
///
/// let cfg = PoolConfig::default()
///     .with_max_workers(4)
///     .with_job_queue_capacity(0);
///
/// assert_eq!(cfg.max_workers, 4);
/// assert_eq!(cfg.queue_capacity_clamped(), 100);
/// ```
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    ///
    /// Callers must supply at least 1; with `0` every dispatch waits forever.
    pub max_workers: usize,

    /// Capacity of the bounded job queue.
    pub job_queue_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl PoolConfig {
    /// Sets the number of workers.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the bounded queue capacity (`0` falls back to the default).
    pub fn with_job_queue_capacity(mut self, capacity: usize) -> Self {
        self.job_queue_capacity = capacity;
        self
    }

    /// Returns the effective queue capacity.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        if self.job_queue_capacity == 0 {
            DEFAULT_QUEUE_CAPACITY
        } else {
            self.job_queue_capacity
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `max_workers` = available parallelism (1 if unknown)
    /// - `job_queue_capacity = 100`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            job_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            bus_capacity: 1024,
        }
    }
}
