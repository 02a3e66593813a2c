//! # Units of work.
//!
//! - [`Work`] - trait for a one-shot async unit executed by a pool worker
//! - [`WorkFn`] - closure-backed implementation
//! - [`BoxWork`] - boxed trait object as queued by the pool

mod work;
mod work_fn;

pub use work::{BoxWork, Work};
pub use work_fn::WorkFn;
