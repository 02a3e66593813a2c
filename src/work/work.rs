//! # Unit of work executed by the pool.
//!
//! A [`Work`] value is created by the caller, handed to the [`Pool`](crate::Pool),
//! run exactly once by whichever worker receives it, then dropped.
//!
//! It carries no identity and returns nothing. The only failure channel is a
//! panic, which the worker recovers and logs; the worker then moves on to the
//! next unit.

use async_trait::async_trait;

/// # Boxed unit of work as stored in the pool's queues.
pub type BoxWork = Box<dyn Work>;

/// # Asynchronous unit of work.
///
/// Everything the unit needs must be captured when it is constructed; the pool
/// passes nothing in and reads nothing out.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use workvisor::Work;
///
/// struct Resize {
///     image: String,
/// }
///
/// #[async_trait]
/// impl Work for Resize {
///     async fn run(self: Box<Self>) {
///         // resize `self.image`...
///         let _ = self.image;
///     }
/// }
/// ```
#[async_trait]
pub trait Work: Send + 'static {
    /// Executes the unit to completion.
    async fn run(self: Box<Self>);
}

#[async_trait]
impl Work for BoxWork {
    async fn run(self: Box<Self>) {
        <dyn Work as Work>::run(*self).await
    }
}
