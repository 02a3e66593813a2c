//! # workvisor
//!
//! **Workvisor** is a small in-process execution library for Rust.
//!
//! It provides two building blocks:
//! - a **worker pool** running one-shot units of work on a fixed number of
//!   workers, fed by a bounded queue or by blocking submission;
//! - a **periodic scheduler** running recurring jobs on their own interval,
//!   with manual triggers and an activation switch per job.
//!
//! The two are independent; a common setup lets scheduled jobs feed the pool.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producers ──submit()──────────────┐        ┌──enqueue()/enqueue_with_timeout()── producers
//!                                     ▼        ▼
//!                           immediate (rendezvous)   queue (bounded, job_queue_capacity)
//!                                     │        │
//!                                     ▼        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (one loop per pool)                                   │
//! │  - reserves an idle worker first                                  │
//! │  - then takes one unit from either source (no priority)           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Worker 0   │   │   Worker 1   │   │   Worker N   │
//!     │ announce ─►  │   │ announce ─►  │   │ announce ─►  │
//!     │ run (caught) │   │ run (caught) │   │ run (caught) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//!                     Bus (broadcast events)
//!                               ▲
//!            ┌──────────────────┼──────────────────┐
//!     ┌──────┴───────┐   ┌──────┴───────┐   ┌──────┴───────┐
//!     │  JobProcess  │   │  JobProcess  │   │  JobProcess  │
//!     │ tick/trigger │   │ tick/trigger │   │ tick/trigger │
//!     │ activation   │   │ activation   │   │ activation   │
//!     └──────▲───────┘   └──────▲───────┘   └──────▲───────┘
//!            └──────── Scheduler (JoinSet of job loops) ───────┘
//! ```
//!
//! ### Pool lifecycle
//! ```text
//! Pool::new(cfg) ──► start() ──► submit / enqueue ... ──► stop()
//!                                                            │
//!         signal ──► dispatcher exits ──► workers finish ◄───┘
//!         in-hand units ──► queued units dropped ──► reply ──► stop() returns
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                         |
//! |-----------------|----------------------------------------------------------|--------------------------------------------|
//! | **Pool**        | Bounded-concurrency execution with three admission modes | [`Pool`], [`PoolConfig`], [`Work`], [`WorkFn`] |
//! | **Scheduler**   | Periodic jobs with trigger and activation control        | [`Scheduler`], [`ScheduleHandle`], [`Job`], [`JobFn`] |
//! | **Shutdown**    | Signal/wait/reply handshake                              | [`Stopper`]                                |
//! | **Events**      | Broadcast of lifecycle, rejection and panic events      | [`Bus`], [`Event`], [`EventKind`]          |
//! | **Errors**      | Typed errors for submission and job handles              | [`SubmitError`], [`ScheduleError`]         |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use workvisor::{JobFn, Pool, PoolConfig, Scheduler, WorkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut pool = Pool::new(PoolConfig::default().with_max_workers(2));
//!     pool.start();
//!     let pool = Arc::new(pool);
//!
//!     let mut scheduler = Scheduler::new();
//!     let root = CancellationToken::new();
//!
//!     let feeder = Arc::clone(&pool);
//!     let job = JobFn::arc("feed", move |_ctx: CancellationToken| {
//!         let feeder = Arc::clone(&feeder);
//!         async move {
//!             feeder.enqueue(WorkFn::new(|| async { println!("fed") }));
//!         }
//!     });
//!     scheduler.add(&root, job, Duration::from_millis(50), true);
//!
//!     tokio::time::sleep(Duration::from_millis(120)).await;
//!     scheduler.stop().await;
//!     pool.stop().await;
//! }
//! ```

mod error;
mod events;
mod panic;
mod pool;
mod scheduler;
mod work;

// ---- Public re-exports ----

pub use error::{ScheduleError, SubmitError};
pub use events::{Bus, Event, EventKind};
pub use pool::{Pool, PoolConfig, Stopper, DEFAULT_ENQUEUE_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
pub use scheduler::{Job, JobFn, JobRef, ScheduleHandle, Scheduler, MIN_INTERVAL};
pub use work::{BoxWork, Work, WorkFn};
