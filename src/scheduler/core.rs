//! # Scheduler: owns the scheduled-job processes.
//!
//! ## Architecture
//! ```text
//! Scheduler::add(parent, job, interval, active)
//!     ├─► token    = parent.child_token()
//!     ├─► trigger  = mpsc(1), activation = mpsc(1)
//!     ├─► loops.spawn(JobProcess::run())
//!     └─► ScheduleHandle { trigger, activation, token }  ──► caller
//!
//! Scheduler::trigger_all()  ──► handle.trigger() for every job
//! Scheduler::stop()         ──► handle.cancel() for every job ──► join every loop
//! ```
//!
//! ## Rules
//! - Jobs share nothing; each loop owns its job, ticker and `active` flag.
//! - `stop()` returns only after every loop exited; no job runs afterwards.
//! - Cancelling the parent token passed to `add` cancels that job too.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use workvisor::{JobFn, Scheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut scheduler = Scheduler::new();
//!     let root = CancellationToken::new();
//!
//!     let job = JobFn::arc("report", |_ctx: CancellationToken| async {
//!         println!("report tick");
//!     });
//!     let handle = scheduler.add(&root, job, Duration::from_secs(60), false);
//!
//!     handle.set_active(true).await.unwrap();
//!     handle.trigger().await.unwrap();
//!
//!     scheduler.stop().await;
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::{Bus, Event, EventKind};
use crate::scheduler::handle::ScheduleHandle;
use crate::scheduler::job::{Job, JobRef};
use crate::scheduler::process::{run_guarded, JobProcess};

/// Shortest accepted interval; `Duration::ZERO` is raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic job scheduler.
pub struct Scheduler {
    jobs: Vec<ScheduleHandle>,
    loops: JoinSet<()>,
    bus: Bus,
}

impl Scheduler {
    /// Creates an empty scheduler with its own event bus.
    pub fn new() -> Self {
        Self::with_bus(Bus::default())
    }

    /// Creates an empty scheduler publishing to an existing bus.
    pub fn with_bus(bus: Bus) -> Self {
        Self {
            jobs: Vec::new(),
            loops: JoinSet::new(),
            bus,
        }
    }

    /// Registers `job` and starts its control loop.
    ///
    /// The job runs once right away (if `active`), then every `interval`.
    /// Must be called from within a tokio runtime.
    pub fn add(
        &mut self,
        parent: &CancellationToken,
        job: JobRef,
        interval: Duration,
        active: bool,
    ) -> ScheduleHandle {
        self.prune();

        let interval = if interval.is_zero() {
            warn!(job = job.name(), "zero interval raised to {MIN_INTERVAL:?}");
            MIN_INTERVAL
        } else {
            interval
        };

        let name: Arc<str> = Arc::from(job.name());
        let token = parent.child_token();
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (activation_tx, activation_rx) = mpsc::channel(1);

        let process = JobProcess {
            job,
            name: Arc::clone(&name),
            interval,
            trigger: trigger_rx,
            activation: activation_rx,
            token: token.clone(),
            active,
            bus: self.bus.clone(),
        };
        self.loops.spawn(process.run());

        info!(job = %name, ?interval, active, "job scheduled");
        self.bus
            .publish(Event::new(EventKind::JobAdded).with_job(Arc::clone(&name)));

        let handle = ScheduleHandle::new(name, trigger_tx, activation_tx, token);
        self.jobs.push(handle.clone());
        handle
    }

    /// Triggers every registered job once.
    ///
    /// Waits per job while a previous trigger is still pending. Jobs that were
    /// already cancelled are skipped.
    pub async fn trigger_all(&self) {
        for handle in self.jobs.iter().filter(|h| !h.is_cancelled()) {
            if handle.trigger().await.is_err() {
                debug!(job = handle.name(), "trigger skipped, job closed");
            }
        }
    }

    /// Cancels every job and waits until all control loops have exited.
    pub async fn stop(&mut self) {
        for handle in self.jobs.drain(..) {
            handle.cancel();
        }
        while let Some(res) = self.loops.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "job loop ended abnormally");
            }
        }
        info!("scheduler stopped");
    }

    /// Forgets cancelled jobs and reaps loops that already exited.
    fn prune(&mut self) {
        self.jobs.retain(|handle| !handle.is_cancelled());
        while let Some(res) = self.loops.try_join_next() {
            if let Err(e) = res {
                error!(error = %e, "job loop ended abnormally");
            }
        }
    }

    /// Runs `job` once with panic containment, if `active`.
    pub async fn run(&self, job: &dyn Job, ctx: &CancellationToken, active: bool) {
        run_guarded(job, ctx, active, &self.bus).await
    }

    /// Number of registered jobs that were not cancelled.
    pub fn len(&self) -> usize {
        self.jobs.iter().filter(|h| !h.is_cancelled()).count()
    }

    /// True if no live job is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a receiver for this scheduler's events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The bus this scheduler publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScheduleError;
    use crate::scheduler::job::JobFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{self, sleep};

    fn counting(name: &'static str, hits: &Arc<AtomicUsize>) -> JobRef {
        let hits = Arc::clone(hits);
        JobFn::arc(name, move |_ctx: CancellationToken| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    fn count(hits: &Arc<AtomicUsize>) -> usize {
        hits.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_job_runs_immediately_then_every_interval() {
        let mut scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        scheduler.add(
            &CancellationToken::new(),
            counting("tick", &hits),
            Duration::from_millis(100),
            true,
        );

        sleep(Duration::from_millis(10)).await;
        assert_eq!(count(&hits), 1);

        sleep(Duration::from_millis(240)).await;
        assert_eq!(count(&hits), 3);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_job_waits_for_activation() {
        let mut scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.add(
            &CancellationToken::new(),
            counting("paused", &hits),
            Duration::from_millis(100),
            false,
        );

        sleep(Duration::from_millis(350)).await;
        assert_eq!(count(&hits), 0);

        handle.set_active(true).await.expect("loop alive");
        sleep(Duration::from_millis(60)).await;
        assert_eq!(count(&hits), 1);

        handle.set_active(false).await.expect("loop alive");
        sleep(Duration::from_millis(300)).await;
        assert_eq!(count(&hits), 1);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_consumes_next_tick() {
        let mut scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.add(
            &CancellationToken::new(),
            counting("manual", &hits),
            Duration::from_millis(100),
            true,
        );

        sleep(Duration::from_millis(30)).await;
        assert_eq!(count(&hits), 1);

        handle.trigger().await.expect("loop alive");
        sleep(Duration::from_millis(120)).await;
        assert_eq!(count(&hits), 2, "tick at 100ms should have been absorbed");

        sleep(Duration::from_millis(100)).await;
        assert_eq!(count(&hits), 3);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_all_runs_each_job_once() {
        let mut scheduler = Scheduler::new();
        let root = CancellationToken::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let off = Arc::new(AtomicUsize::new(0));
        let hour = Duration::from_secs(3600);

        scheduler.add(&root, counting("a", &a), hour, true);
        scheduler.add(&root, counting("b", &b), hour, true);
        scheduler.add(&root, counting("off", &off), hour, false);
        assert_eq!(scheduler.len(), 3);

        sleep(Duration::from_millis(10)).await;
        assert_eq!((count(&a), count(&b), count(&off)), (1, 1, 0));

        scheduler.trigger_all().await;
        sleep(Duration::from_millis(10)).await;
        assert_eq!((count(&a), count(&b), count(&off)), (2, 2, 0));

        scheduler.stop().await;
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_job_keeps_its_schedule() {
        let mut scheduler = Scheduler::new();
        let mut events = scheduler.subscribe();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let job: JobRef = JobFn::arc("flaky", move |_ctx: CancellationToken| {
            let h = Arc::clone(&h);
            async move {
                if h.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first run fails");
                }
            }
        });
        scheduler.add(
            &CancellationToken::new(),
            job,
            Duration::from_millis(100),
            true,
        );

        sleep(Duration::from_millis(250)).await;
        assert_eq!(count(&hits), 3);
        scheduler.stop().await;

        let mut panics = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::JobPanicked {
                assert_eq!(ev.reason.as_deref(), Some("first run fails"));
                panics += 1;
            }
        }
        assert_eq!(panics, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_running_job_and_nothing_runs_after() {
        let mut scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let job: JobRef = JobFn::arc("slow", move |_ctx: CancellationToken| {
            let h = Arc::clone(&h);
            async move {
                sleep(Duration::from_millis(100)).await;
                h.fetch_add(1, Ordering::SeqCst);
            }
        });
        let handle = scheduler.add(
            &CancellationToken::new(),
            job,
            Duration::from_millis(150),
            true,
        );

        sleep(Duration::from_millis(10)).await;
        scheduler.stop().await;
        assert_eq!(count(&hits), 1, "run in progress was not awaited");
        assert!(handle.is_cancelled());

        sleep(Duration::from_secs(1)).await;
        assert_eq!(count(&hits), 1);
        assert_eq!(handle.trigger().await, Err(ScheduleError::Closed));
        assert_eq!(handle.set_active(true).await, Err(ScheduleError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_job() {
        let mut scheduler = Scheduler::new();
        let mut events = scheduler.subscribe();
        let parent = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.add(
            &parent,
            counting("child", &hits),
            Duration::from_millis(100),
            true,
        );

        sleep(Duration::from_millis(10)).await;
        parent.cancel();
        sleep(Duration::from_millis(500)).await;

        assert!(handle.is_cancelled());
        assert_eq!(count(&hits), 1);

        let cancelled = std::iter::from_fn(|| events.try_recv().ok())
            .any(|ev| ev.kind == EventKind::JobCancelled && ev.job.as_deref() == Some("child"));
        assert!(cancelled);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_trigger_reports_pending() {
        let mut scheduler = Scheduler::new();
        let gate = CancellationToken::new();
        let g = gate.clone();
        let job: JobRef = JobFn::arc("busy", move |_ctx: CancellationToken| {
            let g = g.clone();
            async move { g.cancelled().await }
        });
        let handle = scheduler.add(&CancellationToken::new(), job, Duration::from_secs(60), true);

        // First run is blocked on the gate, so the loop does not drain triggers.
        sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.try_trigger(), Ok(()));
        assert_eq!(handle.try_trigger(), Err(ScheduleError::Full));

        gate.cancel();
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_run_respects_active_flag() {
        let scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let job = counting("direct", &hits);
        let ctx = CancellationToken::new();

        scheduler.run(job.as_ref(), &ctx, false).await;
        assert_eq!(count(&hits), 0);

        scheduler.run(job.as_ref(), &ctx, true).await;
        assert_eq!(count(&hits), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised() {
        let mut scheduler = Scheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        scheduler.add(
            &CancellationToken::new(),
            counting("fast", &hits),
            Duration::ZERO,
            true,
        );

        time::sleep(Duration::from_millis(5)).await;
        assert!(count(&hits) >= 2);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_jobs_are_forgotten() {
        let mut scheduler = Scheduler::new();
        let root = CancellationToken::new();
        let parent = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let minute = Duration::from_secs(60);

        let direct = scheduler.add(&root, counting("direct", &hits), minute, false);
        scheduler.add(&parent, counting("via-parent", &hits), minute, false);
        assert_eq!(scheduler.len(), 2);

        direct.cancel();
        parent.cancel();
        assert!(scheduler.is_empty());

        sleep(Duration::from_millis(10)).await;
        scheduler.add(&root, counting("kept", &hits), minute, false);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.jobs.len(), 1);
        assert_eq!(scheduler.loops.len(), 1);

        scheduler.stop().await;
    }
}
