//! # Pool + Scheduler Example
//!
//! Wires three scheduled jobs into one worker pool, each feeding it a batch of
//! units through a different admission mode.
//!
//! Demonstrates:
//! - `enqueue_with_timeout`, `enqueue` and `submit`
//! - Starting an inactive job later (soft start)
//! - Triggering one job, then every job
//! - Graceful shutdown on Ctrl-C
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example pool_demo
//! ```

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use workvisor::{JobFn, JobRef, Pool, PoolConfig, Scheduler, Work, WorkFn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut pool = Pool::new(
        PoolConfig::default()
            .with_max_workers(4)
            .with_job_queue_capacity(4),
    );
    pool.start();
    let pool = Arc::new(pool);

    let mut scheduler = Scheduler::with_bus(pool.bus().clone());
    let root = CancellationToken::new();

    // ============================================================
    // Job 1: inactive until started, waits up to 1s for queue room
    // ============================================================
    let first = scheduler.add(&root, timed_batch(&pool, 7), Duration::from_secs(10), false);

    {
        let first = first.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            println!(" ─► Starting '{}'", first.name());
            let _ = first.set_active(true).await;

            tokio::time::sleep(Duration::from_secs(5)).await;
            println!(" ─► Triggering '{}'", first.name());
            let _ = first.trigger().await;
        });
    }

    // ============================================================
    // Job 2 and 3: active right away
    // ============================================================
    scheduler.add(&root, try_batch(&pool), Duration::from_secs(60), true);
    scheduler.add(&root, blocking_batch(&pool), Duration::from_secs(60), true);

    // ============================================================
    // Trigger everything once after 30s, until Ctrl-C
    // ============================================================
    let trigger_all = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(trigger_all);
    let mut triggered = false;

    loop {
        tokio::select! {
            _ = &mut trigger_all, if !triggered => {
                triggered = true;
                println!(" ─► Trigger all");
                scheduler.trigger_all().await;
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                break;
            }
        }
    }
    println!(" ─► Shutting down");

    root.cancel();
    scheduler.stop().await;
    pool.stop().await;

    println!("Done");
    Ok(())
}

/// Each unit holds a clone of `done`; the batch is finished once all clones are dropped.
fn unit(label: String, took: Duration, done: mpsc::Sender<()>) -> impl Work {
    WorkFn::new(move || async move {
        tokio::time::sleep(took).await;
        info!(unit = %label, "unit finished");
        drop(done);
    })
}

async fn wait_batch(done: mpsc::Sender<()>, mut rx: mpsc::Receiver<()>) {
    drop(done);
    let _ = rx.recv().await;
}

fn timed_batch(pool: &Arc<Pool>, extra: i32) -> JobRef {
    let pool = Arc::clone(pool);
    JobFn::arc("timed-batch", move |_ctx: CancellationToken| {
        let pool = Arc::clone(&pool);
        async move {
            info!("timed-batch started");
            let (done, rx) = mpsc::channel(1);
            for id in [1, 2, 3, 4, 5, 6, extra] {
                let queued = pool
                    .enqueue_with_timeout(
                        unit(format!("t-{id}"), Duration::from_secs(1), done.clone()),
                        Duration::from_secs(1),
                    )
                    .await;
                info!(id, queued, "enqueue with timeout");
            }
            wait_batch(done, rx).await;
            info!("timed-batch finished");
        }
    })
}

fn try_batch(pool: &Arc<Pool>) -> JobRef {
    let pool = Arc::clone(pool);
    JobFn::arc("try-batch", move |_ctx: CancellationToken| {
        let pool = Arc::clone(&pool);
        async move {
            info!("try-batch started");
            let (done, rx) = mpsc::channel(1);
            for id in ["s2-a", "s2-b", "s2-c", "s2-d", "s2-e", "s2-f"] {
                let queued = pool.enqueue(unit(id.to_string(), Duration::from_secs(2), done.clone()));
                info!(id, queued, "enqueue");
            }
            wait_batch(done, rx).await;
            info!("try-batch finished");
        }
    })
}

fn blocking_batch(pool: &Arc<Pool>) -> JobRef {
    let pool = Arc::clone(pool);
    JobFn::arc("blocking-batch", move |ctx: CancellationToken| {
        let pool = Arc::clone(&pool);
        async move {
            info!("blocking-batch started");
            let (done, rx) = mpsc::channel(1);
            for id in ["s3-a", "s3-b", "s3-c", "s3-d", "s3-e", "s3-f"] {
                let unit = unit(id.to_string(), Duration::from_secs(2), done.clone());
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    res = pool.submit(unit) => if let Err(e) = res {
                        info!(id, error = %e, "submit refused");
                        break;
                    },
                }
            }
            wait_batch(done, rx).await;
            info!("blocking-batch finished");
        }
    })
}
