//! Worker pool - concurrent claim/process/commit loops
//!
//! N independent tasks share nothing but the database pool and the job
//! processor. Mutual exclusion lives entirely in the atomic claim; once a
//! worker holds a job, every further transition on it is single-owner.
//! A worker ends on its own when the queue drains or its breaker trips;
//! the run ends when every worker has ended.

use crate::db::{jobs, DbPool};
use crate::error::Result;
use crate::worker::processor::JobProcessor;
use crate::worker::WorkerConfig;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Why a worker's loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// No pending job was left to claim
    QueueDrained,
    /// The consecutive-failure breaker tripped
    BreakerTripped,
}

/// Per-worker consecutive-failure circuit breaker.
///
/// Deliberately local state: a tripped breaker stops only the worker that
/// owns it, with no coordination across workers.
#[derive(Debug)]
struct Breaker {
    consecutive: u32,
    threshold: u32,
}

impl Breaker {
    fn new(threshold: u32) -> Self {
        Self {
            consecutive: 0,
            threshold,
        }
    }

    fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Returns true when the failure trips the breaker
    fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.threshold
    }
}

/// Shared, read-only context for all workers of one run
struct RunContext {
    pool: DbPool,
    processor: Arc<dyn JobProcessor>,
    config: WorkerConfig,
    sim_id: String,
    /// Jobs claimed by any worker, against the pending count at startup
    claimed: AtomicU64,
    total_at_start: u64,
}

/// Worker pool draining the job queue of one simulation
pub struct WorkerPool {
    ctx: Arc<RunContext>,
}

impl WorkerPool {
    pub fn new(
        pool: DbPool,
        processor: Arc<dyn JobProcessor>,
        config: WorkerConfig,
        sim_id: String,
        pending_at_start: u64,
    ) -> Self {
        Self {
            ctx: Arc::new(RunContext {
                pool,
                processor,
                config,
                sim_id,
                claimed: AtomicU64::new(0),
                total_at_start: pending_at_start.max(1),
            }),
        }
    }

    /// Run all workers until each has stopped, returning their outcomes
    /// in worker order.
    ///
    /// Per-job failures are committed to the job rows, not returned; only
    /// infrastructure errors (lost database) surface here.
    pub async fn run(&self) -> Result<Vec<WorkerOutcome>> {
        let count = self.ctx.config.worker_count;
        info!(
            "Starting {} workers for simulation {}",
            count, self.ctx.sim_id
        );

        let handles: Vec<_> = (0..count)
            .map(|worker_id| {
                let ctx = Arc::clone(&self.ctx);
                tokio::spawn(async move { worker_loop(ctx, worker_id).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(count);
        let mut first_error = None;
        for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(Ok(outcome)) => {
                    info!("Worker {} stopped: {:?}", worker_id, outcome);
                    outcomes.push(outcome);
                }
                Ok(Err(e)) => {
                    error!("Worker {} failed: {}", worker_id, e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    error!("Worker {} panicked: {}", worker_id, e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }
}

/// One worker's claim/process/commit loop
async fn worker_loop(ctx: Arc<RunContext>, worker_id: usize) -> Result<WorkerOutcome> {
    let mut breaker = Breaker::new(ctx.config.breaker_threshold);
    let mut last_progress = Instant::now() - ctx.config.progress_interval;

    loop {
        let job = match jobs::claim_next(&ctx.pool, &ctx.sim_id).await? {
            Some(job) => job,
            None => return Ok(WorkerOutcome::QueueDrained),
        };

        let claimed = ctx.claimed.fetch_add(1, Ordering::Relaxed) + 1;

        // Only worker 0 reports, so progress lines don't interleave
        if worker_id == 0 && last_progress.elapsed() >= ctx.config.progress_interval {
            let percentage = claimed as f64 / ctx.total_at_start as f64 * 100.0;
            info!("Progress: ~{:.2}% ({})", percentage, job.vc_id);
            last_progress = Instant::now();
        }

        match ctx.processor.process(&ctx.pool, &job.vc_id, &ctx.sim_id).await {
            Ok(()) => {
                jobs::complete_job(&ctx.pool, job.id).await?;
                breaker.record_success();
            }
            Err(e) => {
                let short_description = format!("Routing failed: {}", e);
                error!("Job {} ({}): {}", job.id, job.vc_id, short_description);

                jobs::fail_job(&ctx.pool, job.id, &short_description).await?;

                if breaker.record_failure() {
                    warn!(
                        "Worker {}: {} consecutive errors, stopping",
                        worker_id, ctx.config.breaker_threshold
                    );
                    return Ok(WorkerOutcome::BreakerTripped);
                }
            }
        }
    }
}
