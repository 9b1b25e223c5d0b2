//! Route job queue operations
//!
//! The route_jobs table is the only coordination point between workers,
//! which may run in separate processes or on separate machines. Every
//! transition that needs cross-worker exclusivity goes through a single
//! atomic statement here; jobs already claimed are owned by exactly one
//! worker and need no further locking.
//!
//! Status values always go through [`JobStatus`], so the set of states in
//! the table stays closed.

use crate::db::models::{JobStatus, RouteJob};
use crate::db::DbPool;
use crate::error::Result;
use std::time::Duration;

/// Create pending jobs for every commuter of a simulation without one.
///
/// Anti-join plus unique-tolerant insert in one statement: commuters that
/// gained a job between the SELECT and the INSERT (concurrent generator)
/// hit the (vc_id, sim_id) unique index and are skipped. Running this any
/// number of times, concurrently or not, nets exactly one job per commuter.
///
/// Returns the number of jobs actually created.
pub async fn create_missing_jobs(pool: &DbPool, sim_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO route_jobs (vc_id, sim_id, status, created_at)
        SELECT vc.vc_id, vc.sim_id, $2, NOW()
        FROM virtual_commuters vc
        WHERE vc.sim_id = $1
          AND NOT EXISTS (
              SELECT 1 FROM route_jobs j
              WHERE j.vc_id = vc.vc_id AND j.sim_id = vc.sim_id
          )
        ON CONFLICT (vc_id, sim_id) DO NOTHING
        "#,
    )
    .bind(sim_id)
    .bind(JobStatus::Pending.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Force every job of a simulation back to pending for a full rerun.
///
/// Clears the claim and terminal fields so the jobs are indistinguishable
/// from freshly created ones.
pub async fn reset_jobs(pool: &DbPool, sim_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE route_jobs
        SET status = $2,
            started_at = NULL,
            finished_at = NULL,
            error = NULL
        WHERE sim_id = $1
        "#,
    )
    .bind(sim_id)
    .bind(JobStatus::Pending.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Return running jobs whose lease expired back to pending.
///
/// There is no heartbeat: a job still `running` past the lease timeout is
/// treated as abandoned by a crashed worker. The filter only matches
/// expired running jobs, so a second pass right after the first is a no-op.
/// Safe to run concurrently with active workers.
pub async fn reclaim_stale(pool: &DbPool, sim_id: &str, lease_timeout: Duration) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE route_jobs
        SET status = $3
        WHERE sim_id = $1
          AND status = $4
          AND started_at < NOW() - make_interval(secs => $2)
        "#,
    )
    .bind(sim_id)
    .bind(lease_timeout.as_secs_f64())
    .bind(JobStatus::Pending.as_str())
    .bind(JobStatus::Running.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Atomically claim the next pending job and return it.
///
/// The sole mutual-exclusion primitive of the queue: the locked CTE plus
/// conditional UPDATE hand each pending job to exactly one caller, with no
/// lock layered on top. `None` means the queue for this simulation is
/// drained (from this worker's point of view).
pub async fn claim_next(pool: &DbPool, sim_id: &str) -> Result<Option<RouteJob>> {
    let job = sqlx::query_as::<_, RouteJob>(
        r#"
        WITH next_job AS (
            SELECT id FROM route_jobs
            WHERE sim_id = $1
              AND status = $2
            ORDER BY created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        UPDATE route_jobs
        SET status = $3,
            started_at = NOW()
        WHERE id = (SELECT id FROM next_job)
        RETURNING *
        "#,
    )
    .bind(sim_id)
    .bind(JobStatus::Pending.as_str())
    .bind(JobStatus::Running.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(job)
}

/// Mark a claimed job as successfully finished
pub async fn complete_job(pool: &DbPool, job_id: i32) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE route_jobs
        SET status = $2,
            finished_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(JobStatus::Done.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a claimed job as failed, recording the error on the job row
///
/// Failures live on the job document rather than propagating to a caller,
/// which leaves a queryable audit trail per commuter.
pub async fn fail_job(pool: &DbPool, job_id: i32, error_msg: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE route_jobs
        SET status = $3,
            error = $2,
            finished_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(error_msg)
    .bind(JobStatus::Error.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Count jobs of a simulation in one status
pub async fn count_by_status(pool: &DbPool, sim_id: &str, status: JobStatus) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM route_jobs
        WHERE sim_id = $1
          AND status = $2
        "#,
    )
    .bind(sim_id)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count pending jobs for a simulation
///
/// Used for the startup progress baseline and the no-work early exit.
pub async fn count_pending(pool: &DbPool, sim_id: &str) -> Result<i64> {
    count_by_status(pool, sim_id, JobStatus::Pending).await
}

/// Get a job by ID
pub async fn get_job_by_id(pool: &DbPool, job_id: i32) -> Result<Option<RouteJob>> {
    let job = sqlx::query_as::<_, RouteJob>("SELECT * FROM route_jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await?;

    Ok(job)
}
