//! Job queue integration tests
//!
//! These run against a real PostgreSQL instance with schema.sql applied
//! and are ignored by default:
//!
//!     DATABASE_URL=postgres://... cargo test -- --ignored
//!
//! Every test works in its own simulation id, so they can run in parallel
//! against a shared database.

use std::time::Duration;
use uuid::Uuid;
use vc_router::db::models::JobStatus;
use vc_router::db::{commuters, create_pool_from_env, jobs, results, DbPool};

async fn test_pool() -> DbPool {
    dotenvy::dotenv().ok();
    create_pool_from_env(10).await.expect("DATABASE_URL pool")
}

fn fresh_sim_id() -> String {
    format!("test-sim-{}", Uuid::new_v4())
}

async fn insert_commuters(pool: &DbPool, sim_id: &str, count: usize) -> Vec<String> {
    let mut vc_ids = Vec::new();
    for i in 0..count {
        let vc_id = format!("{}-vc-{}", sim_id, i);
        sqlx::query(
            r#"
            INSERT INTO virtual_commuters
                (vc_id, sim_id, origin_lat, origin_lon, dest_lat, dest_lon,
                 departure, has_vehicle)
            VALUES ($1, $2, 52.52, 13.405, 52.5, 13.39, NOW(), FALSE)
            "#,
        )
        .bind(&vc_id)
        .bind(sim_id)
        .execute(pool)
        .await
        .unwrap();
        vc_ids.push(vc_id);
    }
    vc_ids
}

#[tokio::test]
#[ignore] // Requires database
async fn create_missing_jobs_is_idempotent_under_concurrency() {
    let pool = test_pool().await;
    let sim_id = fresh_sim_id();
    insert_commuters(&pool, &sim_id, 20).await;

    // Two concurrent generators race over the same population
    let (a, b) = tokio::join!(
        jobs::create_missing_jobs(&pool, &sim_id),
        jobs::create_missing_jobs(&pool, &sim_id),
    );
    let created = a.unwrap() + b.unwrap();
    assert_eq!(created, 20, "exactly one job per commuter across both calls");

    // A third pass finds nothing left to create
    assert_eq!(jobs::create_missing_jobs(&pool, &sim_id).await.unwrap(), 0);
    assert_eq!(jobs::count_pending(&pool, &sim_id).await.unwrap(), 20);
    assert_eq!(commuters::count_commuters(&pool, &sim_id).await.unwrap(), 20);
}

#[tokio::test]
#[ignore] // Requires database
async fn concurrent_claims_hand_out_distinct_jobs() {
    let pool = test_pool().await;
    let sim_id = fresh_sim_id();
    insert_commuters(&pool, &sim_id, 8).await;
    jobs::create_missing_jobs(&pool, &sim_id).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let sim_id = sim_id.clone();
            tokio::spawn(async move { jobs::claim_next(&pool, &sim_id).await.unwrap() })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let job = handle.await.unwrap().expect("a pending job per claimer");
        assert_eq!(job.job_status(), Some(JobStatus::Running));
        assert!(job.started_at.is_some());
        ids.push(job.id);
    }

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8, "no job was handed to two claimers");

    // Queue is drained now
    assert!(jobs::claim_next(&pool, &sim_id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires database
async fn reclaim_returns_expired_jobs_once() {
    let pool = test_pool().await;
    let sim_id = fresh_sim_id();
    insert_commuters(&pool, &sim_id, 1).await;
    jobs::create_missing_jobs(&pool, &sim_id).await.unwrap();

    let job = jobs::claim_next(&pool, &sim_id).await.unwrap().unwrap();

    // Backdate the claim instead of waiting out a real lease
    sqlx::query("UPDATE route_jobs SET started_at = NOW() - INTERVAL '10 minutes' WHERE id = $1")
        .bind(job.id)
        .execute(&pool)
        .await
        .unwrap();

    let lease = Duration::from_secs(300);
    assert_eq!(jobs::reclaim_stale(&pool, &sim_id, lease).await.unwrap(), 1);

    let reclaimed = jobs::get_job_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(reclaimed.job_status(), Some(JobStatus::Pending));

    // Immediately re-running the sweep is a no-op
    assert_eq!(jobs::reclaim_stale(&pool, &sim_id, lease).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires database
async fn fresh_claims_are_not_reclaimed() {
    let pool = test_pool().await;
    let sim_id = fresh_sim_id();
    insert_commuters(&pool, &sim_id, 1).await;
    jobs::create_missing_jobs(&pool, &sim_id).await.unwrap();

    let job = jobs::claim_next(&pool, &sim_id).await.unwrap().unwrap();

    let lease = Duration::from_secs(300);
    assert_eq!(jobs::reclaim_stale(&pool, &sim_id, lease).await.unwrap(), 0);

    let unchanged = jobs::get_job_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(unchanged.job_status(), Some(JobStatus::Running));
}

#[tokio::test]
#[ignore] // Requires database
async fn terminal_transitions_record_outcome() {
    let pool = test_pool().await;
    let sim_id = fresh_sim_id();
    insert_commuters(&pool, &sim_id, 2).await;
    jobs::create_missing_jobs(&pool, &sim_id).await.unwrap();

    let first = jobs::claim_next(&pool, &sim_id).await.unwrap().unwrap();
    jobs::complete_job(&pool, first.id).await.unwrap();
    let done = jobs::get_job_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(done.job_status(), Some(JobStatus::Done));
    assert!(done.finished_at.is_some());
    assert!(done.error.is_none());

    let second = jobs::claim_next(&pool, &sim_id).await.unwrap().unwrap();
    jobs::fail_job(&pool, second.id, "Routing failed: No route found")
        .await
        .unwrap();
    let failed = jobs::get_job_by_id(&pool, second.id).await.unwrap().unwrap();
    assert_eq!(failed.job_status(), Some(JobStatus::Error));
    assert_eq!(
        failed.error.as_deref(),
        Some("Routing failed: No route found")
    );
}

#[tokio::test]
#[ignore] // Requires database
async fn reset_jobs_clears_claims_and_outcomes() {
    let pool = test_pool().await;
    let sim_id = fresh_sim_id();
    insert_commuters(&pool, &sim_id, 3).await;
    jobs::create_missing_jobs(&pool, &sim_id).await.unwrap();

    let job = jobs::claim_next(&pool, &sim_id).await.unwrap().unwrap();
    jobs::fail_job(&pool, job.id, "boom").await.unwrap();

    assert_eq!(jobs::reset_jobs(&pool, &sim_id).await.unwrap(), 3);
    assert_eq!(jobs::count_pending(&pool, &sim_id).await.unwrap(), 3);

    let reset = jobs::get_job_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(reset.job_status(), Some(JobStatus::Pending));
    assert!(reset.started_at.is_none());
    assert!(reset.finished_at.is_none());
    assert!(reset.error.is_none());
}

#[tokio::test]
#[ignore] // Requires database
async fn reprocessing_overwrites_result_documents() {
    use chrono::Utc;
    use vc_router::db::models::{DataSource, RunMeta, Traveller};
    use vc_router::routing::{GeoPoint, RouteOption};

    let pool = test_pool().await;
    let sim_id = fresh_sim_id();
    let vc_id = format!("{}-vc-0", sim_id);

    let meta = RunMeta {
        engine_version: "2.4.0".to_string(),
        osm_dataset_link: "https://example.org/osm.pbf".to_string(),
        osm_dataset_date: "2024-01-01".to_string(),
        gtfs: vec![DataSource {
            source: "https://example.org/gtfs.zip".to_string(),
            date: "2024-01-01".to_string(),
            provider: Some("test".to_string()),
        }],
        uses_delay_simulation: true,
    };
    let traveller = Traveller {
        vc_id: vc_id.clone(),
        has_vehicle: false,
        age: Some(30),
        employed: Some(true),
    };
    let option = |modes: Vec<&str>| RouteOption {
        option_id: Uuid::new_v4(),
        origin: GeoPoint { lat: 0.0, lon: 0.0 },
        destination: GeoPoint { lat: 1.0, lon: 1.0 },
        departure: Utc::now(),
        modes: modes.into_iter().map(String::from).collect(),
        itineraries: vec![],
    };

    // First write, then a rerun with different content
    results::upsert_route_result(&pool, &vc_id, &sim_id, &[option(vec!["WALK", "TRANSIT"])], &meta)
        .await
        .unwrap();
    results::upsert_option_summary(&pool, &vc_id, &sim_id, &traveller, &[])
        .await
        .unwrap();

    let second = [option(vec!["WALK", "TRANSIT"]), option(vec!["WALK", "CAR"])];
    results::upsert_route_result(&pool, &vc_id, &sim_id, &second, &meta)
        .await
        .unwrap();
    results::upsert_option_summary(&pool, &vc_id, &sim_id, &traveller, &[])
        .await
        .unwrap();

    let (count, options): (i64, serde_json::Value) = sqlx::query_as(
        r#"
        SELECT (SELECT COUNT(*) FROM route_results WHERE vc_id = $1),
               (SELECT options FROM route_results WHERE vc_id = $1)
        "#,
    )
    .bind(&vc_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 1, "rerun must overwrite, not duplicate");
    assert_eq!(options.as_array().unwrap().len(), 2);

    let summary_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM route_option_summaries WHERE vc_id = $1")
            .bind(&vc_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(summary_count, 1);
}
