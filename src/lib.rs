//! vc-router - Route calculation for virtual commuter simulations
//!
//! Computes travel itineraries for a population of synthetic commuters by
//! draining a PostgreSQL-coordinated job queue with a pool of concurrent
//! workers, each dispatching trip-plan requests to an external routing
//! engine and persisting raw and decision-ready results.
//!
//! Workers coordinate through the database alone: job generation diffs the
//! population against existing jobs, claims are single atomic statements,
//! and abandoned claims are reclaimed by a lease-expiry sweep. There is no
//! scheduler process and no cross-worker signalling.

pub mod db;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod routing;
pub mod worker;

pub use db::{create_pool, create_pool_from_env, DbPool};
pub use engine::{EngineClient, EngineClientConfig, EngineServer};
pub use error::{Result, RouterError};
pub use worker::{JobProcessor, RouteProcessor, WorkerConfig, WorkerPool};

use crate::db::models::RunMeta;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Options for one routing run, mirroring the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub sim_id: String,
    pub use_delays: bool,
    pub force_graph_rebuild: bool,
    /// GB of heap for the graph build process
    pub graph_build_memory: u32,
    /// GB of heap for the engine server
    pub server_memory: u32,
    pub worker_count: usize,
    /// Force all existing jobs back to pending first
    pub reset_jobs: bool,
    /// Path to the routing engine jar
    pub engine_jar: PathBuf,
    /// Base URL the engine server answers on
    pub engine_base_url: String,
}

/// Run the routing algorithm for one simulation.
///
/// Prepares the queue (optional reset, job generation, stale reclaim),
/// builds the graph and boots the engine server, drains the queue with the
/// worker pool, and shuts the server down again. Safe to invoke from
/// several processes at once; the queue arbitrates all work.
pub async fn run(pool: &DbPool, options: &RunOptions) -> Result<()> {
    let sim_id = &options.sim_id;

    if options.reset_jobs {
        let reset = db::jobs::reset_jobs(pool, sim_id).await?;
        info!("Reset {} jobs for simulation {}", reset, sim_id);
    }

    let created = db::jobs::create_missing_jobs(pool, sim_id).await?;
    info!("Created {} missing jobs for simulation {}", created, sim_id);

    let config = WorkerConfig::builder()
        .worker_count(options.worker_count)
        .use_delays(options.use_delays)
        .build();

    let reclaimed = db::jobs::reclaim_stale(pool, sim_id, config.lease_timeout).await?;
    if reclaimed > 0 {
        info!("Reclaimed {} timed out jobs", reclaimed);
    }

    let pending = db::jobs::count_pending(pool, sim_id).await?;
    if pending == 0 {
        info!("No active jobs, stopping");
        return Ok(());
    }

    let sim = db::simulations::get_simulation(pool, sim_id).await?;
    let place = db::simulations::get_place_resources(pool, &sim.place_id).await?;

    info!("Building graph");
    let graph = engine::build_graph(
        &options.engine_jar,
        &place,
        sim.pivot_date,
        options.force_graph_rebuild,
        options.graph_build_memory,
    )
    .await?;

    let meta = RunMeta {
        engine_version: graph.engine_version.clone(),
        osm_dataset_link: graph.osm_source.source.clone(),
        osm_dataset_date: graph.osm_source.date.clone(),
        gtfs: graph.gtfs_sources.clone(),
        uses_delay_simulation: options.use_delays,
    };

    let mut server =
        EngineServer::start(&options.engine_jar, &graph.graph_dir, options.server_memory)?;

    info!("Starting up server...");
    if let Err(e) = server.wait_ready().await {
        let _ = server.shutdown().await;
        return Err(e);
    }

    let engine_client = EngineClient::with_config(EngineClientConfig {
        base_url: options.engine_base_url.clone(),
        ..EngineClientConfig::default()
    })?;

    let started = std::time::Instant::now();
    let processor = RouteProcessor::new(engine_client, meta, options.use_delays);
    let worker_pool = WorkerPool::new(
        pool.clone(),
        Arc::new(processor),
        config,
        sim.sim_id.clone(),
        pending as u64,
    );

    // Shut the server down whether or not the pool drained cleanly
    let pool_result = worker_pool.run().await;
    server.shutdown().await?;
    pool_result?;

    info!("Finished routing in {:?}", started.elapsed());
    Ok(())
}
