//! vc-router CLI
//!
//! Runs the routing algorithm for a virtual commuter set: prepares the job
//! queue, boots the routing engine server, and drains the queue with a
//! worker pool.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use vc_router::{create_pool_from_env, run, RunOptions};

#[derive(Parser)]
#[command(name = "vc-router")]
#[command(about = "Run the routing algorithm for a virtual commuter set")]
#[command(version)]
struct Cli {
    /// Simulation id
    sim_id: String,

    /// Disable delay simulation
    #[arg(long)]
    no_delays: bool,

    /// Force a rebuild of the graph
    #[arg(long)]
    force_graph_rebuild: bool,

    /// Memory for the graph build process (in GB)
    #[arg(long, default_value = "4")]
    graph_build_memory: u32,

    /// Memory for the engine server (in GB)
    #[arg(long, default_value = "4")]
    server_memory: u32,

    /// Number of concurrent workers
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Reset all jobs for this simulation before running
    #[arg(long)]
    reset_jobs: bool,

    /// Path to the routing engine jar
    #[arg(long, default_value = "otp.jar")]
    engine_jar: PathBuf,

    /// Base URL of the engine server
    #[arg(long, default_value = "http://localhost:8080")]
    engine_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load .env file if present
    dotenvy::dotenv().ok();

    // Size the pool past the worker count so claims never starve
    let pool = create_pool_from_env((cli.workers + 2) as u32).await?;
    info!("Database connection established");

    let options = RunOptions {
        sim_id: cli.sim_id,
        use_delays: !cli.no_delays,
        force_graph_rebuild: cli.force_graph_rebuild,
        graph_build_memory: cli.graph_build_memory,
        server_memory: cli.server_memory,
        worker_count: cli.workers,
        reset_jobs: cli.reset_jobs,
        engine_jar: cli.engine_jar,
        engine_base_url: cli.engine_url,
    };

    run(&pool, &options).await?;

    Ok(())
}
