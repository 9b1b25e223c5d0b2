//! Routing engine process lifecycle
//!
//! Builds the routable graph from the place's OSM and GTFS sources and runs
//! the engine's HTTP server as a child process. The worker pool only starts
//! after the server prints its ready marker; a server that never gets there
//! is fatal to the whole run.

use crate::db::models::{DataSource, PlaceResources};
use crate::error::{Result, RouterError};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Last line the engine server prints once it accepts requests
pub const READY_MARKER: &str = "Grizzly server running.";

/// Serialized graph file name inside the graph directory
const GRAPH_FILE: &str = "graph.obj";

/// Outputs of a graph build, carried into the run's provenance metadata
#[derive(Debug, Clone)]
pub struct GraphResources {
    pub graph_dir: PathBuf,
    pub engine_version: String,
    pub osm_source: DataSource,
    pub gtfs_sources: Vec<DataSource>,
}

/// Build the routable graph for a place unless a current one exists.
///
/// `pivot_date` selects the service day the graph is built around; the
/// engine reads it from the source configuration, we only record it here.
pub async fn build_graph(
    jar_path: &Path,
    resources: &PlaceResources,
    pivot_date: NaiveDate,
    force_rebuild: bool,
    memory_gb: u32,
) -> Result<GraphResources> {
    let graph_dir = PathBuf::from(&resources.graph_dir);
    let graph_file = graph_dir.join(GRAPH_FILE);

    if graph_file.exists() && !force_rebuild {
        info!("Graph already built at {}, skipping", graph_file.display());
    } else {
        info!(
            "Building graph for place {} (pivot date {}) in {}",
            resources.place_id,
            pivot_date,
            graph_dir.display()
        );

        let status = Command::new("java")
            .arg(format!("-Xmx{}G", memory_gb))
            .arg("-jar")
            .arg(jar_path)
            .arg("--build")
            .arg("--save")
            .arg(&graph_dir)
            .status()
            .await?;

        if !status.success() {
            return Err(RouterError::GraphBuild(format!(
                "build process exited with {}",
                status
            )));
        }

        info!("Graph build finished: {}", graph_file.display());
    }

    let engine_version = engine_version(jar_path).await;

    Ok(GraphResources {
        graph_dir,
        engine_version,
        osm_source: resources.osm_source.0.clone(),
        gtfs_sources: resources.gtfs_sources.0.clone(),
    })
}

/// Ask the engine jar for its version string
async fn engine_version(jar_path: &Path) -> String {
    let output = Command::new("java")
        .arg("-jar")
        .arg(jar_path)
        .arg("--version")
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .next()
            .unwrap_or("unknown")
            .trim()
            .to_string(),
        _ => {
            warn!("Could not determine engine version");
            "unknown".to_string()
        }
    }
}

/// Handle on a running engine server process
pub struct EngineServer {
    child: Child,
}

impl EngineServer {
    /// Spawn the server bound to a previously built graph.
    ///
    /// The returned handle is not ready for requests yet; call
    /// [`EngineServer::wait_ready`] before routing against it.
    pub fn start(jar_path: &Path, graph_dir: &Path, memory_gb: u32) -> Result<Self> {
        info!("Starting engine server on graph {}", graph_dir.display());

        let child = Command::new("java")
            .arg(format!("-Xmx{}G", memory_gb))
            .arg("-jar")
            .arg(jar_path)
            .arg("--load")
            .arg(graph_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        Ok(Self { child })
    }

    /// Block until the server prints its ready marker.
    ///
    /// EOF before the marker means the process died during startup, which
    /// aborts the run.
    pub async fn wait_ready(&mut self) -> Result<()> {
        let stdout = self
            .child
            .stdout
            .take()
            .ok_or_else(|| RouterError::ServerStartup("stdout not captured".to_string()))?;

        let mut reader = BufReader::new(stdout);
        scan_for_marker(&mut reader, READY_MARKER).await?;

        // Keep draining stdout so the server never blocks on a full pipe
        tokio::spawn(async move {
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("engine: {}", line);
            }
        });

        info!("Engine server ready");
        Ok(())
    }

    /// Stop the server with a graceful interrupt and await process exit
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Terminating engine server...");

        if let Some(pid) = self.child.id() {
            // SIGINT lets the engine flush and close the graph cleanly
            let _ = Command::new("kill")
                .arg("-INT")
                .arg(pid.to_string())
                .status()
                .await;

            match tokio::time::timeout(Duration::from_secs(30), self.child.wait()).await {
                Ok(status) => {
                    info!("Engine server exited with {:?}", status.ok());
                    return Ok(());
                }
                Err(_) => warn!("Engine server ignored interrupt, killing"),
            }
        }

        self.child.kill().await?;
        Ok(())
    }
}

/// Read lines until one contains `marker`; error on EOF
async fn scan_for_marker<R: AsyncBufRead + Unpin>(reader: &mut R, marker: &str) -> Result<()> {
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        debug!("engine: {}", line);
        if line.contains(marker) {
            return Ok(());
        }
    }

    Err(RouterError::ServerStartup(format!(
        "process output ended before \"{}\"",
        marker
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_finds_marker() {
        let output = b"Loading graph...\nGraph loaded.\nGrizzly server running.\n" as &[u8];
        let mut reader = BufReader::new(output);
        assert!(scan_for_marker(&mut reader, READY_MARKER).await.is_ok());
    }

    #[tokio::test]
    async fn test_scan_errors_on_eof() {
        let output = b"Loading graph...\nOutOfMemoryError\n" as &[u8];
        let mut reader = BufReader::new(output);
        let err = scan_for_marker(&mut reader, READY_MARKER).await.unwrap_err();
        assert!(matches!(err, RouterError::ServerStartup(_)));
    }

    #[tokio::test]
    async fn test_scan_matches_mid_line() {
        let output = b"2024-01-01 INFO Grizzly server running. (port 8080)\n" as &[u8];
        let mut reader = BufReader::new(output);
        assert!(scan_for_marker(&mut reader, READY_MARKER).await.is_ok());
    }
}
