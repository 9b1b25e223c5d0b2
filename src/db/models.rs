//! Database models for the route calculation schema

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

// ============================================================================
// Route calculation jobs
// ============================================================================

/// RouteJob - Matches route_jobs table
///
/// At most one job exists per (vc_id, sim_id), enforced by a unique index.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RouteJob {
    pub id: i32,
    pub vc_id: String,
    pub sim_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl RouteJob {
    /// The status column as the closed enum; `None` for unknown values
    pub fn job_status(&self) -> Option<JobStatus> {
        JobStatus::parse(&self.status)
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "done" => Some(JobStatus::Done),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }
}

// ============================================================================
// Virtual commuters
// ============================================================================

/// VirtualCommuter - Matches virtual_commuters table
///
/// Immutable input owned by the upstream population generator.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VirtualCommuter {
    pub vc_id: String,
    pub sim_id: String,
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,
    pub departure: DateTime<Utc>,
    pub has_vehicle: bool,
    pub age: Option<i32>,
    pub employed: Option<bool>,
    /// Commuters flagged non-routable get their job closed without results.
    pub routable: bool,
}

/// Traveller attributes carried into the option summary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traveller {
    pub vc_id: String,
    pub has_vehicle: bool,
    pub age: Option<i32>,
    pub employed: Option<bool>,
}

impl Traveller {
    pub fn from_commuter(vc: &VirtualCommuter) -> Self {
        Self {
            vc_id: vc.vc_id.clone(),
            has_vehicle: vc.has_vehicle,
            age: vc.age,
            employed: vc.employed,
        }
    }
}

// ============================================================================
// Simulations and place resources
// ============================================================================

/// Simulation - Matches simulations table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Simulation {
    pub sim_id: String,
    pub place_id: String,
    pub pivot_date: NaiveDate,
}

/// Geographic/transit source datasets for one place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub source: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// PlaceResources - Matches place_resources table
#[derive(Debug, Clone, FromRow)]
pub struct PlaceResources {
    pub place_id: String,
    pub osm_source: Json<DataSource>,
    pub gtfs_sources: Json<Vec<DataSource>>,
    pub graph_dir: String,
}

// ============================================================================
// Result documents
// ============================================================================

/// Provenance metadata attached to every raw result document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub osm_dataset_link: String,
    pub osm_dataset_date: String,
    pub gtfs: Vec<DataSource>,
    pub uses_delay_simulation: bool,
}
