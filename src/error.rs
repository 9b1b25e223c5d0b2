//! Error types for vc-router

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("No route found for any mode combination")]
    NoRouteFound,

    #[error("Routing engine request failed: {0}")]
    EngineError(#[from] reqwest::Error),

    #[error("Routing engine returned HTTP {status}")]
    EngineStatusError { status: u16 },

    #[error("Routing engine server failed to start: {0}")]
    ServerStartup(String),

    #[error("Graph build failed: {0}")]
    GraphBuild(String),

    #[error("Simulation not found: {0}")]
    SimulationNotFound(String),

    #[error("Place resources not found for place: {0}")]
    PlaceResourcesNotFound(String),

    #[error("Virtual commuter not found: {0}")]
    CommuterNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RouterError>;
