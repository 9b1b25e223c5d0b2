//! Database module for vc-router
//!
//! PostgreSQL operations for the job queue, commuter population,
//! simulation context, and result documents. See schema.sql for the tables.

pub mod commuters;
pub mod connection;
pub mod jobs;
pub mod models;
pub mod results;
pub mod simulations;

pub use connection::{create_pool, create_pool_from_env, DbPool};
pub use models::*;
