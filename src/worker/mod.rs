//! Worker pool module
//!
//! This module provides:
//! - WorkerPool: N concurrent claim/process/commit loops over the job queue
//! - JobProcessor/RouteProcessor: the per-job work behind each claim
//! - WorkerConfig: pool size, breaker threshold, lease timeout

pub mod config;
pub mod pool;
pub mod processor;

pub use config::WorkerConfig;
pub use pool::{WorkerOutcome, WorkerPool};
pub use processor::{JobProcessor, RouteProcessor};
