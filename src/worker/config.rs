//! Worker pool configuration

use std::time::Duration;

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent worker tasks
    pub worker_count: usize,

    /// Consecutive failures before a worker stops claiming
    pub breaker_threshold: u32,

    /// How long a running job may sit without a terminal update before the
    /// reclaimer hands it back out
    pub lease_timeout: Duration,

    /// Request delay-simulated itineraries from the engine
    pub use_delays: bool,

    /// Minimum time between progress lines from the reporting worker
    pub progress_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            breaker_threshold: 5,
            lease_timeout: Duration::from_secs(300), // 5 minutes
            use_delays: true,
            progress_interval: Duration::from_secs(1),
        }
    }
}

impl WorkerConfig {
    /// Create a new config builder
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }
}

/// Builder for WorkerConfig
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set the number of worker tasks
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count.max(1);
        self
    }

    /// Set the circuit breaker threshold
    pub fn breaker_threshold(mut self, threshold: u32) -> Self {
        self.config.breaker_threshold = threshold.max(1);
        self
    }

    /// Set the stale-job lease timeout
    pub fn lease_timeout(mut self, timeout: Duration) -> Self {
        self.config.lease_timeout = timeout;
        self
    }

    /// Enable/disable delay simulation
    pub fn use_delays(mut self, use_delays: bool) -> Self {
        self.config.use_delays = use_delays;
        self
    }

    /// Build the config
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}

impl Default for WorkerConfigBuilder {
    fn default() -> Self {
        Self {
            config: WorkerConfig::default(),
        }
    }
}
