use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Cleanup queue and worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Maximum number of cleanup tasks waiting to run.
    /// Tasks enqueued beyond this are dropped with a warning.
    /// Default: 1000
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long to wait for queued tasks to drain on shutdown (in seconds).
    /// Default: 30
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl WorkerConfig {
    /// Get the shutdown timeout as a Duration.
    pub fn shutdown_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "worker.queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}
