use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// `[observability]`: how cleanup runs are logged and counted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ObservabilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.metrics.validate()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// `[observability.logging]`. `RUST_LOG`, when set, overrides `level` and `filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Attach source file and line to every event.
    #[serde(default)]
    pub file_line: bool,

    /// Extra `EnvFilter` directives appended after `level`,
    /// e.g. `"dataset_cleaner::index=debug"`.
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            timestamps: true,
            file_line: false,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The directive this level contributes to an `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// One JSON object per line, with span fields flattened in.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// Metrics
// ─────────────────────────────────────────────────────────────────────────────

/// `[observability.metrics]`. Ignored unless built with the `prometheus` feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Serve a scrape endpoint here, e.g. `"0.0.0.0:9464"`. Without it the
    /// recorder is in-process only and the binary logs a snapshot on exit.
    #[serde(default)]
    pub prometheus_listen: Option<SocketAddr>,

    /// Buckets for every `*_duration_seconds` histogram.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets_secs: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prometheus_listen: None,
            duration_buckets_secs: default_duration_buckets(),
        }
    }
}

impl MetricsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_buckets_secs.is_empty() {
            return Err(ConfigError::Validation(
                "observability.metrics.duration_buckets_secs cannot be empty".into(),
            ));
        }
        if self
            .duration_buckets_secs
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(ConfigError::Validation(
                "observability.metrics.duration_buckets_secs must be strictly increasing".into(),
            ));
        }
        Ok(())
    }
}

/// Index deletes are sub-second; a large dataset's row deletes can take minutes.
fn default_duration_buckets() -> Vec<f64> {
    vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]
}

fn default_true() -> bool {
    true
}
