//! Prometheus metrics for dataset cleanup.
//!
//! Provides metrics for:
//! - Cleanup runs, failures by kind, and rows deleted per resource
//! - Index backend operations (vector and keyword)
//! - Queue backpressure (dropped tasks)

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, histogram};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Global Prometheus handle for in-process rendering.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
///
/// With `prometheus_listen` set, the exporter serves a scrape endpoint on that
/// address and must be called from within a Tokio runtime.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Suffix("_duration_seconds".to_string()),
            &config.duration_buckets_secs,
        )
        .map_err(|e| MetricsError::Setup(e.to_string()))?;

    match config.prometheus_listen {
        Some(addr) => {
            builder.with_http_listener(addr).install()?;
            tracing::info!(listen = %addr, "Prometheus exporter listening");
        }
        None => {
            let handle = builder.install_recorder()?;
            PROMETHEUS_HANDLE
                .set(handle)
                .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;
        }
    }

    Ok(())
}

/// Initialize the metrics system (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Only set when the recorder was installed without an HTTP listener.
#[cfg(feature = "prometheus")]
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record the outcome of one dataset cleanup run.
pub fn record_cleanup_run(status: &str, duration_secs: f64) {
    #[cfg(feature = "prometheus")]
    {
        counter!("dataset_cleanup_runs_total", "status" => status.to_string()).increment(1);
        histogram!("dataset_cleanup_duration_seconds", "status" => status.to_string())
            .record(duration_secs);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (status, duration_secs);
    }
}

/// Record a failed cleanup run by error kind.
pub fn record_cleanup_error(kind: &str) {
    #[cfg(feature = "prometheus")]
    counter!("dataset_cleanup_errors_total", "kind" => kind.to_string()).increment(1);
    #[cfg(not(feature = "prometheus"))]
    let _ = kind;
}

/// Record rows deleted by a cleanup run.
///
/// `resource` is one of `documents`, `segments`, `process_rules`, `queries`, `app_joins`.
pub fn record_cleanup_deletions(resource: &str, count: u64) {
    #[cfg(feature = "prometheus")]
    {
        if count > 0 {
            counter!("dataset_cleanup_deletions_total", "resource" => resource.to_string())
                .increment(count);
        }
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (resource, count);
    }
}

/// Record a cleanup task dropped because the queue was full.
pub fn record_task_dropped() {
    #[cfg(feature = "prometheus")]
    counter!("dataset_cleanup_tasks_dropped_total").increment(1);
}

/// Record an index backend operation.
pub fn record_index_operation(backend: &str, operation: &str, status: &str, duration_secs: f64) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "index_operations_total",
            "backend" => backend.to_string(),
            "operation" => operation.to_string(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            "index_operation_duration_seconds",
            "backend" => backend.to_string(),
            "operation" => operation.to_string()
        )
        .record(duration_secs);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (backend, operation, status, duration_secs);
    }
}

/// Metrics initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}
