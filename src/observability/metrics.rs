//! Metrics for normalization runs.
//!
//! Recording is always on; nothing is exported unless [`init`] installed a
//! Prometheus recorder, in which case [`render`] produces the text format.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    NormalizeFilesProcessed,
    NormalizeFilesFailed,
    NormalizeWarnings,
    NormalizeMissingDirs,
    NormalizeRunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NormalizeFilesProcessed => "rules_normalize_files_processed_total",
            MetricName::NormalizeFilesFailed => "rules_normalize_files_failed_total",
            MetricName::NormalizeWarnings => "rules_normalize_warnings_total",
            MetricName::NormalizeMissingDirs => "rules_normalize_missing_dirs_total",
            MetricName::NormalizeRunDuration => "rules_normalize_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Render all recorded metrics in Prometheus text format, if initialized
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod normalize {
    use super::MetricName;

    pub fn file_processed() {
        ::metrics::counter!(MetricName::NormalizeFilesProcessed.as_str()).increment(1);
    }

    pub fn file_failed() {
        ::metrics::counter!(MetricName::NormalizeFilesFailed.as_str()).increment(1);
    }

    pub fn warning_logged(kind: &'static str) {
        ::metrics::counter!(MetricName::NormalizeWarnings.as_str(), "kind" => kind).increment(1);
    }

    pub fn missing_dir() {
        ::metrics::counter!(MetricName::NormalizeMissingDirs.as_str()).increment(1);
    }

    pub fn run_duration(secs: f64) {
        ::metrics::histogram!(MetricName::NormalizeRunDuration.as_str()).record(secs);
    }
}
