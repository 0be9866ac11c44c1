use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::RunConfig;
use crate::constants::REPORT_FILE_NAME;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::normalize::{normalize_document, Context, NormalizedDocument};
use crate::pipeline::report::RunReport;
use crate::storage::Storage;

/// Drives one normalization run over the configured input directories
pub struct Orchestrator {
    config: RunConfig,
    storage: Arc<dyn Storage>,
}

impl Orchestrator {
    pub fn new(config: RunConfig, storage: Arc<dyn Storage>) -> Self {
        Self { config, storage }
    }

    /// Run every input directory, then persist `report.json` under the output root.
    ///
    /// Per-file failures land in the report. Only an invalid configuration, an
    /// output root that cannot be created, or a report that cannot be written
    /// abort the run.
    pub fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let out_root = self.config.out_root();
        self.storage.create_dir_all(&out_root)?;

        info!(
            "🚀 Starting normalization of {} input dir(s) into {}",
            self.config.input_dirs.len(),
            out_root.display()
        );

        let mut report = RunReport::new();
        for dir in &self.config.input_dirs {
            if dir.trim().is_empty() {
                continue;
            }
            self.process_dir(dir, &out_root, &mut report);
        }
        report.finish();

        if let Some(duration) = report.duration() {
            metrics::normalize::run_duration(duration.num_milliseconds() as f64 / 1000.0);
        }

        let report_path = out_root.join(REPORT_FILE_NAME);
        let body = serde_json::to_string_pretty(&report)?;
        self.storage.write(&report_path, &body)?;

        info!(
            "✅ Normalized {}/{} files ({} warnings, {} errors); report at {}",
            report.stats.normalized_files,
            report.stats.files,
            report.warnings.len(),
            report.errors.len(),
            report_path.display()
        );
        Ok(report)
    }

    #[instrument(skip(self, out_root, report))]
    fn process_dir(&self, dir: &str, out_root: &Path, report: &mut RunReport) {
        let dir_path = self.config.root.join(dir);
        if !self.storage.dir_exists(&dir_path) {
            warn!("Input directory {} not found, skipping", dir_path.display());
            metrics::normalize::missing_dir();
            return;
        }

        let listing = self.storage.list_data_files(&dir_path, out_root);
        debug!("Found {} data file(s) in {}", listing.files.len(), dir_path.display());

        for failure in listing.failures {
            error!("Failed to read {}: {}", failure.path.display(), failure.error);
            metrics::normalize::file_failed();
            report.record_error(self.relative(&failure.path), failure.error);
        }

        for path in listing.files {
            let rel = self.relative(&path);
            report.record_discovered();
            match self.process_file(&path, &rel, out_root) {
                Ok(doc) => {
                    for warning in &doc.warnings {
                        debug!(kind = warning.kind(), file = %rel, "normalization warning");
                        metrics::normalize::warning_logged(warning.kind());
                    }
                    metrics::normalize::file_processed();
                    let out = format!("{}/{}", self.config.out_dir.trim_end_matches('/'), rel);
                    report.record_success(rel, out, doc.warnings);
                }
                Err(e) => {
                    error!("Failed to normalize {}: {}", rel, e);
                    metrics::normalize::file_failed();
                    report.record_error(rel, e);
                }
            }
        }
    }

    #[instrument(skip(self, path, out_root))]
    fn process_file(&self, path: &Path, rel: &str, out_root: &Path) -> Result<NormalizedDocument> {
        let text = self.storage.read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;

        let ctx = Context::for_file(rel).with_source(self.config.source.clone());
        let doc = normalize_document(&value, &ctx);

        let body = serde_json::to_string_pretty(&doc.value)?;
        self.storage.write(&out_root.join(rel), &body)?;
        Ok(doc)
    }

    /// Path relative to the run root, with `/` separators
    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.config.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}
