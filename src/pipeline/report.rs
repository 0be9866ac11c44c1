use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::processing::normalize::Warning;

/// Outcome of one successfully normalized file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub file: String,
    pub out: String,
    pub warnings_count: usize,
    pub warnings: Vec<Warning>,
}

/// A file that could not be read, parsed or written
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// A warning attributed to the file that raised it
#[derive(Debug, Clone, Serialize)]
pub struct FileWarning {
    pub file: String,
    pub warning: Warning,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub files: usize,
    pub normalized_files: usize,
}

/// Summary of one normalization run, persisted as `report.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processed: Vec<ProcessedFile>,
    pub errors: Vec<FileError>,
    pub warnings: Vec<FileWarning>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            processed: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: RunStats::default(),
        }
    }

    /// Count a discovered file before it is attempted
    pub fn record_discovered(&mut self) {
        self.stats.files += 1;
    }

    pub fn record_success(&mut self, file: String, out: String, warnings: Vec<Warning>) {
        self.warnings.extend(warnings.iter().map(|w| FileWarning {
            file: file.clone(),
            warning: w.clone(),
        }));
        self.processed.push(ProcessedFile {
            file,
            out,
            warnings_count: warnings.len(),
            warnings,
        });
        self.stats.normalized_files += 1;
    }

    pub fn record_error(&mut self, file: String, error: impl ToString) {
        self.errors.push(FileError {
            file,
            error: error.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
