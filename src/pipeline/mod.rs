// Normalization pipeline: processing engine, run orchestration, and reporting

pub mod orchestrator;
pub mod processing;
pub mod report;

// Re-export key types from each stage
pub use orchestrator::Orchestrator;
pub use processing::normalize;
pub use report::{RunReport, RunStats};
