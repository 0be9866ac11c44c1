pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod storage;

pub use config::{FileConfig, RunConfig};
pub use error::{NormalizeError, Result};
pub use pipeline::normalize::{normalize_document, normalize_effect, normalize_file, Context, Warning};
pub use pipeline::{Orchestrator, RunReport};
