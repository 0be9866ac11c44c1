use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{default_input_dirs, DEFAULT_OUT_DIR};
use crate::error::{NormalizeError, Result};

/// Explicit configuration for one normalization run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Directory the input dirs and the output dir are resolved against
    pub root: PathBuf,
    /// Ordered list of content directories to scan
    pub input_dirs: Vec<String>,
    /// Output root, relative to `root`
    pub out_dir: String,
    /// Declared source used when a record carries none of its own
    pub source: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            input_dirs: default_input_dirs(),
            out_dir: DEFAULT_OUT_DIR.to_string(),
            source: None,
        }
    }
}

/// Partial configuration as read from `normalize.toml`
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub input_dirs: Option<Vec<String>>,
    pub out_dir: Option<String>,
    pub source: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NormalizeError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: FileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields an empty configuration
    pub fn load_optional(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl RunConfig {
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Layer values from a config file over this configuration
    pub fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(dirs) = file.input_dirs {
            self.input_dirs = dirs;
        }
        if let Some(out_dir) = file.out_dir {
            self.out_dir = out_dir;
        }
        if file.source.is_some() {
            self.source = file.source;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dirs.iter().all(|d| d.trim().is_empty()) {
            return Err(NormalizeError::Config("no input directories configured".to_string()));
        }
        if self.out_dir.trim().is_empty() {
            return Err(NormalizeError::Config("output directory must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn out_root(&self) -> PathBuf {
        self.root.join(&self.out_dir)
    }
}
