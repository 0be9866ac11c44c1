use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::constants::DATA_EXTENSION;
use crate::error::{NormalizeError, Result};

/// An entry that could not be visited while listing a directory
#[derive(Debug)]
pub struct ListingFailure {
    pub path: PathBuf,
    pub error: NormalizeError,
}

/// Data files found under one directory, plus the entries the walk had to skip
#[derive(Debug, Default)]
pub struct Listing {
    pub files: Vec<PathBuf>,
    pub failures: Vec<ListingFailure>,
}

/// File-system boundary of a normalization run
pub trait Storage: Send + Sync {
    fn dir_exists(&self, dir: &Path) -> bool;

    /// Recursively list data files under `dir`, sorted, skipping anything under `exclude`.
    ///
    /// An unreadable entry is reported in `failures` and the walk carries on.
    fn list_data_files(&self, dir: &Path, exclude: &Path) -> Listing;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `contents` to `path`, creating parent directories as needed
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    fn create_dir_all(&self, dir: &Path) -> Result<()>;
}

fn is_data_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(DATA_EXTENSION)
}

/// Storage backed by the local file system
#[derive(Debug, Default, Clone)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn dir_exists(&self, dir: &Path) -> bool {
        dir.is_dir()
    }

    fn list_data_files(&self, dir: &Path, exclude: &Path) -> Listing {
        let mut listing = Listing::default();
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !entry.path().starts_with(exclude));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_data_file(entry.path()) {
                        listing.files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    listing.failures.push(ListingFailure {
                        path,
                        error: NormalizeError::Walk(e),
                    });
                }
            }
        }
        listing
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn create_dir_all(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|source| NormalizeError::OutputRoot {
            path: dir.to_path_buf(),
            source,
        })
    }
}

/// In-memory storage implementation for development/testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, as if it had been authored on disk
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), contents.into());
        }
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().ok().and_then(|files| files.get(path).cloned())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Storage for InMemoryStorage {
    fn dir_exists(&self, dir: &Path) -> bool {
        self.paths().iter().any(|p| p.starts_with(dir) && p != dir)
    }

    fn list_data_files(&self, dir: &Path, exclude: &Path) -> Listing {
        Listing {
            files: self
                .paths()
                .into_iter()
                .filter(|p| p.starts_with(dir) && !p.starts_with(exclude) && is_data_file(p))
                .collect(),
            failures: Vec::new(),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| {
            NormalizeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.insert(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}
