//! Bounded, versioned JSON persistence for engine state
//!
//! Every persisted artifact is a single pretty-printed JSON document capped at
//! a fixed byte size so it can be checked into version control between runs.
//!
//! # Recovery policy
//!
//! - Missing file: a fresh document is returned.
//! - Oversized, unreadable, malformed, or wrong-version file: a warning is
//!   logged and a fresh document is returned. [`JsonStore::try_load`] exposes
//!   the underlying [`StorageError`] for diagnostics.
//! - On save, the oldest entries are dropped until the serialized form fits.
//!
//! # Example
//!
//! ```no_run
//! use pinwheel::storage::{JsonStore, RecentEmissionsLog};
//!
//! let store = JsonStore::new("state/recent_emissions.json", 50 * 1024);
//! let mut log: RecentEmissionsLog = store.load();
//! // ... push records ...
//! store.save(&mut log)?;
//! # Ok::<(), pinwheel::storage::StorageError>(())
//! ```

pub mod error;
pub mod history;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use error::{StorageError, StorageResult};
pub use history::{EmissionRecord, RecentEmissionsLog, DEFAULT_HISTORY_CAPACITY};

/// Default byte cap for each persisted document (50 KiB)
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024;

/// A document that [`JsonStore`] can load, validate, and shrink
pub trait PersistedDocument: Serialize + DeserializeOwned {
    /// Schema version written by this build
    const FORMAT_VERSION: u32;

    /// Human-readable name used in log messages
    const KIND: &'static str;

    /// Freshly initialized document
    fn fresh() -> Self;

    /// Version recorded in the loaded document
    fn format_version(&self) -> u32;

    /// Number of droppable entries
    fn entry_count(&self) -> usize;

    /// Drop up to `count` of the oldest entries, returning how many were dropped
    fn drop_oldest(&mut self, count: usize) -> usize;
}

/// File-backed store for one [`PersistedDocument`]
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    max_bytes: u64,
}

impl JsonStore {
    /// Create a store for the given path and byte cap
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured byte cap
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check if the backing file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size of the backing file, if present
    pub fn size_on_disk(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }

    /// Load the document, reporting why it could not be used
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn try_load<D: PersistedDocument>(&self) -> StorageResult<Option<D>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io("stat", &self.path, e)),
        };

        if metadata.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                path: self.path.clone(),
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::io("read", &self.path, e))?;

        let doc: D = serde_json::from_str(&content).map_err(|e| StorageError::Invalid {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if doc.format_version() != D::FORMAT_VERSION {
            return Err(StorageError::VersionMismatch {
                found: doc.format_version(),
                expected: D::FORMAT_VERSION,
            });
        }

        tracing::debug!(
            path = %self.path.display(),
            kind = D::KIND,
            entries = doc.entry_count(),
            "Document loaded"
        );
        Ok(Some(doc))
    }

    /// Load the document, falling back to a fresh one on any problem
    pub fn load<D: PersistedDocument>(&self) -> D {
        match self.try_load::<D>() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                tracing::info!(
                    path = %self.path.display(),
                    kind = D::KIND,
                    "No saved document, starting fresh"
                );
                D::fresh()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    kind = D::KIND,
                    error = %e,
                    "Discarding unusable document, starting fresh"
                );
                D::fresh()
            }
        }
    }

    /// Serialize and atomically write the document, shrinking it to fit the cap
    ///
    /// Returns the number of bytes written.
    pub fn save<D: PersistedDocument>(&self, doc: &mut D) -> StorageResult<u64> {
        let json = self.fit_to_cap(doc)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io("create_dir", parent, e))?;
        }

        // Write to temp file first, then rename (atomic)
        let temp_path = temp_path_for(&self.path);
        fs::write(&temp_path, json.as_bytes())
            .map_err(|e| StorageError::io("write", &temp_path, e))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| StorageError::io("rename", &self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            kind = D::KIND,
            bytes = json.len(),
            "Document saved"
        );
        Ok(json.len() as u64)
    }

    fn fit_to_cap<D: PersistedDocument>(&self, doc: &mut D) -> StorageResult<String> {
        let mut dropped = 0usize;

        loop {
            let json = serde_json::to_string_pretty(doc).map_err(|e| {
                StorageError::Serialization {
                    path: self.path.clone(),
                    source: e,
                }
            })?;

            let size = json.len() as u64;
            if size <= self.max_bytes {
                if dropped > 0 {
                    tracing::warn!(
                        path = %self.path.display(),
                        kind = D::KIND,
                        dropped,
                        remaining = doc.entry_count(),
                        "Emergency shrink applied to fit byte cap"
                    );
                }
                return Ok(json);
            }

            let step = (doc.entry_count() / 10).max(1);
            let removed = doc.drop_oldest(step);
            if removed == 0 {
                return Err(StorageError::CannotShrink {
                    path: self.path.clone(),
                    size,
                    limit: self.max_bytes,
                });
            }
            dropped += removed;
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
