//! Catalog sources
//!
//! A catalog is the ordered list of item identifiers visible to one
//! invocation. It is enumerated fresh every run and never persisted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions recognized by default (case-insensitive)
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Catalog location settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding the media files
    pub directory: PathBuf,

    /// Recognized file extensions, without the dot
    pub extensions: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("imagequeue"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Something that can enumerate catalog items and resolve their location
pub trait CatalogSource {
    /// All item identifiers, in a stable order
    fn list(&self) -> Result<Vec<String>>;

    /// Absolute location of an item
    fn locate(&self, identifier: &str) -> PathBuf;

    /// Short description for error messages
    fn describe(&self) -> String;
}

/// Check if a file name ends in one of the recognized extensions
pub fn has_media_extension(name: &str, extensions: &[String]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Media files in a single directory
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryCatalog {
    /// Create a catalog over `root` with the default extensions
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Set recognized extensions
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Catalog root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl From<&CatalogConfig> for DirectoryCatalog {
    fn from(config: &CatalogConfig) -> Self {
        Self::new(&config.directory).with_extensions(config.extensions.clone())
    }
}

impl CatalogSource for DirectoryCatalog {
    fn list(&self) -> Result<Vec<String>> {
        let unreadable = |source| Error::CatalogUnreadable {
            path: self.root.clone(),
            source,
        };

        let mut items = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(unreadable)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        root = %self.root.display(),
                        error = %e,
                        "Skipping unreadable catalog entry"
                    );
                    continue;
                }
            };

            // Follows symlinks; dangling links are not files
            let is_file = fs::metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %entry.path().display(), "Skipping non-UTF-8 file name");
                continue;
            };

            if has_media_extension(&name, &self.extensions) {
                items.push(name);
            }
        }

        items.sort();
        tracing::debug!(root = %self.root.display(), items = items.len(), "Catalog enumerated");
        Ok(items)
    }

    fn locate(&self, identifier: &str) -> PathBuf {
        let path = self.root.join(identifier);
        std::path::absolute(&path).unwrap_or(path)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Fixed in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    root: PathBuf,
    items: Vec<String>,
}

impl StaticCatalog {
    /// Create a catalog from a list of identifiers
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: PathBuf::from("/"),
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the root used by [`CatalogSource::locate`]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

impl CatalogSource for StaticCatalog {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.items.clone())
    }

    fn locate(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }

    fn describe(&self) -> String {
        format!("static catalog ({} items)", self.items.len())
    }
}
