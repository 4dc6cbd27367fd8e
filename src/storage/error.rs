//! Error types for the storage module

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while reading or writing persisted documents
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("I/O error during '{operation}' on {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Document could not be serialized
    #[error("Failed to serialize {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Document on disk exceeds the configured byte cap
    #[error("{} is {size} bytes, over the {limit} byte limit", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Document is not valid JSON or has missing/mistyped fields
    #[error("{} failed validation: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    /// Document was written by an incompatible schema
    #[error("Unsupported format version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    /// Emergency shrink ran out of entries to drop
    #[error("{} still needs {size} bytes with no entries left to drop (limit {limit})", path.display())]
    CannotShrink { path: PathBuf, size: u64, limit: u64 },
}

impl StorageError {
    /// Create an I/O error with context
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        let err = StorageError::TooLarge {
            path: PathBuf::from("state/rotation_state.json"),
            size: 60_000,
            limit: 51_200,
        };
        let msg = err.to_string();
        assert!(msg.contains("rotation_state.json"));
        assert!(msg.contains("51200"));
    }

    #[test]
    fn test_is_recoverable() {
        let io_err = StorageError::io(
            "write",
            "state.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(io_err.is_recoverable());

        let version = StorageError::VersionMismatch {
            found: 1,
            expected: 2,
        };
        assert!(!version.is_recoverable());
    }
}
