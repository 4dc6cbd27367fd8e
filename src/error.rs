//! Unified error handling for the pinwheel crate
//!
//! Only input and configuration failures are surfaced to the caller of an invocation.
//! Corrupt state, persistence failures, degraded seasonal pools and
//! over-constrained candidate sets are recovered inside the engine and
//! reported through `tracing` instead.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum for failures surfaced to the caller

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The catalog is missing or empty (fatal for an invocation)
    Input,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short label used in logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the pinwheel crate
#[derive(Error, Debug)]
pub enum Error {
    /// The catalog source produced no items
    #[error("Catalog is empty: no recognized media files in {source_desc}")]
    EmptyCatalog { source_desc: String },

    /// The catalog location could not be enumerated at all
    #[error("Cannot read catalog at {}: {source}", path.display())]
    CatalogUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Internal invariant broken
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an empty-catalog error
    pub fn empty_catalog(source_desc: impl Into<String>) -> Self {
        Self::EmptyCatalog {
            source_desc: source_desc.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other(context.into())
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyCatalog { .. } | Self::CatalogUnreadable { .. } => ErrorCategory::Input,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other(_) => ErrorCategory::Other,
        }
    }

    /// Check if a later invocation could plausibly succeed without operator action
    pub fn is_recoverable(&self) -> bool {
        // mount may come back
        matches!(self, Self::CatalogUnreadable { .. })
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let err = Error::empty_catalog("./queue");
        assert_eq!(err.category(), ErrorCategory::Input);

        let err = Error::other("selection ladder exhausted");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.to_string(), "selection ladder exhausted");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(!Error::empty_catalog("./queue").is_recoverable());

        let unreadable = Error::CatalogUnreadable {
            path: PathBuf::from("/missing"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(unreadable.is_recoverable());
        assert_eq!(unreadable.category().label(), "input");
    }

    #[test]
    fn test_empty_catalog_message() {
        let err = Error::empty_catalog("./imagequeue");
        assert!(err.to_string().contains("./imagequeue"));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("window must be positive");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
        assert_eq!(err.category().label(), "config");
    }
}
