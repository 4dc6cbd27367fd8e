//! pinwheel - rotation selection for scheduled media posting
//!
//! Each invocation picks one item from a catalog of media files so that the
//! whole catalog is shown before anything repeats, consecutive picks avoid
//! the same episode, and seasonal items appear only in their months. State
//! between invocations lives in two small JSON documents.
//!
//! # Architecture
//!
//! - [`catalog`] - Enumerating items and resolving their locations
//! - [`rotation`] - Episode tagging, seasonal filtering, exclusion memory,
//!   clustering guard, and the end-to-end engine
//! - [`storage`] - Bounded, versioned JSON persistence
//! - [`analytics`] - Read-only catalog reports
//! - [`config`] - Configuration management and settings
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use chrono::Local;
//! use pinwheel::catalog::DirectoryCatalog;
//! use pinwheel::config::Config;
//! use pinwheel::rotation::RotationEngine;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!
//!     let engine = RotationEngine::new(&config);
//!     let catalog = DirectoryCatalog::from(&config.catalog);
//!     let result = engine.run(&catalog, Local::now().date_naive(), None, &mut rand::thread_rng())?;
//!     println!("{}", result.absolute_location.display());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod error;
pub mod rotation;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{CatalogSource, DirectoryCatalog, StaticCatalog};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::rotation::{RotationEngine, SelectionResult, SelectionStage};
    pub use crate::storage::{JsonStore, RecentEmissionsLog};
}

// Direct re-exports for convenience
pub use rotation::{identify, RotationEngine, SelectionResult};
