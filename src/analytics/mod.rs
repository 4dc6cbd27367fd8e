//! Catalog analytics
//!
//! Read-only reports over a catalog; nothing here touches rotation state.

pub mod distribution;

pub use distribution::{DistributionReport, EpisodeCount, Shortfall};
