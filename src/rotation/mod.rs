//! Rotation selection
//!
//! Picks one item per invocation from a catalog so that, over time, every
//! item is shown before any repeats, consecutive picks avoid the same
//! episode, and seasonal content only appears in its months.
//!
//! # Pipeline
//!
//! 1. [`seasonal`] narrows the catalog to today's eligible pool
//! 2. [`tracker`] removes items already shown in the current cycle
//! 3. [`clustering`] removes items whose episode was shown recently,
//!    relaxing in stages when that leaves nothing
//! 4. [`selector`] draws one candidate, uniformly or by [`weighting`]
//!
//! [`engine`] wraps the pipeline with loading and saving of state.

pub mod clustering;
pub mod engine;
pub mod episode;
pub mod seasonal;
pub mod selector;
pub mod tracker;
pub mod weighting;

pub use clustering::{ClusteringConfig, ClusteringGuard, SelectionStage};
pub use engine::{status_line, Diagnostics, RotationEngine, SelectionResult};
pub use episode::{identify, EpisodeTag};
pub use seasonal::{EligiblePool, SeasonalGroup, SeasonalMode, SeasonalRules};
pub use selector::{
    commit, excluded_percent, SelectionConfig, SelectionPlan, SelectionStrategy, Selector,
};
pub use tracker::{Fingerprint, ResetReason, RotationPolicy, RotationState, RotationTracker};
