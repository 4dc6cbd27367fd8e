//! Selection planning
//!
//! Composes the seasonal filter, rotation tracker, and clustering guard into
//! a single decision. Planning is pure: it reads the tracker and the log but
//! changes neither. The resulting [`SelectionPlan`] is applied afterwards by
//! [`commit`].

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::clustering::{ClusteringGuard, SelectionStage};
use super::episode::identify;
use super::seasonal::{SeasonalMode, SeasonalRules};
use super::tracker::{Fingerprint, ResetReason, RotationTracker};
use super::weighting::{choose_weighted, DEFAULT_DECAY};
use crate::error::{Error, Result};
use crate::storage::{EmissionRecord, RecentEmissionsLog};

/// How the final candidate is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Every remaining candidate is equally likely
    Uniform,
    /// Candidates from recently seen episodes are less likely
    Weighted,
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => f.write_str("uniform"),
            Self::Weighted => f.write_str("weighted"),
        }
    }
}

/// Sampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Sampling strategy
    pub strategy: SelectionStrategy,

    /// Recency decay for the weighted strategy
    pub decay: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::Uniform,
            decay: DEFAULT_DECAY,
        }
    }
}

/// Outcome of planning one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPlan {
    /// Chosen item
    pub identifier: String,

    /// Episode tag of the chosen item
    pub episode: String,

    /// Ladder stage that produced the choice
    pub stage: SelectionStage,

    /// Reset to apply before recording, if any
    pub reset: Option<ResetReason>,

    /// Seasonal rule in force
    pub mode: SeasonalMode,

    /// Eligible pool size
    pub pool_size: usize,

    /// Eligible items excluded by the tracker before any reset
    pub excluded: usize,

    /// Candidates left at the chosen stage
    pub candidates: usize,
}

/// Share of an eligible pool that was excluded, in percent
pub fn excluded_percent(pool_size: usize, excluded: usize) -> f64 {
    if pool_size == 0 {
        return 0.0;
    }
    excluded as f64 / pool_size as f64 * 100.0
}

/// Decision procedure for one invocation
#[derive(Debug, Clone)]
pub struct Selector {
    seasonal: SeasonalRules,
    guard: ClusteringGuard,
    selection: SelectionConfig,
}

impl Selector {
    /// Create a selector
    pub fn new(seasonal: SeasonalRules, guard: ClusteringGuard, selection: SelectionConfig) -> Self {
        Self {
            seasonal,
            guard,
            selection,
        }
    }

    /// Seasonal rules in use
    pub fn seasonal(&self) -> &SeasonalRules {
        &self.seasonal
    }

    /// Clustering guard in use
    pub fn guard(&self) -> &ClusteringGuard {
        &self.guard
    }

    /// Decide which item to emit
    ///
    /// # Arguments
    /// * `catalog` - Every item visible to this invocation
    /// * `month` - Current calendar month (1-12)
    /// * `tracker` - Exclusion memory for the current cycle
    /// * `log` - Recent emissions, for the clustering guard
    /// * `previous` - Optional one-shot exclusion (the prior run's choice)
    /// * `rng` - Randomness source
    pub fn plan<R: Rng + ?Sized>(
        &self,
        catalog: &[String],
        month: u32,
        tracker: &RotationTracker,
        log: &RecentEmissionsLog,
        previous: Option<&str>,
        rng: &mut R,
    ) -> Result<SelectionPlan> {
        if catalog.is_empty() {
            return Err(Error::empty_catalog("catalog"));
        }

        // 1. seasonal eligibility
        let pool = self.seasonal.eligible(catalog, month);
        let pool_size = pool.len();

        // 2. rotation exclusions
        let exclusions = tracker.exclusion_set();
        let not_excluded: Vec<&str> = pool
            .items
            .iter()
            .map(String::as_str)
            .filter(|item| !exclusions.contains(&Fingerprint::of(item)))
            .collect();
        let excluded = pool_size - not_excluded.len();

        let mut reset = tracker.drift(pool_size);
        let mut available: Vec<&str> = if reset.is_some() {
            pool.items.iter().map(String::as_str).collect()
        } else {
            not_excluded
        };
        let before_hint = available.len();
        available.retain(|item| Some(*item) != previous);

        if available.is_empty() {
            if reset.is_none() {
                reset = Some(ResetReason::Exhausted);
            }
            available = pool.items.iter().map(String::as_str).collect();
            if available.len() > 1 {
                available.retain(|item| Some(*item) != previous);
            }
        } else if available.len() < before_hint {
            tracing::debug!(previous = ?previous, "Previous emission excluded");
        }

        // 3-6. clustering ladder
        for (stage, window) in self.guard.ladder() {
            let candidates = ClusteringGuard::filter(&available, log, window);
            if candidates.is_empty() {
                tracing::debug!(stage = %stage, window, "No candidates at stage");
                continue;
            }

            if stage != SelectionStage::Strict {
                tracing::info!(
                    stage = %stage,
                    window,
                    candidates = candidates.len(),
                    "Clustering over-constrained, relaxed"
                );
            }

            let Some(choice) = self.choose(&candidates, log, rng) else {
                continue;
            };

            return Ok(SelectionPlan {
                identifier: choice.to_string(),
                episode: identify(choice),
                stage,
                reset,
                mode: pool.mode,
                pool_size,
                excluded,
                candidates: candidates.len(),
            });
        }

        // The unconstrained stage keeps every available item, and `available`
        // is never empty for a non-empty pool.
        Err(Error::other("selection ladder exhausted without a candidate"))
    }

    fn choose<'a, R: Rng + ?Sized>(
        &self,
        candidates: &[&'a str],
        log: &RecentEmissionsLog,
        rng: &mut R,
    ) -> Option<&'a str> {
        match self.selection.strategy {
            SelectionStrategy::Uniform => candidates.choose(rng).copied(),
            SelectionStrategy::Weighted => {
                choose_weighted(candidates, log, self.selection.decay, rng)
            }
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(
            SeasonalRules::default(),
            ClusteringGuard::default(),
            SelectionConfig::default(),
        )
    }
}

/// Apply a plan: reset if required, then record the emission in both structures
pub fn commit(plan: &SelectionPlan, tracker: &mut RotationTracker, log: &mut RecentEmissionsLog) {
    if let Some(reason) = plan.reset {
        tracker.reset(plan.pool_size, reason);
    }
    tracker.record_emission(&plan.identifier, plan.pool_size);
    log.push(EmissionRecord::now(&plan.identifier, &plan.episode));
}
