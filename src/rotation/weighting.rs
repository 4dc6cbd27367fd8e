//! Recency-decayed weighting
//!
//! Weights are recomputed from the recent-emissions log on every invocation.
//! An episode that appeared `k` emissions ago (0 = newest) contributes
//! `decay^k` of penalty; an item's weight is `1 / (1 + penalty)`, so episodes
//! never seen in the log keep weight 1.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::collections::HashMap;

use super::episode::identify;
use crate::storage::RecentEmissionsLog;

/// Default per-step decay of the recency penalty
pub const DEFAULT_DECAY: f64 = 0.9;

fn episode_penalties(log: &RecentEmissionsLog, decay: f64) -> HashMap<&str, f64> {
    let mut penalties: HashMap<&str, f64> = HashMap::new();
    for (age, record) in log.recent(log.len()).enumerate() {
        *penalties.entry(record.episode.as_str()).or_insert(0.0) += decay.powi(age as i32);
    }
    penalties
}

/// Selection weight for a single item
pub fn weight(item: &str, log: &RecentEmissionsLog, decay: f64) -> f64 {
    let penalties = episode_penalties(log, decay);
    let penalty = penalties.get(identify(item).as_str()).copied().unwrap_or(0.0);
    1.0 / (1.0 + penalty)
}

/// Selection weights for a candidate list, in order
pub fn weights(items: &[&str], log: &RecentEmissionsLog, decay: f64) -> Vec<f64> {
    let penalties = episode_penalties(log, decay);
    items
        .iter()
        .map(|item| {
            let penalty = penalties.get(identify(item).as_str()).copied().unwrap_or(0.0);
            1.0 / (1.0 + penalty)
        })
        .collect()
}

/// Sample one candidate by recency-decayed weight
///
/// Falls back to a uniform choice if the weights cannot form a distribution.
pub fn choose_weighted<'a, R: Rng + ?Sized>(
    items: &[&'a str],
    log: &RecentEmissionsLog,
    decay: f64,
    rng: &mut R,
) -> Option<&'a str> {
    if items.is_empty() {
        return None;
    }
    let weights = weights(items, log, decay);
    match WeightedIndex::new(&weights) {
        Ok(dist) => Some(items[dist.sample(rng)]),
        Err(e) => {
            tracing::warn!(error = %e, "Degenerate weights, falling back to uniform choice");
            items.choose(rng).copied()
        }
    }
}
