//! Same-episode clustering guard
//!
//! Vetoes candidates whose episode tag matches one of the last few emissions,
//! independently of the rotation tracker. When the strict window eliminates
//! every candidate, selection walks down a fixed ladder of weaker stages that
//! ends in an unconstrained choice.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::episode::identify;
use crate::storage::RecentEmissionsLog;

/// Stage of the fallback ladder that produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStage {
    /// Full clustering window applied
    Strict,
    /// Only the most recent group(s) forbidden
    Relaxed,
    /// Clustering ignored
    Unconstrained,
}

impl fmt::Display for SelectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
            Self::Unconstrained => "unconstrained",
        };
        f.write_str(label)
    }
}

/// Clustering window settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Number of recent emissions inspected by the strict stage
    pub window: usize,

    /// Number of recent emissions inspected by the relaxed stage
    pub relaxed_window: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            window: 4,
            relaxed_window: 1,
        }
    }
}

/// Guard against consecutive emissions from the same episode
#[derive(Debug, Clone)]
pub struct ClusteringGuard {
    window: usize,
    relaxed_window: usize,
}

impl ClusteringGuard {
    /// Create a guard with the given strict window and a relaxed window of 1
    pub fn new(window: usize) -> Self {
        Self {
            window,
            relaxed_window: 1.min(window),
        }
    }

    /// Set the relaxed window (never wider than the strict window)
    pub fn with_relaxed_window(mut self, relaxed_window: usize) -> Self {
        self.relaxed_window = relaxed_window.min(self.window);
        self
    }

    /// Strict window
    pub fn window(&self) -> usize {
        self.window
    }

    /// Ordered fallback stages with the window each one inspects
    ///
    /// Windows never widen down the ladder, so each stage admits a superset of
    /// the previous stage's candidates.
    pub fn ladder(&self) -> [(SelectionStage, usize); 3] {
        [
            (SelectionStage::Strict, self.window),
            (SelectionStage::Relaxed, self.relaxed_window),
            (SelectionStage::Unconstrained, 0),
        ]
    }

    /// Episode tags of the last `window` emissions
    pub fn blocked_tags(log: &RecentEmissionsLog, window: usize) -> HashSet<&str> {
        log.recent(window).map(|r| r.episode.as_str()).collect()
    }

    /// Check the item against the strict window
    pub fn permits(&self, item: &str, log: &RecentEmissionsLog) -> bool {
        Self::permits_within(item, log, self.window)
    }

    /// Check the item against the last `window` emissions
    pub fn permits_within(item: &str, log: &RecentEmissionsLog, window: usize) -> bool {
        let target = identify(item);
        !log.recent(window).any(|r| r.episode == target)
    }

    /// Keep the candidates whose tag is not in the last `window` emissions
    pub fn filter<'a>(
        candidates: &[&'a str],
        log: &RecentEmissionsLog,
        window: usize,
    ) -> Vec<&'a str> {
        if window == 0 {
            return candidates.to_vec();
        }
        let blocked = Self::blocked_tags(log, window);
        if blocked.is_empty() {
            return candidates.to_vec();
        }
        candidates
            .iter()
            .copied()
            .filter(|item| !blocked.contains(identify(item).as_str()))
            .collect()
    }
}

impl From<&ClusteringConfig> for ClusteringGuard {
    fn from(config: &ClusteringConfig) -> Self {
        Self::new(config.window).with_relaxed_window(config.relaxed_window)
    }
}

impl Default for ClusteringGuard {
    fn default() -> Self {
        Self::from(&ClusteringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EmissionRecord;

    fn log_of(names: &[&str]) -> RecentEmissionsLog {
        let mut log = RecentEmissionsLog::default();
        for name in names {
            log.push(EmissionRecord::now(*name, identify(name)));
        }
        log
    }

    #[test]
    fn test_permits_rejects_recent_episode() {
        let guard = ClusteringGuard::new(3);
        let log = log_of(&["S01E01-a.jpg"]);

        assert!(!guard.permits("S01E01-b.jpg", &log));
        assert!(guard.permits("S02E02-a.jpg", &log));
    }

    #[test]
    fn test_window_limits_lookback() {
        let guard = ClusteringGuard::new(2);
        let log = log_of(&["S01E01-a.jpg", "S02E01.jpg", "S03E01.jpg"]);

        // S01E01 is three emissions back, outside a window of 2
        assert!(guard.permits("S01E01-b.jpg", &log));
        assert!(!guard.permits("S03E01-x.jpg", &log));
    }

    #[test]
    fn test_filter_and_relaxation() {
        let log = log_of(&["S01E01-a.jpg", "S02E02-a.jpg"]);
        let candidates = ["S01E01-b.jpg", "S02E02-b.jpg"];

        let strict = ClusteringGuard::filter(&candidates, &log, 3);
        assert!(strict.is_empty());

        let relaxed = ClusteringGuard::filter(&candidates, &log, 1);
        assert_eq!(relaxed, vec!["S01E01-b.jpg"]);

        let unconstrained = ClusteringGuard::filter(&candidates, &log, 0);
        assert_eq!(unconstrained.len(), 2);
    }

    #[test]
    fn test_ladder_never_widens() {
        let guard = ClusteringGuard::new(5).with_relaxed_window(9);
        let windows: Vec<usize> = guard.ladder().iter().map(|(_, w)| *w).collect();
        assert_eq!(windows, vec![5, 5, 0]);
    }

    #[test]
    fn test_empty_log_permits_everything() {
        let guard = ClusteringGuard::default();
        let log = RecentEmissionsLog::default();
        assert!(guard.permits("anything.jpg", &log));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(SelectionStage::Relaxed.to_string(), "relaxed");
    }
}
