//! Recent-emissions log
//!
//! Append-only record of the last emitted items, trimmed oldest-first once it
//! exceeds its capacity. Never reset: it outlives rotation cycles so the
//! clustering guard can see across cycle boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::PersistedDocument;

/// Default number of emissions kept in the log
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// One emitted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionRecord {
    /// Item identifier (file name)
    pub identifier: String,

    /// Episode tag derived at emission time
    pub episode: String,

    /// When the item was emitted
    pub emitted_at: DateTime<Utc>,
}

impl EmissionRecord {
    /// Create a record stamped with the current time
    pub fn now(identifier: impl Into<String>, episode: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            episode: episode.into(),
            emitted_at: Utc::now(),
        }
    }
}

/// Bounded log of recent emissions, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentEmissionsLog {
    /// Schema version
    pub format_version: u32,

    entries: VecDeque<EmissionRecord>,

    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl RecentEmissionsLog {
    /// Create an empty log with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            format_version: Self::FORMAT_VERSION,
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Change the capacity, trimming the oldest entries if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim();
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, discarding the oldest beyond capacity
    pub fn push(&mut self, record: EmissionRecord) {
        self.entries.push_back(record);
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All records, oldest first
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &EmissionRecord> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The last `window` records, newest first
    pub fn recent(&self, window: usize) -> impl Iterator<Item = &EmissionRecord> {
        self.entries.iter().rev().take(window)
    }

    /// Most recent record
    pub fn last(&self) -> Option<&EmissionRecord> {
        self.entries.back()
    }
}

impl Default for RecentEmissionsLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl PersistedDocument for RecentEmissionsLog {
    const FORMAT_VERSION: u32 = 1;
    const KIND: &'static str = "recent-emissions log";

    fn fresh() -> Self {
        Self::default()
    }

    fn format_version(&self) -> u32 {
        self.format_version
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn drop_oldest(&mut self, count: usize) -> usize {
        let n = count.min(self.entries.len());
        self.entries.drain(..n);
        n
    }
}
