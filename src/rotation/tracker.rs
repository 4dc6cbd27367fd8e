//! Bounded anti-repeat memory
//!
//! The tracker remembers fingerprints of recently emitted items within the
//! current cycle. Its capacity is a fraction of the eligible pool, capped at
//! an absolute ceiling, so the persisted state stays small no matter how large
//! the catalog grows. When every eligible item is excluded the cycle is
//! complete and the state resets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::storage::PersistedDocument;

// ============================================================================
// Fingerprint
// ============================================================================

/// First 64 bits of the SHA-256 of an item identifier
///
/// Serialized as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint an item identifier
    pub fn of(item: &str) -> Self {
        let digest = Sha256::digest(item.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_string()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid fingerprint '{s}': expected 16 hex digits"));
        }
        u64::from_str_radix(&s, 16)
            .map(Self)
            .map_err(|e| format!("invalid fingerprint '{s}': {e}"))
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Sizing rules for the exclusion memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Fraction of the eligible pool remembered
    pub exclusion_fraction: f64,

    /// Absolute cap on remembered fingerprints
    pub exclusion_ceiling: usize,

    /// Pools up to this size are remembered completely
    pub full_memory_threshold: usize,

    /// Eligible-size change that forces a reset
    pub drift_threshold: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            exclusion_fraction: 0.15,
            exclusion_ceiling: 2000,
            full_memory_threshold: 100,
            drift_threshold: 50,
        }
    }
}

impl RotationPolicy {
    /// Number of fingerprints kept for a pool of `eligible_count` items
    pub fn cycle_size(&self, eligible_count: usize) -> usize {
        let proportional = (eligible_count as f64 * self.exclusion_fraction).floor() as usize;
        let small_pool = eligible_count.min(self.full_memory_threshold);
        proportional.max(small_pool).min(self.exclusion_ceiling)
    }
}

// ============================================================================
// Rotation State
// ============================================================================

/// Persisted tracker state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    /// Schema version
    pub format_version: u32,

    /// Fingerprints of recent emissions, oldest first
    pub recent_fingerprints: VecDeque<Fingerprint>,

    /// Eligible pool size when the current cycle began
    pub catalog_size_at_last_reset: usize,

    /// Emissions since the current cycle began
    pub cycle_emission_count: u64,

    /// When the current cycle began
    pub cycle_started_at: DateTime<Utc>,
}

impl RotationState {
    /// Create an empty state
    pub fn new() -> Self {
        Self {
            format_version: Self::FORMAT_VERSION,
            recent_fingerprints: VecDeque::new(),
            catalog_size_at_last_reset: 0,
            cycle_emission_count: 0,
            cycle_started_at: Utc::now(),
        }
    }

    /// Check if nothing has been recorded since creation or the last reset
    pub fn is_pristine(&self) -> bool {
        self.cycle_emission_count == 0 && self.recent_fingerprints.is_empty()
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistedDocument for RotationState {
    const FORMAT_VERSION: u32 = 2;
    const KIND: &'static str = "rotation state";

    fn fresh() -> Self {
        Self::new()
    }

    fn format_version(&self) -> u32 {
        self.format_version
    }

    fn entry_count(&self) -> usize {
        self.recent_fingerprints.len()
    }

    fn drop_oldest(&mut self, count: usize) -> usize {
        let n = count.min(self.recent_fingerprints.len());
        self.recent_fingerprints.drain(..n);
        n
    }
}

// ============================================================================
// Rotation Tracker
// ============================================================================

/// Why the tracker was reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum ResetReason {
    /// Every eligible item was excluded
    Exhausted,
    /// The eligible pool changed size by more than the drift threshold
    Drift { previous: usize, current: usize },
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("pool exhausted"),
            Self::Drift { previous, current } => {
                write!(f, "catalog drift ({previous} -> {current})")
            }
        }
    }
}

/// Exclusion memory over a [`RotationState`]
#[derive(Debug, Clone)]
pub struct RotationTracker {
    policy: RotationPolicy,
    state: RotationState,
}

impl RotationTracker {
    /// Wrap a loaded state
    pub fn new(policy: RotationPolicy, state: RotationState) -> Self {
        Self { policy, state }
    }

    /// Current state
    pub fn state(&self) -> &RotationState {
        &self.state
    }

    /// Mutable state, for persistence
    pub fn state_mut(&mut self) -> &mut RotationState {
        &mut self.state
    }

    /// Sizing policy
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Number of fingerprints kept for a pool of `eligible_count` items
    pub fn cycle_size(&self, eligible_count: usize) -> usize {
        self.policy.cycle_size(eligible_count)
    }

    /// Check if the item was emitted recently in this cycle
    pub fn is_excluded(&self, item: &str) -> bool {
        let fp = Fingerprint::of(item);
        self.state.recent_fingerprints.contains(&fp)
    }

    /// All remembered fingerprints
    pub fn exclusion_set(&self) -> HashSet<Fingerprint> {
        self.state.recent_fingerprints.iter().copied().collect()
    }

    /// Check if the pool size moved too far from the size at the last reset
    pub fn drift(&self, eligible_count: usize) -> Option<ResetReason> {
        if self.state.is_pristine() {
            return None;
        }
        let previous = self.state.catalog_size_at_last_reset;
        (eligible_count.abs_diff(previous) > self.policy.drift_threshold).then_some(
            ResetReason::Drift {
                previous,
                current: eligible_count,
            },
        )
    }

    /// Clear the memory and start a new cycle
    pub fn reset(&mut self, eligible_count: usize, reason: ResetReason) {
        tracing::info!(
            reason = %reason,
            emitted = self.state.cycle_emission_count,
            eligible = eligible_count,
            "Starting new rotation cycle"
        );
        self.state.recent_fingerprints.clear();
        self.state.catalog_size_at_last_reset = eligible_count;
        self.state.cycle_emission_count = 0;
        self.state.cycle_started_at = Utc::now();
    }

    /// Remember an emitted item, dropping the oldest beyond the cap
    pub fn record_emission(&mut self, item: &str, eligible_count: usize) {
        if self.state.is_pristine() {
            self.state.catalog_size_at_last_reset = eligible_count;
        }
        self.state.recent_fingerprints.push_back(Fingerprint::of(item));
        self.state.cycle_emission_count += 1;
        self.enforce_cap(eligible_count);
    }

    /// Trim the memory to the cap for the given pool size
    pub fn enforce_cap(&mut self, eligible_count: usize) {
        let cap = self.cycle_size(eligible_count);
        let excess = self.state.recent_fingerprints.len().saturating_sub(cap);
        if excess > 0 {
            self.state.recent_fingerprints.drain(..excess);
        }
    }
}
