//! Calendar-based eligibility rules
//!
//! Items whose names mention a seasonal keyword belong to that season's
//! group. In a group's months only that group is eligible; in every other
//! month all seasonal groups are held back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named group of items that is only eligible in certain months
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalGroup {
    /// Group name, reported in the status line
    pub name: String,

    /// Active months (1-12)
    pub months: Vec<u32>,

    /// Case-insensitive substrings that place an item in this group
    pub keywords: Vec<String>,
}

impl SeasonalGroup {
    /// Create a new group
    pub fn new(name: &str, months: &[u32], keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            months: months.to_vec(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Check if the item's identifier mentions one of this group's keywords
    pub fn matches(&self, item: &str) -> bool {
        let lower = item.to_lowercase();
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
    }

    /// Check if the group is active in the given month
    pub fn is_active_in(&self, month: u32) -> bool {
        self.months.contains(&month)
    }
}

/// Which rule produced an eligible pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "group")]
pub enum SeasonalMode {
    /// No group active: all non-seasonal items
    Default,
    /// A group is active: only its items
    Active(String),
    /// The rule selected nothing; the full catalog is used
    Degraded(Option<String>),
}

impl fmt::Display for SeasonalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Active(group) => f.write_str(group),
            Self::Degraded(Some(group)) => write!(f, "degraded({group})"),
            Self::Degraded(None) => f.write_str("degraded(default)"),
        }
    }
}

/// Catalog subset eligible right now
#[derive(Debug, Clone)]
pub struct EligiblePool {
    /// Eligible identifiers, in catalog order
    pub items: Vec<String>,

    /// Rule that produced the pool
    pub mode: SeasonalMode,
}

impl EligiblePool {
    /// Number of eligible items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is eligible
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The full set of seasonal groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalRules {
    /// Groups, checked in order during classification
    #[serde(default)]
    pub groups: Vec<SeasonalGroup>,
}

impl SeasonalRules {
    /// Rules with no seasonal groups: everything is always eligible
    pub fn none() -> Self {
        Self { groups: Vec::new() }
    }

    /// Create rules from groups
    pub fn new(groups: Vec<SeasonalGroup>) -> Self {
        Self { groups }
    }

    /// First group whose keywords match the item, if any
    pub fn classify(&self, item: &str) -> Option<&SeasonalGroup> {
        self.groups.iter().find(|g| g.matches(item))
    }

    /// Group active in the given month, if any
    pub fn active_group(&self, month: u32) -> Option<&SeasonalGroup> {
        self.groups.iter().find(|g| g.is_active_in(month))
    }

    /// Narrow the catalog to the items eligible in `month`
    pub fn eligible(&self, catalog: &[String], month: u32) -> EligiblePool {
        match self.active_group(month) {
            Some(group) => {
                let items: Vec<String> = catalog
                    .iter()
                    .filter(|item| self.classify(item).map(|g| g.name == group.name).unwrap_or(false))
                    .cloned()
                    .collect();

                if items.is_empty() {
                    tracing::warn!(
                        group = %group.name,
                        month,
                        "No items for active seasonal group, using full catalog"
                    );
                    return EligiblePool {
                        items: catalog.to_vec(),
                        mode: SeasonalMode::Degraded(Some(group.name.clone())),
                    };
                }

                tracing::debug!(group = %group.name, eligible = items.len(), "Seasonal group active");
                EligiblePool {
                    items,
                    mode: SeasonalMode::Active(group.name.clone()),
                }
            }
            None => {
                let items: Vec<String> = catalog
                    .iter()
                    .filter(|item| self.classify(item).is_none())
                    .cloned()
                    .collect();

                if items.is_empty() && !catalog.is_empty() {
                    tracing::warn!(month, "Catalog is entirely seasonal, using full catalog");
                    return EligiblePool {
                        items: catalog.to_vec(),
                        mode: SeasonalMode::Degraded(None),
                    };
                }

                EligiblePool {
                    items,
                    mode: SeasonalMode::Default,
                }
            }
        }
    }
}

impl Default for SeasonalRules {
    fn default() -> Self {
        Self {
            groups: vec![
                SeasonalGroup::new("halloween", &[10], &["halloween"]),
                SeasonalGroup::new("christmas", &[12], &["christmas", "xmas"]),
            ],
        }
    }
}
