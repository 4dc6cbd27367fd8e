//! Episode distribution analysis
//!
//! Groups a catalog by episode tag and reports which episodes are over- or
//! underrepresented, so operators can balance the collection by hand.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::rotation::episode::{parse, EpisodeTag};

/// Episodes below this share of the average are flagged
pub const UNDERREPRESENTED_RATIO: f64 = 0.75;

/// Unidentified items listed before the rest are summarized
pub const UNIDENTIFIED_PREVIEW: usize = 10;

/// Episodes shown in the top and bottom lists
pub const RANKING_SIZE: usize = 5;

/// Item count for one episode tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeCount {
    /// Episode tag
    pub tag: String,

    /// Season, when the tag is numbered
    pub season: Option<u32>,

    /// Episode within the season, when the tag is numbered
    pub episode: Option<u32>,

    /// Number of items with this tag
    pub count: usize,
}

impl EpisodeCount {
    fn from_tag(tag: &EpisodeTag, count: usize) -> Self {
        let (season, episode) = match tag {
            EpisodeTag::Numbered { season, episode } => (Some(*season), Some(*episode)),
            EpisodeTag::Named(_) => (None, None),
        };
        Self {
            tag: tag.to_string(),
            season,
            episode,
            count,
        }
    }

    /// Season 0 holds specials
    pub fn is_special(&self) -> bool {
        self.season == Some(0)
    }

    fn label(&self) -> String {
        if self.is_special() {
            format!("Special: {}", self.tag)
        } else {
            self.tag.clone()
        }
    }

    /// Regular episodes first, then specials, then named groups
    fn sort_key(&self) -> (u8, u32, u32, &str) {
        let class = match self.season {
            Some(0) => 1,
            Some(_) => 0,
            None => 2,
        };
        (
            class,
            self.season.unwrap_or(0),
            self.episode.unwrap_or(0),
            &self.tag,
        )
    }
}

/// An episode below the representation threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    /// Episode tag
    pub tag: String,

    /// Items currently present
    pub count: usize,

    /// Items needed to reach the threshold
    pub needed: usize,
}

/// Distribution of a catalog across episode tags
#[derive(Debug, Clone, Serialize)]
pub struct DistributionReport {
    /// Items analyzed
    pub total_items: usize,

    /// Per-episode counts in display order
    pub episodes: Vec<EpisodeCount>,

    /// Mean items per episode
    pub average: f64,

    /// Smallest per-episode count
    pub min: usize,

    /// Largest per-episode count
    pub max: usize,

    /// Episodes below this count are underrepresented
    pub threshold: usize,

    /// Underrepresented episodes in display order
    pub underrepresented: Vec<Shortfall>,

    /// Items without a season/episode pair, in catalog order
    pub unidentified: Vec<String>,
}

impl DistributionReport {
    /// Analyze a catalog
    pub fn analyze(catalog: &[String]) -> Self {
        let mut counts: HashMap<EpisodeTag, usize> = HashMap::new();
        let mut unidentified = Vec::new();

        for item in catalog {
            let tag = parse(item);
            if !tag.is_numbered() {
                unidentified.push(item.clone());
            }
            *counts.entry(tag).or_insert(0) += 1;
        }

        let mut episodes: Vec<EpisodeCount> = counts
            .iter()
            .map(|(tag, count)| EpisodeCount::from_tag(tag, *count))
            .collect();
        episodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let average = if episodes.is_empty() {
            0.0
        } else {
            catalog.len() as f64 / episodes.len() as f64
        };
        let threshold = (average * UNDERREPRESENTED_RATIO).floor() as usize;

        let underrepresented = episodes
            .iter()
            .filter(|e| e.count < threshold)
            .map(|e| Shortfall {
                tag: e.tag.clone(),
                count: e.count,
                needed: threshold - e.count,
            })
            .collect();

        Self {
            total_items: catalog.len(),
            min: episodes.iter().map(|e| e.count).min().unwrap_or(0),
            max: episodes.iter().map(|e| e.count).max().unwrap_or(0),
            episodes,
            average,
            threshold,
            underrepresented,
            unidentified,
        }
    }

    /// Episodes ordered by count, largest first, ties in display order
    fn ranked(&self) -> Vec<&EpisodeCount> {
        let mut ranked: Vec<&EpisodeCount> = self.episodes.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    /// The `n` episodes with the most items
    pub fn top(&self, n: usize) -> Vec<&EpisodeCount> {
        self.ranked().into_iter().take(n).collect()
    }

    /// The `n` episodes with the fewest items, largest first
    pub fn bottom(&self, n: usize) -> Vec<&EpisodeCount> {
        let ranked = self.ranked();
        let skip = ranked.len().saturating_sub(n);
        ranked.into_iter().skip(skip).collect()
    }
}

/// Text report for the terminal
impl fmt::Display for DistributionReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "Episode Distribution Report")?;
        writeln!(out, "===========================")?;
        writeln!(out, "Total episodes: {}", self.episodes.len())?;
        writeln!(out, "Total items: {}", self.total_items)?;
        writeln!(out, "Average per episode: {:.1}", self.average)?;
        writeln!(out, "Range: {} - {} items per episode", self.min, self.max)?;

        writeln!(out, "\nEpisode Breakdown")?;
        writeln!(out, "-----------------")?;
        for episode in &self.episodes {
            let share = if self.total_items == 0 {
                0.0
            } else {
                episode.count as f64 / self.total_items as f64 * 100.0
            };
            writeln!(out, "{:3} ({share:4.1}%) - {}", episode.count, episode.label())?;
        }

        if !self.underrepresented.is_empty() {
            writeln!(out, "\nUnderrepresented Episodes")?;
            writeln!(out, "-------------------------")?;
            writeln!(out, "(fewer than {} items)", self.threshold)?;
            for shortfall in &self.underrepresented {
                writeln!(
                    out,
                    "{:3} items (need {:2} more) - {}",
                    shortfall.count, shortfall.needed, shortfall.tag
                )?;
            }
        }

        if !self.unidentified.is_empty() {
            writeln!(out, "\nUnidentified Items")?;
            writeln!(out, "------------------")?;
            writeln!(
                out,
                "{} items have no season/episode pattern:",
                self.unidentified.len()
            )?;
            for item in self.unidentified.iter().take(UNIDENTIFIED_PREVIEW) {
                writeln!(out, "  - {item}")?;
            }
            if self.unidentified.len() > UNIDENTIFIED_PREVIEW {
                writeln!(
                    out,
                    "  ... and {} more",
                    self.unidentified.len() - UNIDENTIFIED_PREVIEW
                )?;
            }
        }

        writeln!(out, "\nTop {RANKING_SIZE} Episodes")?;
        writeln!(out, "-------------")?;
        for episode in self.top(RANKING_SIZE) {
            writeln!(out, "  {:3} - {}", episode.count, episode.label())?;
        }

        writeln!(out, "\nBottom {RANKING_SIZE} Episodes")?;
        writeln!(out, "----------------")?;
        for episode in self.bottom(RANKING_SIZE) {
            writeln!(out, "  {:3} - {}", episode.count, episode.label())?;
        }

        Ok(())
    }
}
