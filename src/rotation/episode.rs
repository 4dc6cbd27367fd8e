//! Episode identifier extraction
//!
//! Derives a short grouping tag from an item's file name. Numbered episodes
//! in any of the common notations normalize to the same tag:
//! - `1x05`, `Season 1x05`
//! - `S01E05`, `s1 e5`
//! - `Season 1 Episode 5`
//! - `1 x 5`
//!
//! all become `S1E5`. Names without a season/episode pair fall back to their
//! leading token, so `Halloweenie-003.jpg` is tagged `Halloweenie`.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::utils::normalize_whitespace;

/// Tag used when a name yields nothing at all
pub const UNKNOWN_TAG: &str = "unknown";

/// Structured episode tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EpisodeTag {
    /// A season/episode pair was found
    Numbered { season: u32, episode: u32 },
    /// Fallback prefix of the name
    Named(String),
}

impl EpisodeTag {
    /// Season 0 is used for specials
    pub fn is_special(&self) -> bool {
        matches!(self, Self::Numbered { season: 0, .. })
    }

    /// Check if a season/episode pair was found
    pub fn is_numbered(&self) -> bool {
        matches!(self, Self::Numbered { .. })
    }
}

impl fmt::Display for EpisodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered { season, episode } => write!(f, "S{season}E{episode}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

fn season_episode_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

    PATTERNS.get_or_init(|| {
        [
            r"(?i)(?:Season?\s*)?(\d+)x(\d+)",
            r"(?i)S(\d+)\s*E(\d+)",
            r"(?i)Season\s*(\d+)\s*Episode\s*(\d+)",
            r"(?i)(\d+)\s*x\s*(\d+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid regex pattern"))
        .collect()
    })
}

/// Remove a trailing file extension
pub fn strip_extension(name: &str) -> &str {
    static EXTENSION_RE: OnceLock<Regex> = OnceLock::new();

    let re = EXTENSION_RE
        .get_or_init(|| Regex::new(r"\.[A-Za-z0-9]{1,5}$").expect("Invalid regex pattern"));

    match re.find(name) {
        Some(m) if m.start() > 0 => &name[..m.start()],
        _ => name,
    }
}

fn clean_name(name: &str) -> String {
    static SEPARATOR_RE: OnceLock<Regex> = OnceLock::new();

    let re = SEPARATOR_RE.get_or_init(|| Regex::new(r"[_\-]+").expect("Invalid regex pattern"));

    normalize_whitespace(&re.replace_all(strip_extension(name), " "))
}

fn leading_token(name: &str) -> Option<&str> {
    name.split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .next()
        .filter(|token| !token.is_empty())
}

/// Parse a name into a structured [`EpisodeTag`]
pub fn parse(name: &str) -> EpisodeTag {
    let cleaned = clean_name(name);

    for pattern in season_episode_patterns() {
        let Some(caps) = pattern.captures(&cleaned) else {
            continue;
        };
        let season = caps[1].parse::<u32>();
        let episode = caps[2].parse::<u32>();
        if let (Ok(season), Ok(episode)) = (season, episode) {
            return EpisodeTag::Numbered { season, episode };
        }
    }

    let fallback = leading_token(name.trim())
        .map(str::to_string)
        .or_else(|| (!cleaned.is_empty()).then(|| cleaned.clone()))
        .unwrap_or_else(|| UNKNOWN_TAG.to_string());

    EpisodeTag::Named(fallback)
}

/// Derive the episode tag string for an item identifier
///
/// # Example
/// ```
/// use pinwheel::rotation::episode::identify;
///
/// assert_eq!(identify("S01E08-kitchen.jpg"), "S1E8");
/// assert_eq!(identify("Pete and Pete 2x05 - 12.png"), "S2E5");
/// assert_eq!(identify("Halloweenie_003.jpg"), "Halloweenie");
/// ```
pub fn identify(name: &str) -> String {
    parse(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sxxexx_notation() {
        assert_eq!(identify("S01E01-a.jpg"), "S1E1");
        assert_eq!(identify("S01E01-b.jpg"), "S1E1");
        assert_eq!(identify("s02e10_frame.PNG"), "S2E10");
    }

    #[test]
    fn test_x_notation() {
        assert_eq!(identify("1x05 Grounded.jpg"), "S1E5");
        assert_eq!(identify("Season 3x12.jpg"), "S3E12");
        assert_eq!(identify("show 3 x 12 still.jpg"), "S3E12");
    }

    #[test]
    fn test_long_notation() {
        assert_eq!(identify("Season 2 Episode 7 - Field Trip.jpeg"), "S2E7");
        assert_eq!(identify("season_1_episode_4.gif"), "S1E4");
    }

    #[test]
    fn test_fallback_prefix() {
        assert_eq!(identify("Halloweenie-003.jpg"), "Halloweenie");
        assert_eq!(identify("christmas special 2.jpg"), "christmas");
        assert_eq!(identify("single.jpg"), "single");
    }

    #[test]
    fn test_fallback_with_leading_separator() {
        assert_eq!(identify("_promo.jpg"), "promo");
        assert_eq!(identify("---"), "unknown");
        assert_eq!(identify(""), "unknown");
    }

    #[test]
    fn test_oversized_numbers_skip_pattern() {
        let tag = parse("S99999999999E1-frame.jpg");
        assert!(!tag.is_numbered());
        assert_eq!(tag.to_string(), "S99999999999E1");
    }

    #[test]
    fn test_specials() {
        assert!(parse("S00E02-bonus.jpg").is_special());
        assert!(!parse("S01E02.jpg").is_special());
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("a.b.jpg"), "a.b");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("noext"), "noext");
    }

    #[test]
    fn test_identify_is_deterministic() {
        for name in ["S01E01-a.jpg", "weird name", "2x3", "Halloween.png"] {
            assert_eq!(identify(name), identify(name));
        }
    }
}
