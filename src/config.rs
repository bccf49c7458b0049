//! Matching configuration.
//!
//! One explicit value object threaded through every component call; there is
//! no module-level mutable state. Defaults mirror the values the interactive
//! workflow was tuned with.

/// Columns compared when no explicit set is given.
pub const DEFAULT_COLUMNS: [&str; 3] = ["album", "artist", "year"];

/// Maximum length of each id fragment. Longer values lower the collision
/// risk at the cost of a less compact id.
pub const DEFAULT_ID_LENGTH: usize = 22;

/// Separator between id fragments.
pub const ID_SEP: &str = "-";

/// Tunables for similarity scoring, candidate ranking and the interactive
/// resolution session.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Minimum similarity a candidate must reach to be presented.
    pub min_rate: f64,
    /// Maximum number of ranked candidates kept per record.
    pub max_results: usize,
    /// Scale factor for numeric column differences: the contribution is
    /// `1 - |a - b| * numeric_tolerance`, deliberately unclamped.
    pub numeric_tolerance: f64,
    /// Truncation length for id fragments.
    pub id_length: usize,
    /// Present only the single best candidate as a yes/no confirmation
    /// instead of an indexed choice.
    pub highest_match_only: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_rate: 0.6,
            max_results: 15,
            numeric_tolerance: 0.25,
            id_length: DEFAULT_ID_LENGTH,
            highest_match_only: true,
        }
    }
}

impl MatchConfig {
    pub fn columns(columns: Option<&[String]>) -> Vec<String> {
        match columns {
            Some(cols) if !cols.is_empty() => cols.to_vec(),
            _ => DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = MatchConfig::default();
        assert_eq!(cfg.min_rate, 0.6);
        assert_eq!(cfg.max_results, 15);
        assert_eq!(cfg.numeric_tolerance, 0.25);
        assert_eq!(cfg.id_length, 22);
        assert!(cfg.highest_match_only);
    }

    #[test]
    fn test_columns_fallback() {
        assert_eq!(MatchConfig::columns(None), vec!["album", "artist", "year"]);
        let custom = vec!["artist".to_string(), "title".to_string()];
        assert_eq!(MatchConfig::columns(Some(&custom)), custom);
    }
}
