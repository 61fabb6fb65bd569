//! Severity ranks and the minimum-level threshold.

use tracing::warn;

use crate::finding::Level;

/// Maps a severity label to its rank: notice 1, warning 2, error 3,
/// anything else 0.
pub fn rank(label: &str) -> u8 {
    match label {
        "notice" => 1,
        "warning" => 2,
        "error" => 3,
        _ => 0,
    }
}

/// Minimum rank a finding must reach to be kept. Rank 0 keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityThreshold(u8);

impl SeverityThreshold {
    /// Threshold that keeps every finding.
    pub const NONE: Self = Self(0);

    /// Builds a threshold from a level name such as `warning`.
    pub fn from_label(label: &str) -> Self {
        let minimum = rank(label);
        if minimum == 0 && !label.is_empty() {
            warn!(
                "Unknown error level '{}', findings will not be filtered by level",
                label
            );
        }
        Self(minimum)
    }

    pub fn minimum(&self) -> u8 {
        self.0
    }

    pub fn accepts(&self, level: &Level) -> bool {
        self.0 <= level.rank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("notice", 1)]
    #[case("warning", 2)]
    #[case("error", 3)]
    #[case("unknown", 0)]
    #[case("", 0)]
    #[case("ERROR", 0)]
    fn test_rank(#[case] label: &str, #[case] expected: u8) {
        assert_eq!(rank(label), expected);
    }

    #[test]
    fn test_rank_ordering() {
        assert!(rank("notice") < rank("warning"));
        assert!(rank("warning") < rank("error"));
    }

    #[rstest]
    #[case("error", Level::Error, true)]
    #[case("error", Level::Warning, false)]
    #[case("error", Level::Notice, false)]
    #[case("warning", Level::Error, true)]
    #[case("warning", Level::Warning, true)]
    #[case("warning", Level::Notice, false)]
    #[case("notice", Level::Notice, true)]
    #[case("notice", Level::Other("x".to_string()), false)]
    fn test_threshold_accepts(#[case] minimum: &str, #[case] level: Level, #[case] kept: bool) {
        assert_eq!(SeverityThreshold::from_label(minimum).accepts(&level), kept);
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let threshold = SeverityThreshold::from_label("none");
        assert_eq!(threshold, SeverityThreshold::NONE);
        for level in [
            Level::Error,
            Level::Warning,
            Level::Notice,
            Level::Other("odd".to_string()),
        ] {
            assert!(threshold.accepts(&level));
        }
    }
}
