//! Difficulty tier scale and range expressions.
//!
//! The scale is fixed: labels map one-to-one onto levels `1..=30`, ordered
//! from easiest to hardest. Ranges are written `LOW~HIGH` or as one label.
use crate::error::ExamError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TIER_LABELS: [&str; 30] = [
    "B5", "B4", "B3", "B2", "B1", //
    "S5", "S4", "S3", "S2", "S1", //
    "G5", "G4", "G3", "G2", "G1", //
    "P5", "P4", "P3", "P2", "P1", //
    "D5", "D4", "D3", "D2", "D1", //
    "R5", "R4", "R3", "R2", "R1",
];

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = TIER_LABELS.len() as u32;
pub const RANGE_SEPARATOR: char = '~';

/// Level of a tier label, ignoring case and whitespace.
pub fn level_of(label: &str) -> Result<u32, ExamError> {
    let normalized = normalize(label);
    TIER_LABELS
        .iter()
        .position(|candidate| *candidate == normalized)
        .map(|idx| idx as u32 + MIN_LEVEL)
        .ok_or_else(|| ExamError::InvalidTier {
            label: label.to_string(),
        })
}

/// Label for a level. Out-of-range levels clamp to the nearest endpoint so
/// malformed catalog data still renders.
pub fn label_of(level: i64) -> &'static str {
    let clamped = level.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64);
    TIER_LABELS[(clamped - MIN_LEVEL as i64) as usize]
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Closed interval of tier levels with `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TierRange {
    lo: u32,
    hi: u32,
}

impl TierRange {
    /// Build a range from two levels in either order.
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    pub fn single(level: u32) -> Self {
        Self::new(level, level)
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }
}

/// Parse `LABEL` or `LOW~HIGH`; descending endpoints are swapped.
pub fn parse_range(expr: &str) -> Result<TierRange, ExamError> {
    let normalized = normalize(expr);
    let level = |label: &str| {
        level_of(label).map_err(|_| ExamError::InvalidTierRange {
            expr: expr.to_string(),
            label: label.to_string(),
        })
    };
    match normalized.split_once(RANGE_SEPARATOR) {
        Some((a, b)) => Ok(TierRange::new(level(a)?, level(b)?)),
        None => Ok(TierRange::single(level(&normalized)?)),
    }
}

impl FromStr for TierRange {
    type Err = ExamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_range(s)
    }
}

impl TryFrom<String> for TierRange {
    type Error = ExamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_range(&value)
    }
}

impl From<TierRange> for String {
    fn from(range: TierRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for TierRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = label_of(self.lo as i64);
        if self.lo == self.hi {
            write!(f, "{lo}")
        } else {
            write!(f, "{lo}{RANGE_SEPARATOR}{}", label_of(self.hi as i64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_levels_round_trip() {
        for level in MIN_LEVEL..=MAX_LEVEL {
            let label = label_of(level as i64);
            assert_eq!(level_of(label).expect("known label"), level);
        }
    }

    #[test]
    fn label_of_is_strictly_monotonic() {
        let levels: Vec<u32> = (MIN_LEVEL..=MAX_LEVEL)
            .map(|level| level_of(label_of(level as i64)).expect("known label"))
            .collect();
        assert!(levels.windows(2).all(|pair| pair[0] < pair[1]));
        let labels: std::collections::BTreeSet<_> =
            (MIN_LEVEL..=MAX_LEVEL).map(|l| label_of(l as i64)).collect();
        assert_eq!(labels.len(), TIER_LABELS.len());
    }

    #[test]
    fn label_of_clamps_out_of_range_levels() {
        assert_eq!(label_of(0), "B5");
        assert_eq!(label_of(-7), "B5");
        assert_eq!(label_of(31), "R1");
        assert_eq!(label_of(i64::MAX), "R1");
    }

    #[test]
    fn level_of_ignores_case_and_whitespace() {
        assert_eq!(level_of("b5").expect("b5"), 1);
        assert_eq!(level_of(" g 5 ").expect("g5"), 11);
        assert!(matches!(
            level_of("X9"),
            Err(ExamError::InvalidTier { label }) if label == "X9"
        ));
    }

    #[test]
    fn descending_range_is_normalized() {
        let forward = parse_range("B3~B5").expect("forward");
        let backward = parse_range("B5~B3").expect("backward");
        assert_eq!(forward, backward);
        assert_eq!((forward.lo(), forward.hi()), (1, 3));
        assert_eq!(forward.to_string(), "B5~B3");
    }

    #[test]
    fn single_label_range() {
        let range = parse_range(" s4 ").expect("single");
        assert_eq!((range.lo(), range.hi()), (7, 7));
        assert_eq!(range.to_string(), "S4");
    }

    #[test]
    fn unknown_label_in_range_names_the_label() {
        let err = parse_range("B5~Z1").expect_err("unknown label");
        match err {
            ExamError::InvalidTierRange { expr, label } => {
                assert_eq!(expr, "B5~Z1");
                assert_eq!(label, "Z1");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn range_serializes_as_expression() {
        let range = parse_range("G4~P5").expect("range");
        let json = serde_json::to_string(&range).expect("serialize");
        assert_eq!(json, "\"G4~P5\"");
        let back: TierRange = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, range);
        assert!(serde_json::from_str::<TierRange>("\"nope\"").is_err());
    }
}
