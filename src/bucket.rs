//! Bucket plans: which difficulty bands an exam draws from, and how many
//! problems each band contributes.
use crate::error::ExamError;
use crate::tier::{parse_range, TierRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five canonical bands shared by every preset, easiest first.
pub const CANONICAL_BUCKETS: [(&str, &str, u32); 5] = [
    ("veasy", "B5~B3", 1),
    ("easy", "B2~S4", 1),
    ("mid", "S3~G5", 1),
    ("hard", "G4~P5", 1),
    ("insane", "P4~D5", 1),
];

const SPEC_FIELD_SEPARATOR: char = ':';

/// Named difficulty band. The name doubles as the selection salt, so renaming
/// a bucket changes every participant's draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub range: TierRange,
    pub count: u32,
}

impl Bucket {
    pub fn new(name: impl Into<String>, range: TierRange, count: u32) -> Self {
        Self {
            name: name.into(),
            range,
            count,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Easy,
    #[default]
    Mid,
    Hard,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Easy => "easy",
            Preset::Mid => "mid",
            Preset::Hard => "hard",
        }
    }

    fn bucket_names(&self) -> [&'static str; 3] {
        match self {
            Preset::Easy => ["veasy", "easy", "mid"],
            Preset::Mid => ["easy", "mid", "hard"],
            Preset::Hard => ["mid", "hard", "insane"],
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up one of the canonical buckets by name.
pub fn canonical_bucket(name: &str) -> Option<Bucket> {
    CANONICAL_BUCKETS
        .iter()
        .find(|(candidate, _, _)| *candidate == name)
        .and_then(|(name, expr, count)| {
            parse_range(expr)
                .ok()
                .map(|range| Bucket::new(*name, range, *count))
        })
}

/// All canonical buckets in scale order.
pub fn canonical_buckets() -> Vec<Bucket> {
    CANONICAL_BUCKETS
        .iter()
        .filter_map(|(name, _, _)| canonical_bucket(name))
        .collect()
}

/// Ordered list of buckets an exam is assembled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPlan {
    pub buckets: Vec<Bucket>,
}

impl BucketPlan {
    pub fn from_preset(preset: Preset) -> Self {
        let buckets = preset
            .bucket_names()
            .iter()
            .filter_map(|name| canonical_bucket(name))
            .collect();
        Self { buckets }
    }

    /// Parse `name:range:count` entries in order. Duplicate names are allowed.
    pub fn from_custom_spec<S: AsRef<str>>(entries: &[S]) -> Result<Self, ExamError> {
        let buckets = entries
            .iter()
            .map(|entry| parse_bucket_spec(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { buckets })
    }

    pub fn total_count(&self) -> u32 {
        self.buckets.iter().map(|bucket| bucket.count).sum()
    }
}

/// Parse one `name:range:count` bucket entry.
pub fn parse_bucket_spec(entry: &str) -> Result<Bucket, ExamError> {
    let invalid = |reason: String| ExamError::InvalidBucketSpec {
        entry: entry.to_string(),
        reason,
    };
    let fields: Vec<&str> = entry.trim().split(SPEC_FIELD_SEPARATOR).collect();
    let [name, range, count] = fields.as_slice() else {
        return Err(invalid(format!(
            "expected name:range:count, got {} field(s)",
            fields.len()
        )));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("bucket name is empty".to_string()));
    }
    let range = parse_range(range).map_err(|err| invalid(err.to_string()))?;
    let count: u32 = count
        .trim()
        .parse()
        .map_err(|_| invalid(format!("count {:?} is not a positive integer", count.trim())))?;
    if count == 0 {
        return Err(invalid("count must be at least 1".to_string()));
    }
    Ok(Bucket::new(name, range, count))
}

#[cfg(test)]
#[path = "bucket_tests.rs"]
mod tests;
