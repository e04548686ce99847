//! Frozen candidate pools, one per bucket.
//!
//! A pool is refreshed once by the organizer and distributed verbatim. Items
//! are kept sorted by `problemId` with no duplicates, and the fingerprint
//! pins the exact item list so a selection can be traced to its pool.
mod refresh;
mod snapshot;

pub use refresh::{refresh_pool, RefreshOptions};
pub use snapshot::{list_pools, load_pool, save_pool};

use crate::bucket::Bucket;
use crate::tier::label_of;
use crate::util::sha256_hex;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const POOL_SCHEMA_VERSION: u32 = 1;

/// One catalog problem. Field names follow the catalog's JSON so snapshots
/// keep every field the catalog returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "problemId")]
    pub problem_id: u64,
    #[serde(rename = "titleKo", default, skip_serializing_if = "Option::is_none")]
    pub title_ko: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candidate {
    #[cfg(test)]
    pub fn new(problem_id: u64, title: &str, level: i64) -> Self {
        Self {
            problem_id,
            title_ko: Some(title.to_string()),
            level: Some(level),
            extra: Map::new(),
        }
    }

    /// Display title: `titleKo`, then `title`, then empty.
    pub fn title(&self) -> &str {
        self.title_ko
            .as_deref()
            .filter(|title| !title.is_empty())
            .or_else(|| self.extra.get("title").and_then(Value::as_str))
            .unwrap_or("")
    }

    pub fn tier_label(&self) -> &'static str {
        label_of(self.level.unwrap_or(0))
    }
}

/// Snapshot of the candidates visible for one bucket at refresh time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub schema_version: u32,
    pub bucket: Bucket,
    pub tags: Vec<String>,
    pub updated_at_epoch_ms: u128,
    pub fingerprint: String,
    pub items: Vec<Candidate>,
}

impl Pool {
    /// Build a pool, sorting by `problemId` and keeping the first occurrence
    /// of each id.
    pub fn new(
        bucket: Bucket,
        tags: Vec<String>,
        updated_at_epoch_ms: u128,
        mut items: Vec<Candidate>,
    ) -> Result<Self> {
        items.sort_by_key(|item| item.problem_id);
        items.dedup_by_key(|item| item.problem_id);
        let fingerprint = fingerprint_items(&items)?;
        Ok(Self {
            schema_version: POOL_SCHEMA_VERSION,
            bucket,
            tags,
            updated_at_epoch_ms,
            fingerprint,
            items,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check the invariants `Pool::new` establishes. Returns the first
    /// violation found.
    pub fn check_integrity(&self) -> Result<(), String> {
        if self.schema_version != POOL_SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema_version {}",
                self.schema_version
            ));
        }
        if let Some(pair) = self
            .items
            .windows(2)
            .find(|pair| pair[0].problem_id >= pair[1].problem_id)
        {
            return Err(format!(
                "items not strictly ascending at problemId {} -> {}",
                pair[0].problem_id, pair[1].problem_id
            ));
        }
        let actual = fingerprint_items(&self.items).map_err(|err| err.to_string())?;
        if actual != self.fingerprint {
            return Err(format!(
                "fingerprint mismatch (recorded {}, computed {actual})",
                self.fingerprint
            ));
        }
        Ok(())
    }
}

/// SHA-256 over the canonical JSON of the item list.
pub fn fingerprint_items(items: &[Candidate]) -> Result<String> {
    let bytes = serde_json::to_vec(items).context("serialize pool items")?;
    Ok(sha256_hex(&bytes))
}
