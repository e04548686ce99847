//! Deterministic selection of problems from frozen pools.
//!
//! The only entropy is the exam code and the bucket name: both are hashed
//! with BLAKE2b-128, the digest seeds MT19937, and the seeded shuffle of the
//! pool's index range decides the order. No clock or host state is read.
mod mt;

use crate::bucket::BucketPlan;
use crate::pool::{Candidate, Pool};
use blake2::digest::consts::U16;
use blake2::{Blake2b, Digest};
use mt::Mt19937;
use serde::Serialize;

type Blake2b128 = Blake2b<U16>;

/// Joins exam code and salt in the digest input.
pub const DIGEST_SEPARATOR: &str = "|";

/// Seed for an exam code and bucket salt: the big-endian value of
/// BLAKE2b-128 over `exam_code|salt`.
pub fn selection_seed(exam_code: &str, salt: &str) -> u128 {
    let digest = Blake2b128::new()
        .chain_update(exam_code.as_bytes())
        .chain_update(DIGEST_SEPARATOR.as_bytes())
        .chain_update(salt.as_bytes())
        .finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    u128::from_be_bytes(bytes)
}

/// Indices into a pool of `len` items, in draw order. At most `count` are
/// returned and none repeats.
pub fn select_indices(len: usize, exam_code: &str, salt: &str, count: u32) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..len).collect();
    Mt19937::from_u128(selection_seed(exam_code, salt)).shuffle(&mut indices);
    indices.truncate(len.min(count as usize));
    indices
}

/// Draw up to `count` candidates from `items`.
pub fn select(items: &[Candidate], exam_code: &str, salt: &str, count: u32) -> Vec<Candidate> {
    select_indices(items.len(), exam_code, salt, count)
        .into_iter()
        .map(|idx| items[idx].clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    pub bucket: String,
    pub candidate: Candidate,
}

/// A bucket asked for more problems than its pool holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortfallWarning {
    pub bucket: String,
    pub requested: u32,
    pub available: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub picks: Vec<Pick>,
    pub shortfalls: Vec<ShortfallWarning>,
}

/// Select for every bucket in plan order. `pools[i]` is the pool for
/// `plan.buckets[i]`; the plan's count wins over the count stored in the pool.
pub fn select_for_plan(exam_code: &str, plan: &BucketPlan, pools: &[Pool]) -> Selection {
    let mut selection = Selection::default();
    for (bucket, pool) in plan.buckets.iter().zip(pools) {
        let chosen = select(&pool.items, exam_code, &bucket.name, bucket.count);
        if chosen.len() < bucket.count as usize {
            tracing::warn!(
                bucket = %bucket.name,
                requested = bucket.count,
                available = pool.len(),
                "pool smaller than requested count"
            );
            selection.shortfalls.push(ShortfallWarning {
                bucket: bucket.name.clone(),
                requested: bucket.count,
                available: pool.len(),
            });
        }
        selection
            .picks
            .extend(chosen.into_iter().map(|candidate| Pick {
                bucket: bucket.name.clone(),
                candidate,
            }));
    }
    selection
}

#[cfg(test)]
#[path = "select_tests.rs"]
mod tests;
