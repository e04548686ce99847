//! Exam workflows: refreshing pools and selecting an exam from them.
use crate::bucket::{Bucket, BucketPlan};
use crate::catalog::ProblemCatalog;
use crate::error::ExamError;
use crate::pool::{load_pool, refresh_pool, save_pool, Pool, RefreshOptions};
use crate::select::{select_for_plan, Selection};
use crate::tier::TierRange;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Identity of a pool a selection was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolRef {
    pub bucket: String,
    pub fingerprint: String,
    pub updated_at_epoch_ms: u128,
    pub items: usize,
}

impl From<&Pool> for PoolRef {
    fn from(pool: &Pool) -> Self {
        Self {
            bucket: pool.bucket.name.clone(),
            fingerprint: pool.fingerprint.clone(),
            updated_at_epoch_ms: pool.updated_at_epoch_ms,
            items: pool.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamSelection {
    pub exam_code: String,
    pub plan: BucketPlan,
    pub pools: Vec<PoolRef>,
    pub selection: Selection,
    /// Plan buckets whose snapshot was refreshed for another tier range.
    pub range_mismatches: Vec<RangeMismatch>,
}

/// The plan asked for one range but the snapshot under that bucket name was
/// refreshed for another; the draw comes from the snapshot's range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeMismatch {
    pub bucket: String,
    pub plan_range: TierRange,
    pub pool_range: TierRange,
}

/// Compare each plan bucket with the range its pool was refreshed for.
pub fn range_mismatches(plan: &BucketPlan, pools: &[Pool]) -> Vec<RangeMismatch> {
    plan.buckets
        .iter()
        .zip(pools)
        .filter(|(bucket, pool)| bucket.range != pool.bucket.range)
        .map(|(bucket, pool)| {
            tracing::warn!(
                bucket = %bucket.name,
                plan_range = %bucket.range,
                pool_range = %pool.bucket.range,
                "pool was refreshed for a different tier range"
            );
            RangeMismatch {
                bucket: bucket.name.clone(),
                plan_range: bucket.range,
                pool_range: pool.bucket.range,
            }
        })
        .collect()
}

pub fn normalize_exam_code(raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(anyhow!("exam code must be non-empty"));
    }
    Ok(code.to_string())
}

/// Load the snapshot for every bucket in the plan, in plan order.
///
/// Fails on the first missing or corrupt snapshot. With `exam_start_epoch_ms`
/// set, a snapshot refreshed after the exam started is rejected.
pub fn load_plan_pools(
    pool_dir: &Path,
    plan: &BucketPlan,
    exam_start_epoch_ms: Option<u128>,
) -> Result<Vec<Pool>> {
    let mut pools = Vec::with_capacity(plan.buckets.len());
    for bucket in &plan.buckets {
        let pool = load_pool(pool_dir, &bucket.name)?;
        if let Some(exam_start) = exam_start_epoch_ms {
            if pool.updated_at_epoch_ms > exam_start {
                return Err(ExamError::PoolNewerThanExam {
                    bucket: bucket.name.clone(),
                    updated_at_epoch_ms: pool.updated_at_epoch_ms,
                    exam_start_epoch_ms: exam_start,
                }
                .into());
            }
        }
        pools.push(pool);
    }
    Ok(pools)
}

/// Load pools and draw the exam. Pure apart from reading the snapshots.
pub fn select_exam(
    exam_code: &str,
    plan: &BucketPlan,
    pool_dir: &Path,
    exam_start_epoch_ms: Option<u128>,
) -> Result<ExamSelection> {
    let exam_code = normalize_exam_code(exam_code)?;
    let pools = load_plan_pools(pool_dir, plan, exam_start_epoch_ms)?;
    let selection = select_for_plan(&exam_code, plan, &pools);
    Ok(ExamSelection {
        exam_code,
        plan: plan.clone(),
        pools: pools.iter().map(PoolRef::from).collect(),
        selection,
        range_mismatches: range_mismatches(plan, &pools),
    })
}

#[derive(Debug)]
pub struct RefreshSummary {
    pub bucket: String,
    /// `None` when nothing was written.
    pub path: Option<PathBuf>,
    pub items: usize,
    pub warning: Option<String>,
}

/// Refresh and persist one pool per bucket, sequentially.
///
/// A bucket whose first page failed keeps its previous snapshot rather than
/// being replaced by an empty one.
pub fn refresh_buckets(
    catalog: &dyn ProblemCatalog,
    buckets: &[Bucket],
    options: &RefreshOptions,
    pool_dir: &Path,
) -> Result<Vec<RefreshSummary>> {
    let mut summaries = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        let outcome = refresh_pool(catalog, bucket, options)?;
        let warning = outcome.aborted.as_ref().map(ToString::to_string);
        if outcome.aborted.is_some() && outcome.pool.is_empty() {
            summaries.push(RefreshSummary {
                bucket: bucket.name.clone(),
                path: None,
                items: 0,
                warning,
            });
            continue;
        }
        let path = save_pool(pool_dir, &outcome.pool)?;
        summaries.push(RefreshSummary {
            bucket: bucket.name.clone(),
            path: Some(path),
            items: outcome.pool.len(),
            warning,
        });
    }
    Ok(summaries)
}
