//! Domain error taxonomy.
//!
//! Input errors are raised before any I/O happens; pool and provisioning
//! errors carry the identifier the operator needs to fix the run.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExamError {
    #[error("invalid tier label {label:?}")]
    InvalidTier { label: String },

    #[error("invalid tier range {expr:?}: unknown label {label:?}")]
    InvalidTierRange { expr: String, label: String },

    #[error("invalid bucket spec {entry:?}: {reason}")]
    InvalidBucketSpec { entry: String, reason: String },

    #[error(
        "pool snapshot for bucket {bucket:?} not found at {} (run `mockct refresh` and share the pool directory)",
        path.display()
    )]
    PoolNotFound { bucket: String, path: PathBuf },

    #[error("pool snapshot {} is corrupt: {reason}", path.display())]
    PoolCorrupt { path: PathBuf, reason: String },

    #[error(
        "pool {bucket:?} was refreshed at {updated_at_epoch_ms} ms, after the exam start at {exam_start_epoch_ms} ms"
    )]
    PoolNewerThanExam {
        bucket: String,
        updated_at_epoch_ms: u128,
        exam_start_epoch_ms: u128,
    },

    #[error("catalog query failed on page {page}: {reason}")]
    CatalogQueryFailed { page: u32, reason: String },

    #[error("provisioning problem {problem_id} failed: {reason}")]
    ProvisioningFailed { problem_id: u64, reason: String },
}
