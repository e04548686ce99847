//! Pool snapshot files: `<pool_dir>/pool_<bucket>.json`.
use super::Pool;
use crate::error::ExamError;
use crate::util::write_atomic;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const POOL_FILE_PREFIX: &str = "pool_";
const POOL_FILE_SUFFIX: &str = ".json";

/// Snapshot path for a bucket name. Names that would escape `pool_dir` are
/// rejected.
pub fn pool_path(pool_dir: &Path, bucket_name: &str) -> Result<PathBuf> {
    if bucket_name.is_empty()
        || bucket_name.contains(['/', '\\'])
        || bucket_name == "."
        || bucket_name == ".."
    {
        return Err(anyhow!(
            "bucket name {bucket_name:?} cannot be used as a snapshot file name"
        ));
    }
    Ok(pool_dir.join(format!("{POOL_FILE_PREFIX}{bucket_name}{POOL_FILE_SUFFIX}")))
}

/// Persist a pool with write-then-rename so readers never see a partial file.
pub fn save_pool(pool_dir: &Path, pool: &Pool) -> Result<PathBuf> {
    let path = pool_path(pool_dir, &pool.bucket.name)?;
    let text = serde_json::to_string_pretty(pool).context("serialize pool snapshot")?;
    write_atomic(&path, text.as_bytes())?;
    Ok(path)
}

/// Load and verify the snapshot for `bucket_name`.
///
/// A missing file is `ExamError::PoolNotFound`; a file that fails to parse,
/// belongs to another bucket, or fails its integrity check is
/// `ExamError::PoolCorrupt`.
pub fn load_pool(pool_dir: &Path, bucket_name: &str) -> Result<Pool> {
    let path = pool_path(pool_dir, bucket_name)?;
    if !path.is_file() {
        return Err(ExamError::PoolNotFound {
            bucket: bucket_name.to_string(),
            path,
        }
        .into());
    }
    let pool = read_pool_file(&path)?;
    if pool.bucket.name != bucket_name {
        return Err(ExamError::PoolCorrupt {
            path,
            reason: format!(
                "snapshot belongs to bucket {:?}, expected {bucket_name:?}",
                pool.bucket.name
            ),
        }
        .into());
    }
    Ok(pool)
}

fn read_pool_file(path: &Path) -> Result<Pool> {
    let bytes = fs::read(path).with_context(|| format!("read pool {}", path.display()))?;
    let pool: Pool = serde_json::from_slice(&bytes).map_err(|err| ExamError::PoolCorrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    pool.check_integrity()
        .map_err(|reason| ExamError::PoolCorrupt {
            path: path.to_path_buf(),
            reason,
        })?;
    Ok(pool)
}

/// All readable snapshots in `pool_dir`, sorted by file name. Corrupt files
/// are reported as errors alongside their path.
pub fn list_pools(pool_dir: &Path) -> Result<Vec<(PathBuf, Result<Pool>)>> {
    if !pool_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(pool_dir).with_context(|| format!("read {}", pool_dir.display()))? {
        let path = entry?.path();
        let is_snapshot = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                name.starts_with(POOL_FILE_PREFIX) && name.ends_with(POOL_FILE_SUFFIX)
            });
        if is_snapshot && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths
        .into_iter()
        .map(|path| {
            let pool = read_pool_file(&path);
            (path, pool)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::canonical_bucket;
    use crate::pool::Candidate;

    fn sample_pool(name: &str) -> Pool {
        let bucket = canonical_bucket(name).expect("canonical bucket");
        Pool::new(
            bucket,
            vec!["graph".to_string()],
            1_700_000_000_000,
            vec![Candidate::new(1000, "A+B", 1), Candidate::new(1001, "A-B", 1)],
        )
        .expect("pool")
    }

    #[test]
    fn save_then_load_is_lossless() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = sample_pool("veasy");
        let path = save_pool(dir.path(), &pool).expect("save");
        assert_eq!(path, dir.path().join("pool_veasy.json"));
        let loaded = load_pool(dir.path(), "veasy").expect("load");
        assert_eq!(loaded, pool);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != "pool_veasy.json")
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind");
    }

    #[test]
    fn missing_snapshot_is_pool_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_pool(dir.path(), "hard").expect_err("missing");
        match err.downcast_ref::<ExamError>() {
            Some(ExamError::PoolNotFound { bucket, path }) => {
                assert_eq!(bucket, "hard");
                assert_eq!(path, &dir.path().join("pool_hard.json"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("mockct refresh"));
    }

    #[test]
    fn truncated_snapshot_is_corrupt_not_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("pool_mid.json"), b"{\"schema_version\": 1, \"bu")
            .expect("write");
        let err = load_pool(dir.path(), "mid").expect_err("corrupt");
        assert!(matches!(
            err.downcast_ref::<ExamError>(),
            Some(ExamError::PoolCorrupt { .. })
        ));
    }

    #[test]
    fn snapshot_for_other_bucket_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = sample_pool("easy");
        let text = serde_json::to_string(&pool).expect("serialize");
        fs::write(dir.path().join("pool_mid.json"), text).expect("write");
        let err = load_pool(dir.path(), "mid").expect_err("wrong bucket");
        assert!(err.to_string().contains("expected \"mid\""));
    }

    #[test]
    fn path_escaping_names_are_rejected() {
        let dir = Path::new("/tmp/pools");
        assert!(pool_path(dir, "../x").is_err());
        assert!(pool_path(dir, "..").is_err());
        assert!(pool_path(dir, "").is_err());
        assert!(pool_path(dir, "warm up").is_ok());
    }

    #[test]
    fn list_pools_reports_each_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        save_pool(dir.path(), &sample_pool("veasy")).expect("save veasy");
        save_pool(dir.path(), &sample_pool("hard")).expect("save hard");
        fs::write(dir.path().join("pool_broken.json"), b"not json").expect("write");
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");
        let listed = list_pools(dir.path()).expect("list");
        let names: Vec<String> = listed
            .iter()
            .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["pool_broken.json", "pool_hard.json", "pool_veasy.json"]);
        assert!(listed[0].1.is_err());
        assert!(listed[1].1.is_ok());
    }
}
