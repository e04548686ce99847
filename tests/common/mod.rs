//! Shared helpers for the CLI integration tests.
#![allow(dead_code)]

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Item shape written to snapshots; field order matches what `mockct`
/// serializes, so the fingerprint computed here is the one it recomputes.
#[derive(Serialize)]
struct FixtureItem {
    #[serde(rename = "problemId")]
    problem_id: u64,
    #[serde(rename = "titleKo")]
    title_ko: String,
    level: i64,
}

/// A pool directory plus a workspace root, both inside one temp dir.
pub struct ExamFixture {
    _root: TempDir,
    pub pool_dir: PathBuf,
    pub workspace: PathBuf,
}

impl ExamFixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let pool_dir = root.path().join("pool");
        let workspace = root.path().join("workspace");
        fs::create_dir_all(&pool_dir).expect("create pool dir");
        Self {
            _root: root,
            pool_dir,
            workspace,
        }
    }

    /// Write `pool_<bucket>.json` holding `len` problems numbered from `first_id`.
    pub fn write_pool(&self, bucket: &str, range: &str, len: u64, first_id: u64, updated_at: u128) {
        let items: Vec<FixtureItem> = (0..len)
            .map(|offset| FixtureItem {
                problem_id: first_id + offset,
                title_ko: format!("{bucket} problem {offset}"),
                level: 5,
            })
            .collect();
        let bytes = serde_json::to_vec(&items).expect("serialize items");
        let fingerprint = hex(&Sha256::digest(&bytes));
        let pool = serde_json::json!({
            "schema_version": 1,
            "bucket": { "name": bucket, "range": range, "count": 1 },
            "tags": [],
            "updated_at_epoch_ms": updated_at,
            "fingerprint": fingerprint,
            "items": items,
        });
        let path = self.pool_dir.join(format!("pool_{bucket}.json"));
        fs::write(&path, serde_json::to_string_pretty(&pool).expect("serialize pool"))
            .expect("write pool");
    }

    /// Run `mockct` with the fixture's pool directory.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_mockct"))
            .arg("--pool-dir")
            .arg(&self.pool_dir)
            .args(args)
            .env("RUST_LOG", "warn")
            .output()
            .expect("run mockct")
    }

    /// Run `start --no-prepare --json` into the fixture workspace and parse
    /// the report.
    pub fn start_json(&self, args: &[&str]) -> serde_json::Value {
        let workspace = self.workspace.display().to_string();
        let mut full = vec!["start"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--no-prepare", "--json", "--workspace", &workspace]);
        let output = self.run(&full);
        assert!(
            output.status.success(),
            "start failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("parse start report")
    }

    pub fn announcement_path(&self) -> PathBuf {
        self.workspace.join("EXAM.md")
    }
}

/// Problem ids of the picks in a `start --json` report, in order.
pub fn picked_ids(report: &serde_json::Value) -> Vec<u64> {
    report["exam"]["selection"]["picks"]
        .as_array()
        .expect("picks array")
        .iter()
        .map(|pick| pick["candidate"]["problemId"].as_u64().expect("problemId"))
        .collect()
}

pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn read_text(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
