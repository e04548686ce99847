//! Exam configuration.
//!
//! Settings come from an optional JSON file named on the command line, with
//! CLI flags layered on top. Nothing is discovered from the working
//! directory or the home directory.
use crate::catalog::RetryPolicy;
use crate::workspace::Language;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

const DEFAULT_POOL_DIR: &str = "pool";
const DEFAULT_DURATION_MINUTES: u32 = 120;
const DEFAULT_MAX_PAGES: u32 = 3;
const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;
const DEFAULT_HTTP_RETRIES: u32 = 3;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamConfig {
    pub schema_version: u32,
    pub pool_dir: PathBuf,
    pub workspace_root: PathBuf,
    pub language: Option<Language>,
    pub duration_minutes: u32,
    pub tags: Vec<String>,
    pub max_pages: u32,
    pub page_size: u32,
    pub http_timeout_secs: u64,
    pub http_retries: u32,
    /// Workspace tool command line; `boj` from PATH when unset.
    pub tool_command: Option<String>,
    pub tool_timeout_secs: u64,
}

impl Default for ExamConfig {
    fn default() -> Self {
        default_config()
    }
}

impl ExamConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.http_retries,
            ..RetryPolicy::default()
        }
    }
}

pub fn default_config() -> ExamConfig {
    ExamConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        pool_dir: PathBuf::from(DEFAULT_POOL_DIR),
        workspace_root: PathBuf::from("."),
        language: None,
        duration_minutes: DEFAULT_DURATION_MINUTES,
        tags: Vec::new(),
        max_pages: DEFAULT_MAX_PAGES,
        page_size: DEFAULT_PAGE_SIZE,
        http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        http_retries: DEFAULT_HTTP_RETRIES,
        tool_command: None,
        tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
    }
}

/// Load a config file. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<ExamConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ExamConfig = serde_json::from_slice(&bytes).context("parse exam config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &ExamConfig) -> Result<()> {
    let text = serde_json::to_string_pretty(config).context("serialize exam config")?;
    crate::util::write_atomic(path, text.as_bytes())
}

pub fn validate_config(config: &ExamConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported exam config schema_version {}",
            config.schema_version
        ));
    }
    if config.page_size == 0 {
        return Err(anyhow!("page_size must be at least 1"));
    }
    if config.max_pages == 0 {
        return Err(anyhow!("max_pages must be at least 1"));
    }
    if config.http_timeout_secs == 0 || config.tool_timeout_secs == 0 {
        return Err(anyhow!("timeouts must be at least 1 second"));
    }
    if config.http_retries == 0 {
        return Err(anyhow!("http_retries must be at least 1"));
    }
    if config
        .tool_command
        .as_deref()
        .is_some_and(|command| command.trim().is_empty())
    {
        return Err(anyhow!("tool_command must be non-empty when set"));
    }
    Ok(())
}

/// Split a comma-separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
