//! The `boj` tool's local `.boj/config.yaml`.
//!
//! The tool reads its config from the directory it runs in, so the file lives
//! at `<root>/.boj/config.yaml`. Existing keys are kept; missing filetypes are
//! added and the ongoing directory is pinned to the workspace root so `boj add`
//! scaffolds `<root>/<problemId>/`.
use super::Language;
use crate::util::write_atomic;
use anyhow::{anyhow, Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const BOJ_CONFIG_DIR: &str = ".boj";
pub const BOJ_CONFIG_FILE: &str = "config.yaml";
const ONGOING_DIR: &str = ".";
const ARCHIVE_DIR: &str = "solved";

pub fn boj_config_path(root: &Path) -> PathBuf {
    root.join(BOJ_CONFIG_DIR).join(BOJ_CONFIG_FILE)
}

/// Merge the filetypes and workspace layout into `<root>/.boj/config.yaml`,
/// and make `language` the default filetype when given.
///
/// A config that is not valid YAML is left untouched and reported as an error.
pub fn write_boj_config(root: &Path, language: Option<Language>) -> Result<PathBuf> {
    let path = boj_config_path(root);
    let mut config = read_config(&path)?;
    merge_config(&mut config, language)?;
    let text = serde_yaml::to_string(&Value::Mapping(config)).context("serialize boj config")?;
    write_atomic(&path, text.as_bytes())?;
    Ok(path)
}

fn read_config(path: &Path) -> Result<Mapping> {
    if !path.is_file() {
        return Ok(Mapping::new());
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: Value =
        serde_yaml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(anyhow!("{} is not a YAML mapping", path.display())),
    }
}

fn merge_config(config: &mut Mapping, language: Option<Language>) -> Result<()> {
    let general = section(config, "general")?;
    if let Some(language) = language {
        general.insert("default_filetype".into(), language.hint().into());
    }

    let workspace = section(config, "workspace")?;
    let previous = workspace.get("ongoing_dir").and_then(Value::as_str);
    if previous.is_some_and(|dir| dir != ONGOING_DIR) {
        tracing::warn!(
            previous = ?previous,
            "boj ongoing_dir redirected to the workspace root"
        );
    }
    workspace.insert("ongoing_dir".into(), ONGOING_DIR.into());
    set_default(workspace, "archive_dir", ARCHIVE_DIR.into());

    let filetypes = section(config, "filetype")?;
    for language in [Language::Py, Language::Cpp, Language::Java] {
        set_default(filetypes, language.hint(), filetype_entry(language));
    }
    Ok(())
}

/// Nested mapping under `key`, created (or replacing a scalar) when needed.
fn section<'m>(config: &'m mut Mapping, key: &str) -> Result<&'m mut Mapping> {
    if !config.get(key).is_some_and(Value::is_mapping) {
        config.insert(key.into(), Value::Mapping(Mapping::new()));
    }
    config
        .get_mut(key)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| anyhow!("boj config section {key:?} is not a mapping"))
}

fn set_default(mapping: &mut Mapping, key: &str, value: Value) {
    if !mapping.contains_key(key) {
        mapping.insert(key.into(), value);
    }
}

fn filetype_entry(language: Language) -> Value {
    let (submit_language, compile, run) = match language {
        Language::Py => (
            "python3",
            "",
            if cfg!(windows) { "python main.py" } else { "python3 main.py" },
        ),
        Language::Cpp => (
            "c++17",
            "g++ -std=c++17 -O2 -o main main.cc",
            if cfg!(windows) { "main.exe" } else { "./main" },
        ),
        Language::Java => ("java11", "javac Main.java", "java Main"),
    };
    let mut entry = Mapping::new();
    entry.insert("language".into(), submit_language.into());
    entry.insert("main".into(), language.starter_file().into());
    entry.insert("compile".into(), compile.into());
    entry.insert("run".into(), run.into());
    Value::Mapping(entry)
}
