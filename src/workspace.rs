//! Participant workspace layout: `<root>/<problemId>/` holding a starter
//! source file, `PROBLEM.md`, and a `testcases/` directory.
mod boj_config;
mod provision;
mod tool;

pub use provision::{ProblemOutcome, ProvisionReport, Provisioner};
pub use tool::BojCli;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const STATEMENT_FILE: &str = "PROBLEM.md";
pub const TESTCASE_DIR: &str = "testcases";
pub const PDF_FILE: &str = "statement.pdf";
pub const ALIAS_PREFIX: &str = "problem";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Py,
    Cpp,
    Java,
}

impl Language {
    /// Value passed to the workspace tool's `--type` flag.
    pub fn hint(&self) -> &'static str {
        match self {
            Language::Py => "py",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    pub fn starter_file(&self) -> &'static str {
        match self {
            Language::Py => "main.py",
            Language::Cpp => "main.cc",
            Language::Java => "Main.java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

/// Starter file name for an optional language; Python when unset.
pub fn starter_file_name(language: Option<Language>) -> &'static str {
    language.unwrap_or(Language::Py).starter_file()
}

/// Everything the provisioner needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
    pub language: Option<Language>,
    /// Create `problemN` links next to the problem directories.
    pub aliases: bool,
    /// Render the problem page to `statement.pdf` when a renderer is present.
    pub save_pdf: bool,
}

impl WorkspaceConfig {
    pub fn new(root: PathBuf, language: Option<Language>) -> Self {
        Self {
            root,
            language,
            aliases: false,
            save_pdf: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn problem_dir(&self, problem_id: u64) -> PathBuf {
        self.root.join(problem_id.to_string())
    }

    pub fn starter_path(&self, problem_id: u64) -> PathBuf {
        self.problem_dir(problem_id)
            .join(starter_file_name(self.language))
    }

    pub fn statement_path(&self, problem_id: u64) -> PathBuf {
        self.problem_dir(problem_id).join(STATEMENT_FILE)
    }

    pub fn testcase_dir(&self, problem_id: u64) -> PathBuf {
        self.problem_dir(problem_id).join(TESTCASE_DIR)
    }

    /// `problemN` link path for the 1-based position in the selection.
    pub fn alias_path(&self, position: usize) -> PathBuf {
        self.root.join(format!("{ALIAS_PREFIX}{position}"))
    }
}
