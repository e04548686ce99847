//! Per-problem provisioning state machine.
//!
//! `add` is tried with the language hint, then once without it, then the
//! layout is created by hand. The statement is rewritten on every run and
//! sample cases are fetched only into an empty `testcases/`. Only a
//! filesystem failure ends a problem's provisioning, and it never stops the
//! next problem.
use super::tool::{render_pdf, WorkspaceTool};
use super::{WorkspaceConfig, PDF_FILE};
use crate::error::ExamError;
use crate::statement::{render_statement, ProblemStatementSource};
use crate::util::write_atomic;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PDF_TIMEOUT: Duration = Duration::from_secs(60);

/// How the problem directory came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddPath {
    ToolSucceeded,
    ToolFailedRetried,
    FallbackUsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleCases {
    AlreadyPresent,
    Fetched,
    FetchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    Rendered,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub problem_id: u64,
    pub dir: PathBuf,
    pub add_path: AddPath,
    pub statement: StatementStatus,
    pub sample_cases: SampleCases,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ProblemOutcome {
    pub problem_id: u64,
    pub result: Result<ProvisionReport, ExamError>,
}

pub struct Provisioner<'a> {
    config: &'a WorkspaceConfig,
    tool: &'a dyn WorkspaceTool,
    statements: &'a dyn ProblemStatementSource,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        config: &'a WorkspaceConfig,
        tool: &'a dyn WorkspaceTool,
        statements: &'a dyn ProblemStatementSource,
    ) -> Self {
        Self {
            config,
            tool,
            statements,
        }
    }

    /// Provision every `(problem_id, title)` in order, collecting one outcome
    /// per problem.
    pub fn provision_all(&self, problems: &[(u64, String)]) -> Vec<ProblemOutcome> {
        if let Err(err) = self.tool.prepare(self.config.root(), self.config.language) {
            tracing::warn!(error = %format!("{err:#}"), "workspace tool setup failed");
        }
        problems
            .iter()
            .enumerate()
            .map(|(idx, (problem_id, title))| {
                let result = self.provision(*problem_id, title).map(|mut report| {
                    if self.config.aliases {
                        report.alias = self.link_alias(idx + 1, &report.dir);
                    }
                    report
                });
                if let Err(err) = &result {
                    tracing::error!(problem_id, error = %err, "provisioning failed");
                }
                ProblemOutcome {
                    problem_id: *problem_id,
                    result,
                }
            })
            .collect()
    }

    /// Bring one problem directory to the ready state.
    pub fn provision(&self, problem_id: u64, title: &str) -> Result<ProvisionReport, ExamError> {
        let fs_error = |action: &str, path: &Path, err: std::io::Error| {
            ExamError::ProvisioningFailed {
                problem_id,
                reason: format!("{action} {}: {err}", path.display()),
            }
        };
        let root = self.config.root();
        fs::create_dir_all(root).map_err(|err| fs_error("create", root, err))?;

        let mut add_path = self.run_add(problem_id);
        let dir = self.config.problem_dir(problem_id);
        if add_path != AddPath::FallbackUsed && !dir.is_dir() {
            tracing::warn!(
                problem_id,
                dir = %dir.display(),
                "workspace tool reported success but did not create the problem directory"
            );
            add_path = AddPath::FallbackUsed;
        }
        fs::create_dir_all(&dir).map_err(|err| fs_error("create", &dir, err))?;
        let starter = self.config.starter_path(problem_id);
        create_if_absent(&starter).map_err(|err| fs_error("create", &starter, err))?;
        let testcases = self.config.testcase_dir(problem_id);
        if add_path == AddPath::FallbackUsed {
            fs::create_dir_all(&testcases).map_err(|err| fs_error("create", &testcases, err))?;
        }

        let statement = self.statements.fetch(problem_id);
        let statement_status = if statement.fetch_error.is_some() {
            StatementStatus::Degraded
        } else {
            StatementStatus::Rendered
        };
        let statement_path = self.config.statement_path(problem_id);
        write_atomic(
            &statement_path,
            render_statement(problem_id, title, &statement).as_bytes(),
        )
        .map_err(|err| ExamError::ProvisioningFailed {
            problem_id,
            reason: format!("{err:#}"),
        })?;

        let sample_cases = if dir_has_entries(&testcases) {
            SampleCases::AlreadyPresent
        } else {
            match self.tool.fetch_sample_cases(&dir) {
                Ok(()) => SampleCases::Fetched,
                Err(err) => {
                    tracing::warn!(problem_id, error = %format!("{err:#}"), "sample case fetch failed");
                    SampleCases::FetchFailed
                }
            }
        };
        fs::create_dir_all(&testcases).map_err(|err| fs_error("create", &testcases, err))?;

        if self.config.save_pdf {
            let pdf = dir.join(PDF_FILE);
            if let Err(err) = render_pdf(&statement.url, &pdf, PDF_TIMEOUT) {
                tracing::warn!(problem_id, error = %format!("{err:#}"), "pdf render skipped");
            }
        }

        tracing::info!(problem_id, ?add_path, ?statement_status, ?sample_cases, "problem ready");
        Ok(ProvisionReport {
            problem_id,
            dir,
            add_path,
            statement: statement_status,
            sample_cases,
            alias: None,
        })
    }

    fn run_add(&self, problem_id: u64) -> AddPath {
        let root = self.config.root();
        let hint = self.config.language.map(|language| language.hint());
        let first = match self.tool.add(problem_id, hint, root) {
            Ok(()) => return AddPath::ToolSucceeded,
            Err(err) => err,
        };
        tracing::warn!(problem_id, ?hint, error = %format!("{first:#}"), "workspace tool add failed, retrying without hint");
        match self.tool.add(problem_id, None, root) {
            Ok(()) => AddPath::ToolFailedRetried,
            Err(err) => {
                tracing::warn!(problem_id, error = %format!("{err:#}"), "workspace tool add failed, creating layout directly");
                AddPath::FallbackUsed
            }
        }
    }

    fn link_alias(&self, position: usize, target: &Path) -> Option<PathBuf> {
        let alias = self.config.alias_path(position);
        if alias.symlink_metadata().is_ok() {
            tracing::debug!(alias = %alias.display(), "alias already present");
            return None;
        }
        match symlink_dir(target, &alias) {
            Ok(()) => Some(alias),
            Err(err) => {
                tracing::warn!(alias = %alias.display(), error = %err, "alias link failed");
                None
            }
        }
    }
}

/// Create an empty file unless something already exists at `path`.
fn create_if_absent(path: &Path) -> std::io::Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err),
    }
}

fn dir_has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod tests;
