//! External workspace tool (`boj`) and the optional PDF renderer.
use super::boj_config::write_boj_config;
use super::Language;
use crate::util::truncate_bytes;
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const STDERR_SNIPPET_BYTES: usize = 400;
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const PDF_RENDERER: &str = "wkhtmltopdf";

/// Unreliable helper that scaffolds problem directories. Every call has a
/// non-tool fallback in the provisioner.
pub trait WorkspaceTool {
    /// One-time setup before any problem is scaffolded under `root`.
    fn prepare(&self, _root: &Path, _language: Option<Language>) -> Result<()> {
        Ok(())
    }

    /// Scaffold `problem_id`, run from `cwd`.
    fn add(&self, problem_id: u64, language_hint: Option<&str>, cwd: &Path) -> Result<()>;

    /// Download sample cases into the problem directory's `testcases/`.
    fn fetch_sample_cases(&self, problem_dir: &Path) -> Result<()>;
}

/// The `boj` command line client.
#[derive(Debug, Clone)]
pub struct BojCli {
    argv: Vec<String>,
    timeout: Duration,
}

impl BojCli {
    /// Parse a command such as `boj` or `python3 -m boj`.
    pub fn from_command(command: &str, timeout: Duration) -> Result<Self> {
        let argv = shell_words::split(command)
            .with_context(|| format!("parse workspace tool command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("workspace tool command is empty"));
        }
        Ok(Self { argv, timeout })
    }

    /// `boj` from PATH, or the Python module when only that is installed.
    pub fn discover(timeout: Duration) -> Self {
        let argv = match which::which("boj") {
            Ok(path) => vec![path.display().to_string()],
            Err(_) => vec!["python3".to_string(), "-m".to_string(), "boj".to_string()],
        };
        Self { argv, timeout }
    }

    fn run(&self, args: &[String], cwd: &Path) -> Result<()> {
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]).args(args).current_dir(cwd);
        let start = Instant::now();
        let output = run_with_timeout(command, self.timeout)
            .with_context(|| format!("run {} {}", self.argv.join(" "), args.join(" ")))?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            args = %args.join(" "),
            status = %output.status,
            "workspace tool invoke complete"
        );
        if !output.status.success() {
            return Err(anyhow!(
                "{} {} failed with status {}: {}",
                self.argv.join(" "),
                args.join(" "),
                output.status,
                truncate_bytes(&output.stderr, STDERR_SNIPPET_BYTES).trim()
            ));
        }
        Ok(())
    }
}

impl WorkspaceTool for BojCli {
    fn prepare(&self, root: &Path, language: Option<Language>) -> Result<()> {
        let path = write_boj_config(root, language)?;
        tracing::info!(path = %path.display(), ?language, "boj config ready");
        Ok(())
    }

    fn add(&self, problem_id: u64, language_hint: Option<&str>, cwd: &Path) -> Result<()> {
        let mut args = vec!["add".to_string()];
        if let Some(hint) = language_hint {
            args.push("--type".to_string());
            args.push(hint.to_string());
        }
        args.push(problem_id.to_string());
        self.run(&args, cwd)
    }

    fn fetch_sample_cases(&self, problem_dir: &Path) -> Result<()> {
        self.run(&["case".to_string()], problem_dir)
    }
}

/// Render `url` into `dest` with wkhtmltopdf. Errors when the renderer is
/// not on PATH.
pub fn render_pdf(url: &str, dest: &Path, timeout: Duration) -> Result<()> {
    let renderer: PathBuf =
        which::which(PDF_RENDERER).with_context(|| format!("locate {PDF_RENDERER}"))?;
    let mut command = Command::new(renderer);
    command.arg(url).arg(dest);
    let output = run_with_timeout(command, timeout).context("run pdf renderer")?;
    if !output.status.success() {
        return Err(anyhow!(
            "{PDF_RENDERER} failed with status {}: {}",
            output.status,
            truncate_bytes(&output.stderr, STDERR_SNIPPET_BYTES).trim()
        ));
    }
    Ok(())
}

/// Run a command to completion, killing it once `timeout` elapses.
fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<Output> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn command")?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait().context("wait for command")? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("timed out after {}s", timeout.as_secs_f32()));
        }
        thread::sleep(POLL_INTERVAL);
    };
    Ok(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-boj");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[test]
    fn add_passes_type_flag_and_reports_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("args.log");
        let tool_path = script(
            dir.path(),
            &format!(
                "echo \"$@\" >> {}\n[ \"$2\" = \"--type\" ] && {{ echo 'bad type' >&2; exit 3; }}\nexit 0",
                log.display()
            ),
        );
        let tool = BojCli::from_command(&tool_path.display().to_string(), Duration::from_secs(10))
            .expect("tool");
        let err = tool
            .add(1000, Some("py"), dir.path())
            .expect_err("hinted add fails");
        assert!(err.to_string().contains("bad type"));
        tool.add(1000, None, dir.path()).expect("plain add succeeds");
        let args = fs::read_to_string(&log).expect("read log");
        assert_eq!(args, "add --type py 1000\nadd 1000\n");
    }

    #[test]
    fn hung_tool_is_killed_after_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool_path = script(dir.path(), "sleep 30");
        let tool = BojCli::from_command(&tool_path.display().to_string(), Duration::from_millis(200))
            .expect("tool");
        let start = Instant::now();
        let err = tool.fetch_sample_cases(dir.path()).expect_err("timeout");
        assert!(format!("{err:#}").contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn prepare_writes_local_boj_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool = BojCli::from_command("boj", Duration::from_secs(1)).expect("tool");
        tool.prepare(dir.path(), Some(Language::Java)).expect("prepare");
        let text = fs::read_to_string(dir.path().join(".boj").join("config.yaml"))
            .expect("read config");
        assert!(text.contains("default_filetype: java"), "{text}");
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(BojCli::from_command("  ", Duration::from_secs(1)).is_err());
    }
}
