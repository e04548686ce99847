//! CLI argument parsing.
//!
//! Flags override values from `--config`; nothing is prompted for.
use crate::bucket::Preset;
use crate::workspace::Language;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mockct",
    version,
    about = "Deterministic mock coding tests from shared problem pools",
    after_help = "Commands:\n  refresh                          Refresh pool snapshots from the catalog (organizer)\n  start --exam-code <CODE>         Select problems, write the announcement, prepare workspaces\n  pools                            List pool snapshots and their fingerprints\n  init-config <PATH>               Write a config file with the default settings\n\nExamples:\n  mockct refresh --tags graph,dp\n  mockct start --exam-code SSAFY_python_20250821 --difficulty easy --lang py\n  mockct start --exam-code X1 --bucket warmup:B5~B4:2 --bucket main:S3~G5:1 --no-prepare",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// JSON config file (pool dir, workspace root, language, limits)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding pool_<bucket>.json snapshots
    #[arg(long, value_name = "DIR", global = true)]
    pub pool_dir: Option<PathBuf>,

    /// Emit debug logs (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Refresh(RefreshArgs),
    Start(StartArgs),
    Pools(PoolsArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Refresh pool snapshots from the problem catalog")]
pub struct RefreshArgs {
    /// Canonical bucket names to refresh (default: all five)
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub buckets: Vec<String>,

    /// Custom bucket to refresh, as name:RANGE:COUNT (repeatable)
    #[arg(long = "bucket", value_name = "SPEC")]
    pub custom_buckets: Vec<String>,

    /// Comma-separated tag filter, e.g. graph,dp
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Maximum catalog pages per bucket
    #[arg(long, value_name = "N")]
    pub max_pages: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(about = "Select the exam problems and prepare the workspace")]
pub struct StartArgs {
    /// Exam code shared by every participant
    #[arg(long, value_name = "CODE")]
    pub exam_code: String,

    /// Difficulty preset (default: mid)
    #[arg(long, value_enum, conflicts_with = "buckets")]
    pub difficulty: Option<Preset>,

    /// Custom bucket as name:RANGE:COUNT (repeatable)
    #[arg(long = "bucket", value_name = "SPEC")]
    pub buckets: Vec<String>,

    /// Starter language passed to the workspace tool
    #[arg(long, value_enum)]
    pub lang: Option<Language>,

    /// Workspace root for problem directories
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Exam length in minutes for the announcement
    #[arg(long, value_name = "MINUTES")]
    pub duration: Option<u32>,

    /// Skip workspace provisioning
    #[arg(long)]
    pub no_prepare: bool,

    /// Create problem1, problem2, ... links to the problem directories
    #[arg(long)]
    pub aliases: bool,

    /// Save each problem page as statement.pdf (needs wkhtmltopdf)
    #[arg(long)]
    pub save_pdf: bool,

    /// Reject pools refreshed after this epoch-millisecond timestamp
    #[arg(long, value_name = "EPOCH_MS")]
    pub exam_start: Option<u128>,

    /// Announcement output path (default: <workspace>/EXAM.md)
    #[arg(long, value_name = "PATH")]
    pub announce_out: Option<PathBuf>,

    /// Workspace tool command line (default: boj)
    #[arg(long, value_name = "CMD")]
    pub tool: Option<String>,

    /// Print the selection as JSON instead of a listing
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "List pool snapshots")]
pub struct PoolsArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a config file with the default settings")]
pub struct InitConfigArgs {
    /// Destination config path
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
