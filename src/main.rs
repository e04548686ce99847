use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

mod announce;
mod bucket;
mod catalog;
mod cli;
mod config;
mod error;
mod exam;
mod pool;
mod select;
mod statement;
mod tier;
mod util;
mod workspace;

use bucket::{canonical_bucket, canonical_buckets, Bucket, BucketPlan};
use catalog::{http_agent, SolvedAcCatalog};
use cli::{Command, GlobalArgs, InitConfigArgs, PoolsArgs, RefreshArgs, RootArgs, StartArgs};
use config::{
    default_config, load_config, parse_tags, validate_config, write_config, ExamConfig,
};
use exam::{refresh_buckets, select_exam, ExamSelection};
use pool::{list_pools, RefreshOptions};
use statement::BojStatementSource;
use util::display_path;
use workspace::{BojCli, ProblemOutcome, ProvisionReport, Provisioner, WorkspaceConfig};

const ANNOUNCEMENT_FILE: &str = "EXAM.md";

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.global.verbose);
    let config = resolve_config(&args.global)?;

    match args.command {
        Command::Refresh(refresh) => cmd_refresh(&config, refresh),
        Command::Start(start) => cmd_start(config, start),
        Command::Pools(pools) => cmd_pools(&config, pools),
        Command::InitConfig(init) => cmd_init_config(&config, init),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(global: &GlobalArgs) -> Result<ExamConfig> {
    let mut config = match &global.config {
        Some(path) => load_config(path)?,
        None => default_config(),
    };
    if let Some(pool_dir) = &global.pool_dir {
        config.pool_dir = pool_dir.clone();
    }
    Ok(config)
}

fn cmd_refresh(config: &ExamConfig, args: RefreshArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some(tags) = &args.tags {
        config.tags = parse_tags(tags);
    }
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    validate_config(&config)?;

    let buckets = refresh_targets(&args)?;
    let agent = http_agent(config.http_timeout());
    let catalog = SolvedAcCatalog::new(agent, config.retry_policy());
    let options = RefreshOptions {
        tags: config.tags.clone(),
        max_pages: config.max_pages,
        page_size: config.page_size,
    };
    let summaries = refresh_buckets(&catalog, &buckets, &options, &config.pool_dir)?;
    for summary in &summaries {
        match &summary.path {
            Some(path) => println!(
                "Saved pool {} ({} problems) to {}",
                summary.bucket,
                summary.items,
                path.display()
            ),
            None => println!("Kept previous pool {} (refresh failed)", summary.bucket),
        }
        if let Some(warning) = &summary.warning {
            eprintln!("warning: {}: {warning}", summary.bucket);
        }
    }
    println!(
        "Share {} with every participant.",
        config.pool_dir.display()
    );
    Ok(())
}

fn refresh_targets(args: &RefreshArgs) -> Result<Vec<Bucket>> {
    let mut buckets = Vec::new();
    for name in &args.buckets {
        let bucket = canonical_bucket(name.trim())
            .ok_or_else(|| anyhow!("unknown canonical bucket {name:?}"))?;
        buckets.push(bucket);
    }
    buckets.extend(BucketPlan::from_custom_spec(&args.custom_buckets)?.buckets);
    if buckets.is_empty() {
        buckets = canonical_buckets();
    }
    Ok(buckets)
}

fn cmd_start(mut config: ExamConfig, args: StartArgs) -> Result<()> {
    if let Some(workspace) = &args.workspace {
        config.workspace_root = workspace.clone();
    }
    if args.lang.is_some() {
        config.language = args.lang;
    }
    if let Some(duration) = args.duration {
        config.duration_minutes = duration;
    }
    if args.tool.is_some() {
        config.tool_command = args.tool.clone();
    }
    validate_config(&config)?;

    let plan = if args.buckets.is_empty() {
        BucketPlan::from_preset(args.difficulty.unwrap_or_default())
    } else {
        BucketPlan::from_custom_spec(&args.buckets)?
    };

    let exam = select_exam(&args.exam_code, &plan, &config.pool_dir, args.exam_start)?;
    for mismatch in &exam.range_mismatches {
        eprintln!(
            "warning: bucket {} asks for {} but its pool was refreshed for {}",
            mismatch.bucket, mismatch.plan_range, mismatch.pool_range
        );
    }
    for shortfall in &exam.selection.shortfalls {
        eprintln!(
            "warning: bucket {} requested {} problem(s) but its pool has {}",
            shortfall.bucket, shortfall.requested, shortfall.available
        );
    }

    let announce_out = args
        .announce_out
        .clone()
        .unwrap_or_else(|| config.workspace_root.join(ANNOUNCEMENT_FILE));
    let announcement =
        announce::render_announcement(&exam.selection.picks, config.duration_minutes, &plan);
    util::write_atomic(&announce_out, announcement.as_bytes())
        .with_context(|| format!("write announcement {}", announce_out.display()))?;

    let outcomes = if args.no_prepare {
        Vec::new()
    } else {
        provision(&config, &args, &exam)?
    };

    if args.json {
        print_json(&StartReport {
            exam: &exam,
            announcement: &announce_out,
            provisioned: outcomes
                .iter()
                .filter_map(|outcome| outcome.result.as_ref().ok())
                .collect(),
            failed: outcomes
                .iter()
                .filter_map(|outcome| {
                    outcome
                        .result
                        .as_ref()
                        .err()
                        .map(|err| (outcome.problem_id, err.to_string()))
                })
                .collect(),
        })?;
    } else {
        print_start_summary(&config, &exam, &announce_out, &outcomes);
    }

    if outcomes.iter().any(|outcome| outcome.result.is_err()) {
        return Err(anyhow!("some problems could not be provisioned"));
    }
    Ok(())
}

fn provision(
    config: &ExamConfig,
    args: &StartArgs,
    exam: &ExamSelection,
) -> Result<Vec<ProblemOutcome>> {
    let mut workspace = WorkspaceConfig::new(config.workspace_root.clone(), config.language);
    workspace.aliases = args.aliases;
    workspace.save_pdf = args.save_pdf;
    let tool = match &config.tool_command {
        Some(command) => BojCli::from_command(command, config.tool_timeout())?,
        None => BojCli::discover(config.tool_timeout()),
    };
    let statements =
        BojStatementSource::new(http_agent(config.http_timeout()), config.retry_policy());
    let problems: Vec<(u64, String)> = exam
        .selection
        .picks
        .iter()
        .map(|pick| (pick.candidate.problem_id, pick.candidate.title().to_string()))
        .collect();
    Ok(Provisioner::new(&workspace, &tool, &statements).provision_all(&problems))
}

#[derive(Serialize)]
struct StartReport<'a> {
    exam: &'a ExamSelection,
    announcement: &'a Path,
    provisioned: Vec<&'a ProvisionReport>,
    failed: Vec<(u64, String)>,
}

fn print_start_summary(
    config: &ExamConfig,
    exam: &ExamSelection,
    announce_out: &Path,
    outcomes: &[ProblemOutcome],
) {
    println!("=== Mock exam (exam code: {}) ===", exam.exam_code);
    println!(
        "Selected {} of {} requested problem(s)",
        exam.selection.picks.len(),
        exam.plan.total_count()
    );
    for line in announce::render_console_listing(&exam.selection.picks) {
        println!("{line}");
    }
    println!("Wrote announcement to {}", announce_out.display());
    let base = Some(config.workspace_root.as_path());
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "Prepared {} ({:?})",
                display_path(&report.dir, base),
                report.add_path
            ),
            Err(err) => eprintln!("error: {err}"),
        }
    }
}

fn cmd_pools(config: &ExamConfig, args: PoolsArgs) -> Result<()> {
    #[derive(Serialize)]
    struct PoolListing {
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        pool: Option<exam::PoolRef>,
        #[serde(skip_serializing_if = "Option::is_none")]
        range: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    }

    let listings: Vec<PoolListing> = list_pools(&config.pool_dir)?
        .into_iter()
        .map(|(path, pool)| match pool {
            Ok(pool) => PoolListing {
                path,
                range: Some(pool.bucket.range.to_string()),
                pool: Some(exam::PoolRef::from(&pool)),
                error: None,
            },
            Err(err) => PoolListing {
                path,
                pool: None,
                range: None,
                error: Some(format!("{err:#}")),
            },
        })
        .collect();

    if args.json {
        return print_json(&listings);
    }
    if listings.is_empty() {
        println!("No pool snapshots in {}", config.pool_dir.display());
        return Ok(());
    }
    for listing in &listings {
        let name = display_path(&listing.path, Some(&config.pool_dir));
        match (&listing.pool, &listing.range, &listing.error) {
            (Some(pool), Some(range), _) => println!(
                "{name}: {} {range}, {} problems, refreshed at {} ms, fingerprint {}",
                pool.bucket, pool.items, pool.updated_at_epoch_ms, pool.fingerprint
            ),
            (_, _, Some(error)) => println!("{name}: unreadable ({error})"),
            _ => println!("{name}: unreadable"),
        }
    }
    Ok(())
}

fn cmd_init_config(config: &ExamConfig, args: InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        ));
    }
    write_config(&args.path, config)?;
    println!("Wrote config to {}", args.path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize JSON output")?;
    println!("{text}");
    Ok(())
}
