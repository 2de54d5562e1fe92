//! CLI binary for pagegate.
//!
//! A thin shim over the library crate: meter local files, check document
//! passwords, and submit packaged batches as analysis jobs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pagegate::{meter, secure, ClientConfig, FileInput, JobSubmitter, Submission, TaskKind};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Count billable pages without submitting anything
  pagegate meter report.pdf ledger.xlsx rows.csv scan.png

  # Machine-readable breakdown
  pagegate meter --json *.pdf > pages.json

  # Check a password against an encrypted PDF
  pagegate verify protected.pdf --password hunter2

  # Submit a packaged batch as an analysis job
  pagegate submit \
      --discovery-url https://config.example.com/backend \
      --zip-url https://files.example.com/batch.zip \
      --task analyze --session sess-1 --owner user-1

BILLING RULES:
  Format         Pages
  ─────────      ─────────────────────────────────────────────
  pdf            native page count from the page table
  xlsx / xls     non-empty rows across all sheets, per 50 rows
  csv            non-blank lines minus a header row, per 50 rows
  png/jpg/jpeg   1
  anything else  0 (reported as a warning)

ENVIRONMENT VARIABLES:
  PAGEGATE_DISCOVERY_URL  Endpoint-discovery URL for `submit`
  PAGEGATE_PASSWORD       Password for `verify`
"#;

/// Meter documents, gate quotas, and submit analysis jobs.
#[derive(Parser, Debug)]
#[command(
    name = "pagegate",
    version,
    about = "Meter billable document pages and submit asynchronous analysis jobs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAGEGATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAGEGATE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count billable pages for local files without submitting anything.
    Meter {
        /// Files to meter.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output the breakdown as JSON.
        #[arg(long)]
        json: bool,

        /// Number of files counted concurrently.
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },

    /// Check a password against an encrypted PDF.
    Verify {
        /// The PDF file to check.
        file: PathBuf,

        /// The password to verify.
        #[arg(long, env = "PAGEGATE_PASSWORD")]
        password: String,
    },

    /// Submit a packaged batch as an analysis job.
    Submit {
        /// Endpoint-discovery URL for the processing backend.
        #[arg(long, env = "PAGEGATE_DISCOVERY_URL")]
        discovery_url: String,

        /// Locator of the uploaded batch archive.
        #[arg(long)]
        zip_url: String,

        /// Analysis task to run.
        #[arg(long, value_enum, default_value = "analyze")]
        task: TaskArg,

        /// Session identifier the job belongs to.
        #[arg(long)]
        session: String,

        /// Owner identifier the job is billed to.
        #[arg(long)]
        owner: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TaskArg {
    Analyze,
    Extract,
    Summarize,
}

impl From<TaskArg> for TaskKind {
    fn from(v: TaskArg) -> Self {
        match v {
            TaskArg::Analyze => TaskKind::Analyze,
            TaskArg::Extract => TaskKind::Extract,
            TaskArg::Summarize => TaskKind::Summarize,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Meter {
            files,
            json,
            concurrency,
        } => run_meter(files, json, concurrency, cli.quiet).await,
        Command::Verify { file, password } => run_verify(file, &password).await,
        Command::Submit {
            discovery_url,
            zip_url,
            task,
            session,
            owner,
        } => run_submit(discovery_url, zip_url, task.into(), session, owner, cli.quiet).await,
    }
}

async fn run_meter(
    paths: Vec<PathBuf>,
    json: bool,
    concurrency: usize,
    quiet: bool,
) -> Result<()> {
    let show_progress = !quiet && !json && paths.len() > 1;
    let bar = if show_progress {
        let bar = ProgressBar::new(paths.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Reading");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(FileInput::new(name, bytes));
        if let Some(ref bar) = bar {
            bar.inc(1);
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let batch = meter::count_batch(files, concurrency).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    println!("{:>7}  {:<8}{:>12}  NAME", "PAGES", "FORMAT", "SIZE");
    for file in &batch.files {
        println!(
            "{:>7}  {:<8}{:>12}  {}",
            file.pages,
            file.format.to_string(),
            file.size,
            file.name
        );
    }
    println!("{:>7}  {}", bold(&batch.total.to_string()), dim("total billable pages"));

    for warning in batch.warnings() {
        eprintln!("{} {warning}", red("⚠"));
    }
    Ok(())
}

async fn run_verify(path: PathBuf, password: &str) -> Result<()> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !secure::is_encrypted(&bytes) {
        println!("{} {} is not encrypted", green("✔"), name);
        return Ok(());
    }

    let pages = secure::verify(&name, bytes, password)
        .await
        .context("Password verification failed")?;
    println!("{} password accepted — {} pages", green("✔"), pages);
    Ok(())
}

async fn run_submit(
    discovery_url: String,
    zip_url: String,
    task: TaskKind,
    session: String,
    owner: String,
    quiet: bool,
) -> Result<()> {
    let config = ClientConfig::builder()
        .discovery_url(discovery_url)
        .build()
        .context("Invalid configuration")?;

    let submitter = JobSubmitter::new(&config).context("Failed to build client")?;
    let job = submitter
        .submit(&Submission {
            task,
            zip_url,
            session_id: session,
            owner_id: owner,
        })
        .await
        .context("Job submission failed")?;

    if quiet {
        println!("{}", job.id);
    } else {
        println!("{} job {} started ({})", green("✔"), bold(&job.id), job.task);
    }
    Ok(())
}
