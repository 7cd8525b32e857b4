//! Load test CLI.
//!
//! Prompts for any of url / users / requests not given on the command line,
//! runs the load test and prints one summary to stdout. Logs and the
//! progress bar go to stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use loadgen::{CancellationToken, LoadTestCoordinator, ResultsReport, RunConfig};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "load-test")]
#[command(about = "Simulate concurrent users issuing sequential GET requests", long_about = None)]
struct Args {
    /// Target URL (http or https)
    #[arg(long, env = "LOADTEST_URL")]
    url: Option<String>,

    /// Number of concurrent users
    #[arg(short = 'c', long, env = "LOADTEST_USERS")]
    users: Option<u32>,

    /// Requests per user
    #[arg(short = 'n', long, env = "LOADTEST_REQUESTS")]
    requests: Option<u64>,

    /// Scenario YAML file; command line values override it
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Accept invalid TLS certificates (local test targets only)
    #[arg(long)]
    insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "line")]
    output: OutputFormat,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Line,
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = resolve_config(&args)?;

    // Ctrl+C stops the workers; whatever finished is still reported.
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, stopping workers");
            trigger.cancel();
        }
    });

    let mut coordinator = LoadTestCoordinator::new(config).with_cancellation(cancel);
    if args.progress {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("##-"),
        );
        coordinator = coordinator.with_progress(pb);
    }

    let summary = coordinator.run().await?;
    if summary.cancelled {
        info!(
            collected = summary.total_requests,
            "Run interrupted, summary covers completed requests only"
        );
    }

    match args.output {
        OutputFormat::Line => println!("{}", ResultsReport::format_line(&summary)),
        OutputFormat::Table => println!("{}", ResultsReport::format_table(&summary)),
        OutputFormat::Json => println!("{}", ResultsReport::format_json(&summary)?),
    }

    Ok(())
}

/// Build the run configuration from the scenario file, flags and prompts.
fn resolve_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.scenario {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("Failed to load scenario {}", path.display()))?,
        None => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let url = match &args.url {
                Some(url) => url.clone(),
                None => prompt(&mut input, "Enter URL to test (use localhost!): ")?,
            };
            let users = match args.users {
                Some(users) => users,
                None => prompt(&mut input, "Enter number of concurrent users: ")?,
            };
            let requests = match args.requests {
                Some(requests) => requests,
                None => prompt(&mut input, "Enter requests per user: ")?,
            };
            RunConfig::new(url, users, requests)
        }
    };

    // Apply overrides
    if args.scenario.is_some() {
        if let Some(url) = &args.url {
            config.url = url.clone();
        }
        if let Some(users) = args.users {
            config.concurrency = users;
        }
        if let Some(requests) = args.requests {
            config.requests_per_worker = requests;
        }
    }
    if args.insecure {
        config.insecure = true;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    Ok(config)
}

/// Print `label` and parse one line of input.
fn prompt<T>(input: &mut impl BufRead, label: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read input")? == 0 {
        return Err(anyhow!("Unexpected end of input"));
    }

    let value = line.trim();
    value
        .parse()
        .map_err(|e| anyhow!("Invalid value '{}': {}", value, e))
}
