//! fleetbench - fleet-scale benchmark orchestrator CLI.
//!
//! Two subcommands: `launch` submits a batch of job descriptors read from a
//! JSON file; `collect` scans a bucket prefix and prints a
//! [`fleetbench::model::CollectorSnapshot`]. Both run against the in-memory
//! [`fleetbench::cloud::memory::InMemoryCloudAdapter`] — wiring a real
//! provider SDK means supplying another [`fleetbench::cloud::CloudAdapter`]
//! implementation; the core has no provider-specific types to change.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleetbench::cloud::memory::InMemoryCloudAdapter;
use fleetbench::config::OrchestratorConfig;
use fleetbench::model::JobDescriptor;
use fleetbench::{Collector, Launcher};

#[derive(Parser)]
#[command(name = "fleetbench", about = "Fleet-scale benchmark orchestrator", version = fleetbench::VERSION)]
struct Cli {
    /// Path to an OrchestratorConfig TOML file. Falls back to the platform
    /// default config path, then to built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tee log output to this file in addition to stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a batch of job descriptors read from a JSON file.
    Launch {
        /// Path to a JSON array of job descriptors.
        #[arg(long)]
        input: PathBuf,
    },
    /// Scan the configured bucket and print a classification snapshot.
    Collect,
}

fn main() -> Result<()> {
    install_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = match &cli.config {
        Some(path) => OrchestratorConfig::load(path)?,
        None => OrchestratorConfig::load_or_default(),
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(run(cli.command, config))
}

async fn run(command: Command, config: OrchestratorConfig) -> Result<()> {
    let adapter = InMemoryCloudAdapter::new();

    match command {
        Command::Launch { input } => {
            let contents = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read job descriptor file: {}", input.display()))?;
            let batch: Vec<JobDescriptor> = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse job descriptors from {}", input.display()))?;

            tracing::info!(count = batch.len(), "submitting batch");
            let launcher = Launcher::new(adapter, config.provider.bucket.clone(), config.launch.max_concurrent_launches);
            let result = launcher.launch_batch(batch).await;

            tracing::info!(
                launched = result.launched_count(),
                failed = result.failed_count(),
                "batch complete"
            );
            println!("{}", serde_json::to_string_pretty(&result.launched)?);
            for error in &result.errors {
                eprintln!("error: {error}");
            }
        }
        Command::Collect => {
            let collector = Collector::new(adapter, config.provider.bucket.clone());
            let snapshot = collector.collect().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

/// Log any panic before the process unwinds, so a crash is visible in
/// structured logs rather than only on stderr.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("panic: {panic_info}");
        original_hook(panic_info);
    }));
}

/// Layered `tracing_subscriber` registry: stderr always, an optional file
/// tee when `--log-file` is given. Defaults to `fleetbench=info`, honoring
/// `RUST_LOG`.
fn init_logging(log_file: Option<&std::path::Path>) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fleetbench=info"));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr));

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create log file: {}", path.display()))?;
            registry
                .with(fmt::layer().with_writer(file).with_ansi(false).with_target(true))
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}
