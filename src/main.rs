use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chain_contention::config::DEFAULT_CONFIG_PATH;
use chain_contention::{load_config, Coordinator, RunReport, SimConfig, SimError, TerminationPolicy};

/// Worker pool draining an item pool through a locked sorted chain.
#[derive(Parser, Debug)]
#[command(name = "chain-contention")]
#[command(about = "Fine-grained vs coarse-grained locking under a random worker mix")]
struct Cli {
    /// Path to the TOML runtime config. A missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Universe size; items are 1..=N.
    #[arg(long)]
    items: Option<u32>,

    /// Emit a trace line for every transition.
    #[arg(long)]
    verbose: bool,

    /// Seed for the permutation and every worker's choices.
    #[arg(long)]
    seed: Option<u64>,

    /// How workers decide the run is over.
    #[arg(long, value_enum)]
    termination: Option<TerminationPolicy>,
}

impl Cli {
    fn apply(&self, cfg: &mut SimConfig) {
        if let Some(workers) = self.workers {
            cfg.worker_count = workers;
        }
        if let Some(items) = self.items {
            cfg.universe_size = items;
        }
        if self.verbose {
            cfg.verbose = true;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(termination) = self.termination {
            cfg.termination = termination;
        }
    }
}

fn run(cli: &Cli) -> Result<RunReport, SimError> {
    let mut cfg = load_config(&cli.config)?;
    cli.apply(&mut cfg);
    let coordinator = Coordinator::new(cfg)?;
    tracing::debug!(config = ?coordinator.config(), "resolved configuration");
    coordinator.run()
}

fn log_summary(report: &RunReport) {
    let stats = &report.stats;
    tracing::info!(
        iterations = stats.iterations,
        intakes = stats.intakes,
        intake_misses = stats.intake_misses,
        acknowledgements = stats.acknowledgements,
        acknowledge_skips = stats.acknowledge_skips,
        races_lost = stats.races_lost,
        probes = stats.probes,
        probe_hits = stats.probe_hits,
        "worker totals"
    );

    for (name, summary) in [
        ("intake", &report.timings.intake),
        ("acknowledge", &report.timings.acknowledge),
        ("probe", &report.timings.probe),
    ] {
        tracing::info!(
            transition = name,
            samples = summary.samples,
            p50 = ?summary.p50,
            p99 = ?summary.p99,
            max = ?summary.max,
            "transition latency"
        );
    }

    tracing::info!(
        chain_lock = report.contention.chain,
        pools_lock = report.contention.pools,
        pools_acquisitions = report.contention.pools_acquisitions,
        duplicates = report.duplicate_records,
        "lock contention"
    );
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) => {
            println!("Completed items: {}", report.completed_count());
            println!("Elapsed: {:.6} seconds", report.elapsed_secs());
            log_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
