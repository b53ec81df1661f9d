//! Coordinator - seeds the pools, runs the worker pool, collects the results

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chain::OrderedChain;
use crate::config::SimConfig;
use crate::error::{ConfigError, SimError};
use crate::metrics::{ContentionReport, OpTimings, TimingReport};
use crate::pools::SharedPools;
use crate::worker::{Worker, WorkerSettings, WorkerStats};
use crate::Item;

// ============================================================================
// RUN REPORT - What a finished run produced
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunReport {
    pub completed: HashSet<Item>,
    pub elapsed: Duration,
    /// Items left in the available pool when the last worker exited.
    pub stranded_available: usize,
    /// Items left in the chain when the last worker exited.
    pub stranded_in_chain: usize,
    pub duplicate_records: usize,
    pub stats: WorkerStats,
    pub timings: TimingReport,
    pub contention: ContentionReport,
}

impl RunReport {
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Every item of `1..=universe` completed exactly once and nothing else.
    pub fn is_conserved(&self, universe: Item) -> bool {
        self.duplicate_records == 0
            && self.completed.len() == universe as usize
            && self.completed.iter().all(|&id| (1..=universe).contains(&id))
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct Coordinator {
    config: SimConfig,
}

impl Coordinator {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seeds the pools, spawns the workers and blocks until all have exited.
    pub fn run(&self) -> Result<RunReport, SimError> {
        let cfg = &self.config;
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pools = Arc::new(SharedPools::shuffled(cfg.universe_size, &mut rng));
        let chain = Arc::new(OrderedChain::new());

        let workers = (0..cfg.worker_count)
            .map(|id| {
                let settings = WorkerSettings {
                    universe_size: cfg.universe_size,
                    termination: cfg.termination,
                    verbose: cfg.verbose,
                    seed: rng.gen(),
                };
                Worker::new(id, chain.clone(), pools.clone(), settings)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            workers = cfg.worker_count,
            universe = cfg.universe_size,
            termination = ?cfg.termination,
            "starting run"
        );

        let start = Instant::now();

        let mut handles = Vec::with_capacity(workers.len());
        for worker in workers {
            let id = worker.id();
            let handle = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || worker.run())
                .map_err(|source| SimError::Spawn { worker: id, source })?;
            handles.push((id, handle));
        }

        let mut stats = WorkerStats::default();
        let mut timings = OpTimings::new().map_err(SimError::Histogram)?;
        for (id, handle) in handles {
            let report = handle
                .join()
                .map_err(|_| SimError::WorkerPanicked { worker: id })?;
            stats.absorb(&report.stats);
            timings
                .merge(&report.timings)
                .map_err(SimError::HistogramMerge)?;
        }

        let elapsed = start.elapsed();

        let report = RunReport {
            completed: pools.take_completed(),
            elapsed,
            stranded_available: pools.available_len(),
            stranded_in_chain: chain.snapshot().len(),
            duplicate_records: pools.duplicate_records(),
            stats,
            timings: timings.report(),
            contention: ContentionReport {
                chain: chain.contention_count(),
                pools: pools.contention_count(),
                pools_acquisitions: pools.acquisition_count(),
            },
        };

        if report.stranded_available > 0 || report.stranded_in_chain > 0 {
            tracing::warn!(
                available = report.stranded_available,
                in_chain = report.stranded_in_chain,
                "workers exited with items left behind"
            );
        }

        Ok(report)
    }
}
