//! Worker task loop - random intake / acknowledge / probe transitions
//!
//! A worker never holds the chain lock and the pools lock at the same time.
//! Taking an item and inserting it are two separate calls, and other workers
//! may interleave between them.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chain::OrderedChain;
use crate::config::TerminationPolicy;
use crate::error::SimError;
use crate::metrics::OpTimings;
use crate::pools::SharedPools;
use crate::Item;

// ============================================================================
// TRANSITIONS - The three choices re-rolled every iteration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Take an item from the available pool and insert it into the chain.
    Intake,
    /// Remove the chain's head and record it as completed.
    Acknowledge,
    /// Search the chain for a random identifier.
    Probe,
}

impl Transition {
    pub const ALL: [Transition; 3] = [
        Transition::Intake,
        Transition::Acknowledge,
        Transition::Probe,
    ];

    /// Uniform three-way choice.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Intake => write!(f, "intake"),
            Transition::Acknowledge => write!(f, "acknowledge"),
            Transition::Probe => write!(f, "probe"),
        }
    }
}

/// What one transition did. The empty cases are skips, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted(Item),
    PoolEmpty,
    Acknowledged(Item),
    ChainEmpty,
    /// The chain looked non-empty but another worker emptied it first.
    RaceLost,
    Probed { item: Item, found: bool },
    /// Probe with an empty universe; there is nothing to draw from.
    NothingToProbe,
}

// ============================================================================
// WORKER STATS - Per-worker counters
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub iterations: u64,
    pub intakes: u64,
    pub intake_misses: u64,
    pub acknowledgements: u64,
    pub acknowledge_skips: u64,
    pub races_lost: u64,
    pub probes: u64,
    pub probe_hits: u64,
}

impl WorkerStats {
    fn observe(&mut self, outcome: Outcome) {
        self.iterations += 1;
        match outcome {
            Outcome::Inserted(_) => self.intakes += 1,
            Outcome::PoolEmpty => self.intake_misses += 1,
            Outcome::Acknowledged(_) => self.acknowledgements += 1,
            Outcome::ChainEmpty => self.acknowledge_skips += 1,
            Outcome::RaceLost => self.races_lost += 1,
            Outcome::Probed { found, .. } => {
                self.probes += 1;
                if found {
                    self.probe_hits += 1;
                }
            }
            Outcome::NothingToProbe => self.probes += 1,
        }
    }

    pub fn absorb(&mut self, other: &WorkerStats) {
        self.iterations += other.iterations;
        self.intakes += other.intakes;
        self.intake_misses += other.intake_misses;
        self.acknowledgements += other.acknowledgements;
        self.acknowledge_skips += other.acknowledge_skips;
        self.races_lost += other.races_lost;
        self.probes += other.probes;
        self.probe_hits += other.probe_hits;
    }
}

/// Everything a worker hands back when its loop exits.
pub struct WorkerReport {
    pub worker_id: usize,
    pub stats: WorkerStats,
    pub timings: OpTimings,
}

// ============================================================================
// WORKER - One execution unit
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub universe_size: Item,
    pub termination: TerminationPolicy,
    pub verbose: bool,
    pub seed: u64,
}

pub struct Worker {
    id: usize,
    chain: Arc<OrderedChain>,
    pools: Arc<SharedPools>,
    rng: StdRng,
    settings: WorkerSettings,
    stats: WorkerStats,
    timings: OpTimings,
}

impl Worker {
    pub fn new(
        id: usize,
        chain: Arc<OrderedChain>,
        pools: Arc<SharedPools>,
        settings: WorkerSettings,
    ) -> Result<Self, SimError> {
        Ok(Self {
            id,
            chain,
            pools,
            rng: StdRng::seed_from_u64(settings.seed),
            settings,
            stats: WorkerStats::default(),
            timings: OpTimings::new().map_err(SimError::Histogram)?,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Loop condition, checked once per iteration.
    pub fn should_continue(&self) -> bool {
        match self.settings.termination {
            TerminationPolicy::Outstanding => self.pools.has_pending_work(),
            TerminationPolicy::Observed => {
                !self.pools.available_is_empty() || !self.chain.is_empty()
            }
        }
    }

    /// Rolls a transition, applies it and records its outcome and latency.
    pub fn step(&mut self) -> Outcome {
        let transition = Transition::choose(&mut self.rng);
        let start = Instant::now();
        let outcome = self.apply(transition);
        self.timings.record(transition, start.elapsed());
        self.stats.observe(outcome);
        outcome
    }

    /// Applies one transition without touching stats or timings.
    pub fn apply(&mut self, transition: Transition) -> Outcome {
        let outcome = match transition {
            Transition::Intake => self.intake(),
            Transition::Acknowledge => self.acknowledge(),
            Transition::Probe => self.probe(),
        };
        self.trace(outcome);
        outcome
    }

    fn intake(&mut self) -> Outcome {
        let Some(item) = self.pools.take_available() else {
            return Outcome::PoolEmpty;
        };
        self.chain.insert(item);
        Outcome::Inserted(item)
    }

    fn acknowledge(&mut self) -> Outcome {
        if self.chain.is_empty() {
            return Outcome::ChainEmpty;
        }
        let Some(item) = self.chain.remove_head() else {
            return Outcome::RaceLost;
        };
        self.pools.record_completed(item);
        Outcome::Acknowledged(item)
    }

    fn probe(&mut self) -> Outcome {
        if self.settings.universe_size == 0 {
            return Outcome::NothingToProbe;
        }
        let item = self.rng.gen_range(1..=self.settings.universe_size);
        let found = self.chain.search(item);
        Outcome::Probed { item, found }
    }

    fn trace(&self, outcome: Outcome) {
        if !self.settings.verbose {
            return;
        }
        match outcome {
            Outcome::Inserted(item) => {
                tracing::info!(worker = self.id, item, "moved item from pool into chain")
            }
            Outcome::Acknowledged(item) => {
                tracing::info!(worker = self.id, item, "recorded completed item")
            }
            Outcome::Probed { item, found } => {
                tracing::info!(worker = self.id, item, found, "probed chain")
            }
            Outcome::RaceLost => {
                tracing::debug!(worker = self.id, "chain emptied before remove")
            }
            Outcome::PoolEmpty | Outcome::ChainEmpty | Outcome::NothingToProbe => {}
        }
    }

    /// Runs until the termination policy says the work is gone.
    pub fn run(mut self) -> WorkerReport {
        tracing::debug!(worker = self.id, "worker started");
        while self.should_continue() {
            self.step();
        }
        tracing::debug!(
            worker = self.id,
            iterations = self.stats.iterations,
            "worker finished"
        );

        WorkerReport {
            worker_id: self.id,
            stats: self.stats,
            timings: self.timings,
        }
    }
}
