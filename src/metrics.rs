//! Metrics module - Per-transition latency tracking and contention summary

use hdrhistogram::{AdditionError, CreationError, Histogram};
use std::time::Duration;

use crate::worker::Transition;

// ============================================================================
// OP TIMINGS - Worker-local latency histograms
// ============================================================================

/// Latency histograms for the three transitions, in nanoseconds.
///
/// Each worker owns one, so recording never touches a shared lock. The
/// coordinator merges them once every worker has exited.
#[derive(Clone)]
pub struct OpTimings {
    intake_hist: Histogram<u64>,
    acknowledge_hist: Histogram<u64>,
    probe_hist: Histogram<u64>,
}

impl OpTimings {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            intake_hist: Histogram::new(3)?,
            acknowledge_hist: Histogram::new(3)?,
            probe_hist: Histogram::new(3)?,
        })
    }

    fn hist_mut(&mut self, transition: Transition) -> &mut Histogram<u64> {
        match transition {
            Transition::Intake => &mut self.intake_hist,
            Transition::Acknowledge => &mut self.acknowledge_hist,
            Transition::Probe => &mut self.probe_hist,
        }
    }

    pub fn record(&mut self, transition: Transition, duration: Duration) {
        self.hist_mut(transition)
            .saturating_record(duration.as_nanos() as u64);
    }

    pub fn merge(&mut self, other: &OpTimings) -> Result<(), AdditionError> {
        self.intake_hist.add(&other.intake_hist)?;
        self.acknowledge_hist.add(&other.acknowledge_hist)?;
        self.probe_hist.add(&other.probe_hist)?;
        Ok(())
    }

    pub fn samples(&self, transition: Transition) -> u64 {
        match transition {
            Transition::Intake => self.intake_hist.len(),
            Transition::Acknowledge => self.acknowledge_hist.len(),
            Transition::Probe => self.probe_hist.len(),
        }
    }

    pub fn report(&self) -> TimingReport {
        let summarize = |hist: &Histogram<u64>| LatencySummary {
            samples: hist.len(),
            p50: Duration::from_nanos(hist.value_at_quantile(0.5)),
            p99: Duration::from_nanos(hist.value_at_quantile(0.99)),
            max: Duration::from_nanos(hist.max()),
        };

        TimingReport {
            intake: summarize(&self.intake_hist),
            acknowledge: summarize(&self.acknowledge_hist),
            probe: summarize(&self.probe_hist),
        }
    }
}

// ============================================================================
// TIMING REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50: Duration,
    pub p99: Duration,
    pub max: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimingReport {
    pub intake: LatencySummary,
    pub acknowledge: LatencySummary,
    pub probe: LatencySummary,
}

/// Acquisitions that found a lock already held, per lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentionReport {
    pub chain: u64,
    pub pools: u64,
    /// All pools lock acquisitions, contended or not.
    pub pools_acquisitions: u64,
}
