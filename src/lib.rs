pub mod chain;
pub mod pools;
pub mod worker;
pub mod coordinator;
pub mod metrics;
pub mod config;
pub mod error;

/// A unique work-item identifier.
pub type Item = u32;

pub use chain::{ChainViolation, OrderedChain};
pub use config::{load_config, parse_config, SimConfig, TerminationPolicy};
pub use coordinator::{Coordinator, RunReport};
pub use error::{ConfigError, SimError};
pub use metrics::{ContentionReport, OpTimings, TimingReport};
pub use pools::{PoolSnapshot, SharedPools};
pub use worker::{Outcome, Transition, Worker, WorkerReport, WorkerSettings, WorkerStats};
