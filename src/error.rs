//! Error types - configuration and process-level failures
//!
//! An empty pool or chain is never an error; workers skip and re-loop.
//! Only configuration problems and thread-level failures end up here.

use std::io;
use std::path::PathBuf;

use hdrhistogram::{AdditionError, CreationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("worker_count must be at least 1")]
    NoWorkers,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("failed to create latency histogram: {0:?}")]
    Histogram(CreationError),

    #[error("failed to merge latency histograms: {0:?}")]
    HistogramMerge(AdditionError),
}
