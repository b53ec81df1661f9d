//! Configuration loading - TOML runtime config with defaults

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::Item;

pub const DEFAULT_CONFIG_PATH: &str = "config/simulation.toml";

/// How a worker decides that the run is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Keep going while any item is still available or taken but unrecorded.
    /// Evaluated under the pools lock in one acquisition.
    #[default]
    Outstanding,
    /// Keep going while the available pool or the chain looks non-empty.
    /// The two reads are independent, so an idle worker can leave early
    /// while another still holds an item between take and insert.
    Observed,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub worker_count: usize,
    pub universe_size: Item,
    pub verbose: bool,
    pub seed: Option<u64>,
    pub termination: TerminationPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            worker_count: 8,
            universe_size: 500_000,
            verbose: false,
            seed: None,
            termination: TerminationPolicy::Outstanding,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}

pub fn parse_config(source: &str) -> Result<SimConfig, ConfigError> {
    Ok(toml::from_str::<SimConfig>(source)?)
}

/// Loads the config at `path`. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<SimConfig, ConfigError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(s) => parse_config(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(SimConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
