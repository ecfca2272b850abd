//! Configuration types for a simulation run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for deterministic simulation.
    pub seed: u64,

    /// Recording configuration.
    pub record: RecordConfig,
}

impl SimulationConfig {
    /// Create a configuration with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            record: RecordConfig::default(),
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the recording configuration.
    pub fn with_record(mut self, record: RecordConfig) -> Self {
        self.record = record;
        self
    }

    /// Check the configuration for unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.record.validate()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(12345)
    }
}

/// Controls what [`record`](crate::CompartmentSimulation::record) keeps and
/// when it stops.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Keep every `trim`-th step. 1 keeps every step.
    pub trim: usize,

    /// Stop once simulation time reaches this bound.
    pub max_time: Option<f64>,

    /// Stop after this many steps.
    pub max_iterations: Option<u64>,

    /// Track the maximum count each compartment reaches.
    pub track_maxima: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            trim: 1,
            max_time: None,
            max_iterations: None,
            track_maxima: true,
        }
    }
}

impl RecordConfig {
    /// Set the sampling stride.
    pub fn with_trim(mut self, trim: usize) -> Self {
        self.trim = trim;
        self
    }

    /// Set the time bound.
    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Set the step bound.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Enable or disable maxima tracking.
    pub fn with_track_maxima(mut self, track: bool) -> Self {
        self.track_maxima = track;
        self
    }

    /// Whether a run at `time` after `iterations` steps may take another step.
    pub(crate) fn within_bounds(&self, time: f64, iterations: u64) -> bool {
        self.max_time.map_or(true, |bound| time < bound)
            && self.max_iterations.map_or(true, |bound| iterations < bound)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.trim == 0 {
            return Err(ConfigError::ZeroTrim);
        }
        if let Some(max_time) = self.max_time {
            if max_time.is_nan() || max_time <= 0.0 {
                return Err(ConfigError::InvalidMaxTime(max_time));
            }
        }
        Ok(())
    }
}

/// Errors in a [`SimulationConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("trim must be at least 1")]
    ZeroTrim,

    #[error("max_time must be positive, got {0}")]
    InvalidMaxTime(f64),
}
