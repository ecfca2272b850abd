//! Error types for the simulation driver.

use crate::ConfigError;
use epinet_core::ProcessError;
use epinet_sampling::SelectError;
use thiserror::Error;

/// Errors that abort a simulation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// The initial distribution could not be sampled.
    #[error("invalid initial distribution: {0}")]
    Select(#[from] SelectError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
