//! Deterministic simulation driver.
//!
//! Wraps a [`CompartmentProcess`](epinet_core::CompartmentProcess) with a
//! seeded random stream, initial node placement and trajectory recording.
//! Given the same seed, network and rates it produces identical results
//! every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                CompartmentSimulation                    │
//! │                                                         │
//! │  reset(InitialCondition)                                │
//! │    explicit ─► weighted draw ─► default, per node       │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     CompartmentProcess                             │ │
//! │  │     EventScheduler: rate groups of live events     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │  next(ChaCha8Rng)           │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     record(): every trim-th step → Trajectory      │ │
//! │  │     maxima, custom accumulator                     │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod initial;
mod runner;
mod trajectory;

pub use config::{ConfigError, RecordConfig, SimulationConfig};
pub use error::SimulationError;
pub use initial::InitialCondition;
pub use runner::{CompartmentSimulation, Events};
pub use trajectory::Trajectory;
