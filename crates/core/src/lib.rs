//! Compartment process for epinet.
//!
//! [`CompartmentProcess`] is the state machine at the heart of the engine.
//! It is:
//!
//! - **Synchronous**: no async, no blocking
//! - **Deterministic**: the same state, rates and random stream give the
//!   same transitions
//! - **Self-consistent**: after every call the scheduler holds exactly the
//!   events the rate tables prescribe for the current state
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 CompartmentProcess                   │
//! │                                                      │
//! │  next(rng) ──► EventScheduler::next ──► (event, dt)  │
//! │                          │                           │
//! │                          ▼                           │
//! │  change_node_compartment(event.target, ...)          │
//! │    1. drop the node's events (both endpoints)        │
//! │    2. update counts and node mapping                 │
//! │    3. register node rule event                       │
//! │    4. register edge events with every neighbor       │
//! └──────────────────────────────────────────────────────┘
//! ```

mod error;
mod process;

pub use error::ProcessError;
pub use process::CompartmentProcess;
