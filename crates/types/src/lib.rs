//! Core types for epinet.
//!
//! Nodes, compartments, rates and events, the rate tables that define a
//! compartment process, and the [`Network`] trait the engine runs on.

mod event;
mod identifiers;
mod network;
mod rate;
mod rates;

pub use event::Event;
pub use identifiers::{Compartment, NodeId};
pub use network::{Network, NetworkError, StaticNetwork, MAX_NODES};
pub use rate::{EdgeRate, Rate, RateError};
pub use rates::{EdgeRule, NodeRule, RateTables};
