//! Error types for the compartment process.

use epinet_sampling::{IndexedSetError, SchedulerError};
use epinet_types::{Compartment, NodeId, RateError};
use thiserror::Error;

/// Errors raised while building or advancing a compartment process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    /// A constant rate in the rate tables is unusable.
    #[error("invalid rate table: {0}")]
    InvalidRateTable(#[from] RateError),

    /// Node is not part of the network.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Compartment is not in the process alphabet.
    #[error("unknown compartment {0}")]
    UnknownCompartment(Compartment),

    /// A rule produced an unusable rate.
    #[error("invalid rate for transition to {compartment}: {source}")]
    InvalidRate {
        compartment: Compartment,
        #[source]
        source: RateError,
    },

    /// A weight-dependent rate needs an edge weight the network lacks.
    #[error("no weight on edge between {0} and {1}")]
    MissingEdgeWeight(NodeId, NodeId),

    /// Scheduler bookkeeping or sampling failed.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Per-node event index bookkeeping failed.
    #[error("event index error for {node}: {source}")]
    EventIndex {
        node: NodeId,
        #[source]
        source: IndexedSetError,
    },
}
