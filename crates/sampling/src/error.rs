//! Error types for the sampling structures.

use epinet_types::Rate;
use thiserror::Error;

/// Errors from [`IndexedSet`](crate::IndexedSet) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexedSetError {
    /// Item is already a member.
    #[error("item is already in the set")]
    Duplicate,

    /// Item is not a member.
    #[error("item not found in the set")]
    NotFound,
}

/// Errors from weighted selection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectError {
    /// No candidates to choose from.
    #[error("no candidates to choose from")]
    Empty,

    /// Weights are negative, NaN, all zero, or sum past `f64::MAX`.
    #[error("invalid weights: {0}")]
    InvalidWeights(#[from] rand::distributions::WeightedError),
}

/// Errors from [`EventScheduler`](crate::EventScheduler) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// Event is already scheduled at this rate.
    #[error("event already scheduled at rate {0}")]
    Duplicate(Rate),

    /// Total activity is not a usable exponential rate.
    #[error("total activity {0} is not finite")]
    ActivityOverflow(f64),

    /// Rate group selection failed.
    #[error("rate group selection failed: {0}")]
    Select(#[from] SelectError),
}

/// Errors from [`SampleTree`](crate::SampleTree) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleTreeError {
    /// Element is already registered.
    #[error("element already in the tree")]
    Duplicate,

    /// Element is not registered.
    #[error("element not in the tree")]
    UnknownElement,

    /// Weight is negative or not finite.
    #[error("invalid weight {0}")]
    InvalidWeight(f64),

    /// Only leaves can be removed.
    #[error("node {0} is a branch, only leaves can be removed")]
    NotALeaf(usize),

    /// Structural invariant violated (reported by `validate`).
    #[error("inconsistent tree: {0}")]
    Inconsistent(String),
}
