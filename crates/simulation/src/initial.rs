//! Initial conditions for a simulation run.

use epinet_types::{Compartment, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How nodes are placed into compartments when a simulation is reset.
///
/// Each node takes, in order of precedence:
/// 1. its explicit assignment, if any;
/// 2. a random draw from `distribution`, if it is non-empty;
/// 3. `default`, or the process default compartment when unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialCondition {
    /// Per-node overrides.
    pub explicit: IndexMap<NodeId, Compartment>,

    /// Compartments with relative weights for the random draw.
    pub distribution: Vec<(Compartment, f64)>,

    /// Fallback compartment.
    pub default: Option<Compartment>,
}

impl InitialCondition {
    /// Every node in the process default compartment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `node` into `compartment`.
    pub fn with_node(mut self, node: NodeId, compartment: impl Into<Compartment>) -> Self {
        self.explicit.insert(node, compartment.into());
        self
    }

    /// Add `compartment` to the random draw with relative `weight`.
    pub fn with_share(mut self, compartment: impl Into<Compartment>, weight: f64) -> Self {
        self.distribution.push((compartment.into(), weight));
        self
    }

    /// Set the fallback compartment.
    pub fn with_default(mut self, compartment: impl Into<Compartment>) -> Self {
        self.default = Some(compartment.into());
        self
    }
}
