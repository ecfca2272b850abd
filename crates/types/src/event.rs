//! Transition events.

use crate::{Compartment, NodeId, Rate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate state transition competing with every other live event.
///
/// `actor` is the node whose state causes the firing and `target` is the
/// node that changes to `compartment`. For intrinsic events the two are
/// the same node. Two events with identical fields are the same
/// scheduler entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Node whose compartment drives the event.
    pub actor: NodeId,
    /// Node that changes compartment when the event fires.
    pub target: NodeId,
    /// Destination compartment of `target`.
    pub compartment: Compartment,
    /// Resolved firing rate.
    pub rate: Rate,
}

impl Event {
    /// Create an intrinsic event: `node` fires on its own.
    pub fn intrinsic(node: NodeId, compartment: Compartment, rate: Rate) -> Self {
        Self {
            actor: node,
            target: node,
            compartment,
            rate,
        }
    }

    /// Create an edge event: `actor` drives `target` into `compartment`.
    pub fn edge(actor: NodeId, target: NodeId, compartment: Compartment, rate: Rate) -> Self {
        Self {
            actor,
            target,
            compartment,
            rate,
        }
    }

    /// Whether this event is caused by the target's own state.
    pub fn is_intrinsic(&self) -> bool {
        self.actor == self.target
    }

    /// Check if `node` participates in this event.
    pub fn involves(&self, node: NodeId) -> bool {
        self.actor == node || self.target == node
    }

    /// The participant other than `node`, if this is an edge event
    /// involving `node`.
    pub fn partner_of(&self, node: NodeId) -> Option<NodeId> {
        if self.is_intrinsic() {
            None
        } else if self.actor == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.actor)
        } else {
            None
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} becomes {} @ {}",
            self.actor, self.target, self.compartment, self.rate
        )
    }
}
