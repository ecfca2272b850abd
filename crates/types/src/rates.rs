//! Rate tables: the rules that define a compartment process.

use crate::{Compartment, EdgeRate, Rate, RateError};
use indexmap::{IndexMap, IndexSet};

/// Spontaneous transition of a node in a given compartment.
#[derive(Debug, Clone)]
pub struct NodeRule {
    /// Compartment the node moves to.
    pub target: Compartment,
    /// Firing rate.
    pub rate: f64,
}

/// Transition of a node driven by one of its neighbors.
#[derive(Debug, Clone)]
pub struct EdgeRule {
    /// Compartment the driven node moves to.
    pub target: Compartment,
    /// Firing rate, possibly depending on the edge weight.
    pub rate: EdgeRate,
}

/// The node and edge rate tables of a compartment process.
///
/// Node rules are keyed by the node's compartment. Edge rules are keyed by
/// the ordered pair `(actor, target)`: the compartment of the influencing
/// neighbor first, then the compartment of the node that changes.
#[derive(Debug, Clone, Default)]
pub struct RateTables {
    node: IndexMap<Compartment, NodeRule>,
    edge: IndexMap<(Compartment, Compartment), EdgeRule>,
}

impl RateTables {
    /// Create empty rate tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node rule: a node in `from` moves to `to` at `rate`.
    ///
    /// A later rule for the same `from` replaces the earlier one.
    pub fn with_node_rule(
        mut self,
        from: impl Into<Compartment>,
        to: impl Into<Compartment>,
        rate: f64,
    ) -> Self {
        self.node.insert(
            from.into(),
            NodeRule {
                target: to.into(),
                rate,
            },
        );
        self
    }

    /// Add an edge rule: a node in `target` with a neighbor in `actor`
    /// moves to `to` at `rate`.
    pub fn with_edge_rule(
        mut self,
        actor: impl Into<Compartment>,
        target: impl Into<Compartment>,
        to: impl Into<Compartment>,
        rate: impl Into<EdgeRate>,
    ) -> Self {
        self.edge.insert(
            (actor.into(), target.into()),
            EdgeRule {
                target: to.into(),
                rate: rate.into(),
            },
        );
        self
    }

    /// Get the node rule for a compartment.
    pub fn node_rule(&self, compartment: &Compartment) -> Option<&NodeRule> {
        self.node.get(compartment)
    }

    /// Get the edge rule for an `(actor, target)` compartment pair.
    pub fn edge_rule(&self, actor: &Compartment, target: &Compartment) -> Option<&EdgeRule> {
        // IndexMap needs an owned tuple key for lookup
        self.edge.get(&(actor.clone(), target.clone()))
    }

    /// Iterate over node rules.
    pub fn node_rules(&self) -> impl Iterator<Item = (&Compartment, &NodeRule)> {
        self.node.iter()
    }

    /// Iterate over edge rules.
    pub fn edge_rules(&self) -> impl Iterator<Item = (&(Compartment, Compartment), &EdgeRule)> {
        self.edge.iter()
    }

    /// Check that every constant rate is a valid [`Rate`].
    ///
    /// Weight-dependent rates can only be checked once resolved.
    pub fn validate(&self) -> Result<(), RateError> {
        for rule in self.node.values() {
            Rate::new(rule.rate)?;
        }
        for rule in self.edge.values() {
            if let EdgeRate::Constant(value) = rule.rate {
                Rate::new(value)?;
            }
        }
        Ok(())
    }

    /// Derive the compartment alphabet.
    ///
    /// Contains every compartment named as a key or target in either table,
    /// plus `default`. The default comes first, the rest follow in table
    /// order.
    pub fn alphabet(&self, default: &Compartment) -> IndexSet<Compartment> {
        let mut alphabet = IndexSet::new();
        alphabet.insert(default.clone());
        for (from, rule) in &self.node {
            alphabet.insert(from.clone());
            alphabet.insert(rule.target.clone());
        }
        for ((actor, target), rule) in &self.edge {
            alphabet.insert(actor.clone());
            alphabet.insert(target.clone());
            alphabet.insert(rule.target.clone());
        }
        alphabet
    }
}
