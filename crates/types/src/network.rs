//! Network trait and static implementation.

use crate::NodeId;
use thiserror::Error;

/// Read-only view of the network a process runs on.
///
/// The engine needs node iteration, neighbor iteration and edge-weight
/// lookup, nothing more. Nodes are the dense ids `0..node_count()` and the
/// node set is fixed for the lifetime of a process.
///
/// Node ids are `u32`, so `node_count()` must not exceed [`MAX_NODES`].
pub trait Network {
    /// Number of nodes, at most [`MAX_NODES`].
    fn node_count(&self) -> usize;

    /// Iterate over the neighbors of `node`, each exactly once.
    fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_;

    /// Weight of the edge between two adjacent nodes.
    ///
    /// Returns `None` if the nodes are not adjacent or the edge carries no
    /// weight.
    fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f64>;

    // Derived methods

    /// Iterate over all nodes.
    ///
    /// # Panics
    ///
    /// Panics if `node_count()` exceeds [`MAX_NODES`].
    fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count()).map(NodeId::from_index)
    }

    /// Check whether `node` belongs to the network.
    fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    /// Number of neighbors of `node`.
    fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).count()
    }
}

/// Largest node count a [`Network`] may report.
pub const MAX_NODES: usize = u32::MAX as usize;

/// Errors that can occur when building a [`StaticNetwork`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Edge endpoint is outside `0..node_count`.
    #[error("edge endpoint {node} is out of range for {node_count} nodes")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    /// More nodes than a `NodeId` can address.
    #[error("{0} nodes exceed the limit of {max}", max = MAX_NODES)]
    TooManyNodes(usize),

    /// The same undirected edge was added twice.
    #[error("duplicate edge between {0} and {1}")]
    DuplicateEdge(NodeId, NodeId),
}

/// Undirected, weighted network stored as adjacency lists.
#[derive(Debug, Clone, Default)]
pub struct StaticNetwork {
    /// `adjacency[n]` holds `(neighbor, weight)` pairs of node `n`.
    adjacency: Vec<Vec<(NodeId, f64)>>,
    edge_count: usize,
}

impl StaticNetwork {
    /// Create a network of `node_count` isolated nodes.
    pub fn new(node_count: usize) -> Result<Self, NetworkError> {
        if node_count > MAX_NODES {
            return Err(NetworkError::TooManyNodes(node_count));
        }
        Ok(Self {
            adjacency: vec![Vec::new(); node_count],
            edge_count: 0,
        })
    }

    /// Build a network from an unweighted edge list (every weight is 1.0).
    pub fn from_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> Result<Self, NetworkError> {
        Self::from_weighted_edges(node_count, edges.into_iter().map(|(a, b)| (a, b, 1.0)))
    }

    /// Build a network from a weighted edge list.
    pub fn from_weighted_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (u32, u32, f64)>,
    ) -> Result<Self, NetworkError> {
        let mut network = Self::new(node_count)?;
        for (a, b, weight) in edges {
            network.add_edge(NodeId(a), NodeId(b), weight)?;
        }
        Ok(network)
    }

    /// Add an undirected edge.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f64) -> Result<(), NetworkError> {
        let node_count = self.adjacency.len();
        for node in [a, b] {
            if node.index() >= node_count {
                return Err(NetworkError::NodeOutOfRange { node, node_count });
            }
        }
        if self.adjacency[a.index()].iter().any(|(n, _)| *n == b) {
            return Err(NetworkError::DuplicateEdge(a, b));
        }

        self.adjacency[a.index()].push((b, weight));
        if a != b {
            self.adjacency[b.index()].push((a, weight));
        }
        self.edge_count += 1;
        Ok(())
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

impl Network for StaticNetwork {
    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(node.index())
            .into_iter()
            .flatten()
            .map(|(neighbor, _)| *neighbor)
    }

    fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.adjacency
            .get(a.index())?
            .iter()
            .find(|(neighbor, _)| *neighbor == b)
            .map(|(_, weight)| *weight)
    }
}
