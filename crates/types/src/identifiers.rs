//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Network node identifier.
///
/// Nodes of a network are the dense indices `0..node_count()`, so a
/// `NodeId` doubles as an index into per-node state vectors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a node id from a vector index.
    ///
    /// # Panics
    ///
    /// Panics if the index does not fit in a `u32`.
    pub fn from_index(index: usize) -> Self {
        NodeId(u32::try_from(index).expect("node index exceeds u32::MAX"))
    }

    /// Get the id as a vector index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        NodeId(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// A discrete state a node can occupy (e.g. `S`, `I`, `R`).
///
/// Backed by a shared string so clones are a reference-count bump; events
/// carry their destination compartment by value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Compartment(Arc<str>);

impl Compartment {
    /// Create a compartment from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Compartment(Arc::from(name.as_ref()))
    }

    /// Get the compartment name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Compartment {
    fn from(name: &str) -> Self {
        Compartment::new(name)
    }
}

impl From<String> for Compartment {
    fn from(name: String) -> Self {
        Compartment(Arc::from(name))
    }
}

impl Borrow<str> for Compartment {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Compartment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_node_id_index_round_trip() {
        let node = NodeId::from_index(17);
        assert_eq!(node, NodeId(17));
        assert_eq!(node.index(), 17);
        assert_eq!(node.to_string(), "Node(17)");
    }

    #[test]
    fn test_compartment_lookup_by_str() {
        let mut counts: HashMap<Compartment, usize> = HashMap::new();
        counts.insert(Compartment::from("S"), 3);

        // Borrow<str> allows lookups without allocating a Compartment
        assert_eq!(counts.get("S"), Some(&3));
        assert_eq!(counts.get("I"), None);
    }

    #[test]
    fn test_compartment_serde_is_transparent() {
        let json = serde_json::to_string(&Compartment::new("I")).unwrap();
        assert_eq!(json, "\"I\"");
        let back: Compartment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "I");
    }
}
