//! Network fixtures.

use epinet_types::StaticNetwork;

fn build(node_count: usize, edges: Vec<(u32, u32)>) -> StaticNetwork {
    StaticNetwork::from_edges(node_count, edges).expect("fixture edges are valid")
}

/// Two nodes joined by one edge of the given weight.
pub fn pair(weight: f64) -> StaticNetwork {
    StaticNetwork::from_weighted_edges(2, [(0, 1, weight)]).expect("fixture edges are valid")
}

/// Nodes `0..n` joined in a line.
pub fn path(n: u32) -> StaticNetwork {
    build(n as usize, (1..n).map(|i| (i - 1, i)).collect())
}

/// Nodes `0..n` joined in a cycle. Needs at least three nodes.
pub fn ring(n: u32) -> StaticNetwork {
    assert!(n >= 3, "a ring needs at least three nodes");
    build(n as usize, (0..n).map(|i| (i, (i + 1) % n)).collect())
}

/// Node 0 joined to each of the `leaves` other nodes.
pub fn star(leaves: u32) -> StaticNetwork {
    build(leaves as usize + 1, (1..=leaves).map(|i| (0, i)).collect())
}

/// Every pair of the `n` nodes joined.
pub fn complete(n: u32) -> StaticNetwork {
    let edges = (0..n)
        .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
        .collect();
    build(n as usize, edges)
}
