//! Weighted sampling tree.
//!
//! A binary tree whose leaves hold weighted elements and whose branches
//! cache the total weight beneath them. Sampling walks from the root,
//! choosing a side in proportion to its cached weight, so insert, update,
//! remove and sample all cost the depth of the tree.
//!
//! Nodes live in an arena and refer to each other by index. Every node
//! keeps the index of its parent so weight changes can be propagated to the
//! root; a parent index is a back-reference, never ownership.
//!
//! ```text
//!              [branch 6.0]
//!              /          \
//!       [branch 3.5]     (c:2.5)
//!        /        \
//!    (a:1.0)    (b:2.5)
//! ```

use crate::SampleTreeError;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Relative tolerance used by [`SampleTree::validate`] for cached weights.
const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
enum Kind<T> {
    Leaf(T),
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct TreeNode<T> {
    kind: Kind<T>,
    /// Leaf weight, or sum of descendant leaf weights for a branch.
    weight: f64,
    /// Number of leaves beneath, 1 for a leaf.
    size: usize,
    parent: Option<usize>,
}

/// Weighted population supporting proportional sampling.
///
/// Each element may be registered once. Insertion descends into the lighter
/// subtree, or the one with fewer leaves when both weigh the same, which
/// keeps the expected depth logarithmic under random insert/remove patterns
/// without strict rebalancing.
#[derive(Debug, Clone)]
pub struct SampleTree<T> {
    /// Node arena; `None` marks a free slot.
    nodes: Vec<Option<TreeNode<T>>>,
    /// Free arena slots available for reuse.
    free: Vec<usize>,
    root: Option<usize>,
    /// Element -> index of its leaf.
    leaves: HashMap<T, usize>,
}

impl<T> Default for SampleTree<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            leaves: HashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> SampleTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` with `weight`.
    pub fn insert(&mut self, element: T, weight: f64) -> Result<(), SampleTreeError> {
        if self.leaves.contains_key(&element) {
            return Err(SampleTreeError::Duplicate);
        }
        check_weight(weight)?;

        let Some(mut current) = self.root else {
            let leaf = self.alloc(Kind::Leaf(element.clone()), weight, 1, None);
            self.root = Some(leaf);
            self.leaves.insert(element, leaf);
            return Ok(());
        };

        // Descend to a leaf, charging the new weight to each branch passed
        loop {
            let node = self.node_mut(current);
            match node.kind {
                Kind::Branch { left, right } => {
                    node.weight += weight;
                    node.size += 1;
                    let (l, r) = (self.node(left), self.node(right));
                    current = if r.weight > l.weight {
                        left
                    } else if l.weight > r.weight {
                        right
                    } else if l.size < r.size {
                        left
                    } else {
                        right
                    };
                }
                Kind::Leaf(_) => break,
            }
        }

        // Split the leaf: a new branch takes its place, the new element goes
        // left and the old leaf moves right
        let old_leaf = current;
        let (old_weight, grandparent) = {
            let node = self.node(old_leaf);
            (node.weight, node.parent)
        };
        let leaf = self.alloc(Kind::Leaf(element.clone()), weight, 1, None);
        let branch = self.alloc(
            Kind::Branch {
                left: leaf,
                right: old_leaf,
            },
            old_weight + weight,
            2,
            grandparent,
        );
        self.node_mut(leaf).parent = Some(branch);
        self.node_mut(old_leaf).parent = Some(branch);
        self.replace_child(grandparent, old_leaf, branch);

        self.leaves.insert(element, leaf);
        Ok(())
    }

    /// Draw an element with probability proportional to its weight.
    ///
    /// Returns `None` if the tree is empty. When both sides of a branch
    /// weigh zero, a fair coin decides.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        let mut current = self.root?;
        loop {
            let node = self.node(current);
            match &node.kind {
                Kind::Leaf(element) => return Some(element),
                Kind::Branch { left, right } => {
                    let left_weight = self.node(*left).weight;
                    let total = left_weight + self.node(*right).weight;
                    let p_left = if total > 0.0 {
                        left_weight / total
                    } else {
                        0.5
                    };
                    current = if rng.gen::<f64>() < p_left {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Adjust the weight of `element` by `delta`.
    ///
    /// The same delta is applied to every ancestor. Nothing changes if the
    /// resulting weight would be negative or not finite.
    pub fn update(&mut self, element: &T, delta: f64) -> Result<(), SampleTreeError> {
        let leaf = *self
            .leaves
            .get(element)
            .ok_or(SampleTreeError::UnknownElement)?;
        let new_weight = self.node(leaf).weight + delta;
        check_weight(new_weight)?;
        self.propagate(Some(leaf), delta, 0);
        Ok(())
    }

    /// Set the weight of `element`.
    pub fn set_weight(&mut self, element: &T, weight: f64) -> Result<(), SampleTreeError> {
        check_weight(weight)?;
        let current = self.weight(element).ok_or(SampleTreeError::UnknownElement)?;
        self.update(element, weight - current)
    }

    /// Remove `element`, returning its weight.
    pub fn remove(&mut self, element: &T) -> Result<f64, SampleTreeError> {
        let leaf = *self
            .leaves
            .get(element)
            .ok_or(SampleTreeError::UnknownElement)?;
        let weight = self.remove_leaf(leaf)?;
        self.leaves.remove(element);
        Ok(weight)
    }

    /// Weight of `element`, if registered.
    pub fn weight(&self, element: &T) -> Option<f64> {
        self.leaves.get(element).map(|&leaf| self.node(leaf).weight)
    }

    /// Total weight of all elements.
    pub fn total_weight(&self) -> f64 {
        self.root.map_or(0.0, |root| self.node(root).weight)
    }

    /// Check whether `element` is registered.
    pub fn contains(&self, element: &T) -> bool {
        self.leaves.contains_key(element)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Check if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Length of the longest root-to-leaf path (0 for a single leaf or an
    /// empty tree).
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Kind::Branch { left, right } = self.node(index).kind {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        deepest
    }

    /// Check the structural invariants.
    ///
    /// Every branch weight and leaf count must equal the sum of its
    /// children's,
    /// every child must point back at its parent, and the element registry
    /// must match the reachable leaves exactly.
    pub fn validate(&self) -> Result<(), SampleTreeError> {
        let inconsistent = |msg: String| Err(SampleTreeError::Inconsistent(msg));

        let Some(root) = self.root else {
            if !self.leaves.is_empty() {
                return inconsistent(format!("empty tree with {} leaves", self.leaves.len()));
            }
            return Ok(());
        };
        if self.node(root).parent.is_some() {
            return inconsistent("root has a parent".to_string());
        }

        let mut reachable_leaves = 0;
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = self.node(index);
            match &node.kind {
                Kind::Leaf(element) => {
                    if self.leaves.get(element) != Some(&index) {
                        return inconsistent(format!("leaf {index} missing from registry"));
                    }
                    if node.weight < 0.0 {
                        return inconsistent(format!("leaf {index} has negative weight"));
                    }
                    if node.size != 1 {
                        return inconsistent(format!("leaf {index} has size {}", node.size));
                    }
                    reachable_leaves += 1;
                }
                Kind::Branch { left, right } => {
                    for child in [*left, *right] {
                        if self.node(child).parent != Some(index) {
                            return inconsistent(format!(
                                "child {child} does not point back at branch {index}"
                            ));
                        }
                        stack.push(child);
                    }
                    let size = self.node(*left).size + self.node(*right).size;
                    if node.size != size {
                        return inconsistent(format!(
                            "branch {index} counts {} leaves but children hold {size}",
                            node.size
                        ));
                    }
                    let sum = self.node(*left).weight + self.node(*right).weight;
                    let tolerance = WEIGHT_TOLERANCE * sum.abs().max(1.0);
                    if (node.weight - sum).abs() > tolerance {
                        return inconsistent(format!(
                            "branch {index} caches {} but children sum to {sum}",
                            node.weight
                        ));
                    }
                }
            }
        }

        if reachable_leaves != self.leaves.len() {
            return inconsistent(format!(
                "{reachable_leaves} reachable leaves, {} registered",
                self.leaves.len()
            ));
        }
        Ok(())
    }

    fn remove_leaf(&mut self, leaf: usize) -> Result<f64, SampleTreeError> {
        let node = self.node(leaf);
        if matches!(node.kind, Kind::Branch { .. }) {
            return Err(SampleTreeError::NotALeaf(leaf));
        }
        let weight = node.weight;

        let Some(parent) = node.parent else {
            // Sole remaining leaf
            self.release(leaf);
            self.root = None;
            return Ok(weight);
        };

        let sibling = match self.node(parent).kind {
            Kind::Branch { left, right } => {
                if left == leaf {
                    right
                } else {
                    left
                }
            }
            Kind::Leaf(_) => {
                return Err(SampleTreeError::Inconsistent(format!(
                    "parent {parent} of leaf {leaf} is a leaf"
                )))
            }
        };
        let grandparent = self.node(parent).parent;

        // The sibling takes the parent's place
        self.node_mut(sibling).parent = grandparent;
        self.replace_child(grandparent, parent, sibling);
        self.propagate(grandparent, -weight, -1);

        self.release(parent);
        self.release(leaf);
        Ok(weight)
    }

    /// Add `delta` weight and `leaves` leaves to `start` and every ancestor
    /// of it.
    fn propagate(&mut self, start: Option<usize>, delta: f64, leaves: isize) {
        let mut current = start;
        while let Some(index) = current {
            let node = self.node_mut(index);
            node.weight += delta;
            node.size = node.size.wrapping_add_signed(leaves);
            current = node.parent;
        }
    }

    /// Point `parent` (or the root, when `parent` is `None`) at `new`
    /// instead of `old`.
    fn replace_child(&mut self, parent: Option<usize>, old: usize, new: usize) {
        match parent {
            None => self.root = Some(new),
            Some(parent) => {
                if let Kind::Branch { left, right } = &mut self.node_mut(parent).kind {
                    if *left == old {
                        *left = new;
                    } else if *right == old {
                        *right = new;
                    }
                }
            }
        }
    }

    fn alloc(&mut self, kind: Kind<T>, weight: f64, size: usize, parent: Option<usize>) -> usize {
        let node = TreeNode {
            kind,
            weight,
            size,
            parent,
        };
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, index: usize) {
        self.nodes[index] = None;
        self.free.push(index);
    }

    fn node(&self, index: usize) -> &TreeNode<T> {
        self.nodes[index]
            .as_ref()
            .expect("tree references a released node")
    }

    fn node_mut(&mut self, index: usize) -> &mut TreeNode<T> {
        self.nodes[index]
            .as_mut()
            .expect("tree references a released node")
    }
}

fn check_weight(weight: f64) -> Result<(), SampleTreeError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(SampleTreeError::InvalidWeight(weight))
    }
}

impl<T: fmt::Display + Clone + Eq + Hash> fmt::Display for SampleTree<T> {
    /// Renders leaves as `(element:weight)` and branches as
    /// `[left,right:weight]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node<T: fmt::Display + Clone + Eq + Hash>(
            tree: &SampleTree<T>,
            index: usize,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            let node = tree.node(index);
            match &node.kind {
                Kind::Leaf(element) => write!(f, "({}:{})", element, node.weight),
                Kind::Branch { left, right } => {
                    f.write_str("[")?;
                    write_node(tree, *left, f)?;
                    f.write_str(",")?;
                    write_node(tree, *right, f)?;
                    write!(f, ":{}]", node.weight)
                }
            }
        }

        match self.root {
            Some(root) => write_node(self, root, f),
            None => f.write_str("[]"),
        }
    }
}
