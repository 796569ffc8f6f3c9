//! Hierarchical counter of label combinations.
//!
//! Counts are stored as a tree with one level per barcode set: the children of a
//! node at depth `d` are the distinct labels observed for set `d` after the
//! labels on the path to that node. Nodes live in an arena indexed by
//! [`NodeId`]; each node maps a child label to its id and remembers the order in
//! which children were first observed, which is the order rows are emitted in.

use std::collections::HashMap;

use thiserror::Error;

/// Index of a node in the [`CountTree`] arena
pub type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountError {
    #[error("Label path has {found} labels but the counter expects {expected}")]
    PathLength { expected: usize, found: usize },

    #[error("Cannot merge a counter of depth {found} into one of depth {expected}")]
    DepthMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone, Default)]
struct Node {
    label: String,
    /// Children in first-observation order
    children: Vec<NodeId>,
    /// Label -> child id
    index: HashMap<String, NodeId>,
    /// Leaf count (only meaningful at full depth)
    count: u64,
}

/// Nested frequency table of label combinations
#[derive(Debug, Clone)]
pub struct CountTree {
    depth: usize,
    nodes: Vec<Node>,
}

impl CountTree {
    /// Create an empty counter for paths of `depth` labels
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            nodes: vec![Node::default()],
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `true` if nothing has been counted yet
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[ROOT].count == 0
    }

    /// Record one observation of the label combination `path`.
    ///
    /// Missing nodes along the path are created on first observation.
    ///
    /// # Errors
    ///
    /// Returns `CountError::PathLength` if `path` does not have exactly
    /// `depth` labels.
    pub fn increment<S: AsRef<str>>(&mut self, path: &[S]) -> Result<(), CountError> {
        self.add(path, 1)
    }

    /// Add `count` observations of `path`.
    ///
    /// # Errors
    ///
    /// Returns `CountError::PathLength` if `path` does not have exactly
    /// `depth` labels.
    pub fn add<S: AsRef<str>>(&mut self, path: &[S], count: u64) -> Result<(), CountError> {
        if path.len() != self.depth {
            return Err(CountError::PathLength {
                expected: self.depth,
                found: path.len(),
            });
        }

        let mut node = ROOT;
        for label in path {
            node = self.child_or_insert(node, label.as_ref());
        }
        self.nodes[node].count += count;
        Ok(())
    }

    fn child_or_insert(&mut self, parent: NodeId, label: &str) -> NodeId {
        if let Some(&id) = self.nodes[parent].index.get(label) {
            return id;
        }

        let id = self.nodes.len();
        self.nodes.push(Node {
            label: label.to_string(),
            ..Node::default()
        });
        let parent_node = &mut self.nodes[parent];
        parent_node.children.push(id);
        parent_node.index.insert(label.to_string(), id);
        id
    }

    fn find(&self, prefix: &[&str]) -> Option<NodeId> {
        let mut node = ROOT;
        for label in prefix {
            node = *self.nodes[node].index.get(*label)?;
        }
        Some(node)
    }

    /// Count for a full combination, or `None` if it was never observed
    pub fn get(&self, path: &[&str]) -> Option<u64> {
        if path.len() != self.depth {
            return None;
        }
        self.find(path).map(|id| self.nodes[id].count)
    }

    /// Sum of all counts under a partial combination (empty prefix = grand total)
    pub fn subtotal(&self, prefix: &[&str]) -> u64 {
        if prefix.len() > self.depth {
            return 0;
        }
        let Some(start) = self.find(prefix) else {
            return 0;
        };

        let mut total = 0;
        let mut stack = vec![(start, prefix.len())];
        while let Some((id, level)) = stack.pop() {
            if level == self.depth {
                total += self.nodes[id].count;
            } else {
                stack.extend(self.nodes[id].children.iter().map(|&c| (c, level + 1)));
            }
        }
        total
    }

    /// Sum of all leaf counts
    pub fn total(&self) -> u64 {
        self.subtotal(&[])
    }

    /// Every root-to-leaf path with its count, depth-first in first-observation order
    pub fn rows(&self) -> Vec<(Vec<&str>, u64)> {
        let mut rows = Vec::new();
        if self.is_empty() {
            return rows;
        }

        let mut path: Vec<&str> = Vec::with_capacity(self.depth);
        // (node, level, next child index)
        let mut stack: Vec<(NodeId, usize, usize)> = vec![(ROOT, 0, 0)];
        while let Some((id, level, next)) = stack.pop() {
            let node = &self.nodes[id];
            if level == self.depth {
                rows.push((path.clone(), node.count));
                path.pop();
                continue;
            }
            if let Some(&child) = node.children.get(next) {
                stack.push((id, level, next + 1));
                path.push(&self.nodes[child].label);
                stack.push((child, level + 1, 0));
            } else {
                path.pop();
            }
        }
        rows
    }

    /// Add every count of `other` into this counter.
    ///
    /// Labels already present keep their position; labels new to this counter
    /// are appended in the order `other` first observed them.
    ///
    /// # Errors
    ///
    /// Returns `CountError::DepthMismatch` if the counters have different depths.
    pub fn merge(&mut self, other: &CountTree) -> Result<(), CountError> {
        if other.depth != self.depth {
            return Err(CountError::DepthMismatch {
                expected: self.depth,
                found: other.depth,
            });
        }
        for (path, count) in other.rows() {
            self.add(&path, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_creates_path_lazily() {
        let mut tree = CountTree::new(2);
        assert!(tree.is_empty());
        assert_eq!(tree.get(&["A", "AA"]), None);

        tree.increment(&["A", "AA"]).unwrap();
        tree.increment(&["A", "AA"]).unwrap();

        assert_eq!(tree.get(&["A", "AA"]), Some(2));
        assert_eq!(tree.rows(), vec![(vec!["A", "AA"], 2)]);
    }

    #[test]
    fn test_rows_follow_first_observation_order() {
        let mut tree = CountTree::new(2);
        tree.increment(&["B", "x"]).unwrap();
        tree.increment(&["A", "y"]).unwrap();
        tree.increment(&["B", "z"]).unwrap();
        tree.increment(&["B", "x"]).unwrap();

        assert_eq!(
            tree.rows(),
            vec![
                (vec!["B", "x"], 2),
                (vec!["B", "z"], 1),
                (vec!["A", "y"], 1),
            ]
        );
    }

    #[test]
    fn test_subtotals() {
        let mut tree = CountTree::new(3);
        tree.increment(&["A", "x", "1"]).unwrap();
        tree.increment(&["A", "x", "2"]).unwrap();
        tree.increment(&["A", "y", "1"]).unwrap();
        tree.increment(&["B", "x", "1"]).unwrap();

        assert_eq!(tree.total(), 4);
        assert_eq!(tree.subtotal(&["A"]), 3);
        assert_eq!(tree.subtotal(&["A", "x"]), 2);
        assert_eq!(tree.subtotal(&["C"]), 0);
        assert_eq!(tree.subtotal(&["A", "x", "1", "extra"]), 0);
    }

    #[test]
    fn test_wrong_path_length_rejected() {
        let mut tree = CountTree::new(2);
        assert_eq!(
            tree.increment(&["A"]),
            Err(CountError::PathLength {
                expected: 2,
                found: 1
            })
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn test_merge_matches_sequential_counting() {
        let paths = [["A", "x"], ["B", "y"], ["A", "z"], ["C", "x"], ["B", "y"]];

        let mut sequential = CountTree::new(2);
        for p in &paths {
            sequential.increment(p).unwrap();
        }

        let mut left = CountTree::new(2);
        let mut right = CountTree::new(2);
        for p in &paths[..2] {
            left.increment(p).unwrap();
        }
        for p in &paths[2..] {
            right.increment(p).unwrap();
        }
        left.merge(&right).unwrap();

        assert_eq!(left.rows(), sequential.rows());
        assert_eq!(left.total(), 5);
    }

    #[test]
    fn test_merge_depth_mismatch() {
        let mut a = CountTree::new(2);
        let b = CountTree::new(3);
        assert!(matches!(
            a.merge(&b),
            Err(CountError::DepthMismatch { .. })
        ));
    }
}
