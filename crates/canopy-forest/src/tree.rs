use std::collections::VecDeque;

use crate::{
    ForestError,
    node::{FeatureIndex, Impurity, Node, NodeIndex},
};

/// A fitted tree in the parallel-array layout used by most tree learners.
///
/// Arrays are indexed by node id, the root is node 0, and a negative child
/// id (`-1` in scikit-learn's `tree_` export) marks a leaf. `feature` and
/// `threshold` are ignored for leaves.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeArrays {
    /// Seed the tree's bootstrap sample was drawn with, if it was recorded.
    pub seed: Option<u64>,
    /// Left-child id per node.
    pub children_left: Vec<i64>,
    /// Right-child id per node.
    pub children_right: Vec<i64>,
    /// Split feature id per node.
    pub feature: Vec<i64>,
    /// Split threshold per node: samples with `x[feature] <= threshold` go left.
    pub threshold: Vec<f64>,
    /// Training-time impurity per node.
    pub impurity: Vec<f64>,
}

/// A read-only fitted tree held as a flat node arena.
///
/// Construction validates that the arena forms a proper binary tree rooted at
/// node 0 and precomputes the parent of every node.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeIndex>>,
    seed: Option<u64>,
    n_features: usize,
}

impl Tree {
    /// Build a tree from an already-typed node arena.
    ///
    /// `tree` is the tree's position in its forest and only labels errors.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ForestError::EmptyTree`] | `nodes` is empty |
    /// | [`ForestError::ChildOutOfBounds`] | a child id is the root or past the arena |
    /// | [`ForestError::SharedChild`] | a node is claimed by two parents |
    /// | [`ForestError::UnreachableNode`] | a node is not reachable from the root |
    /// | [`ForestError::FeatureOutOfBounds`] | a split feature is `>= n_features` |
    /// | [`ForestError::NonFiniteNodeValue`] | a threshold or impurity is NaN or infinite |
    pub fn from_nodes(
        tree: usize,
        nodes: Vec<Node>,
        seed: Option<u64>,
        n_features: usize,
    ) -> Result<Self, ForestError> {
        let n_nodes = nodes.len();
        if n_nodes == 0 {
            return Err(ForestError::EmptyTree { tree });
        }

        let mut parents: Vec<Option<NodeIndex>> = vec![None; n_nodes];
        for (i, node) in nodes.iter().enumerate() {
            if !node.impurity().value().is_finite() {
                return Err(ForestError::NonFiniteNodeValue {
                    tree,
                    node: i,
                    field: "impurity",
                });
            }
            let Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } = node
            else {
                continue;
            };
            if feature.index() >= n_features {
                return Err(ForestError::FeatureOutOfBounds {
                    tree,
                    node: i,
                    feature: feature.index() as i64,
                    n_features,
                });
            }
            if !threshold.is_finite() {
                return Err(ForestError::NonFiniteNodeValue {
                    tree,
                    node: i,
                    field: "threshold",
                });
            }
            for child in [*left, *right] {
                if child == NodeIndex::ROOT || child.index() >= n_nodes {
                    return Err(ForestError::ChildOutOfBounds {
                        tree,
                        node: i,
                        child: child.index() as i64,
                        n_nodes,
                    });
                }
                if parents[child.index()].is_some() {
                    return Err(ForestError::SharedChild {
                        tree,
                        node: child.index(),
                    });
                }
                parents[child.index()] = Some(NodeIndex::new(i));
            }
        }

        // Every node has at most one parent and the root has none, so a walk
        // from the root cannot revisit a node.
        let mut reached = vec![false; n_nodes];
        let mut stack = vec![NodeIndex::ROOT];
        while let Some(idx) = stack.pop() {
            reached[idx.index()] = true;
            if let Some((left, right)) = nodes[idx.index()].children() {
                stack.push(right);
                stack.push(left);
            }
        }
        if let Some(node) = reached.iter().position(|&r| !r) {
            return Err(ForestError::UnreachableNode { tree, node });
        }

        Ok(Self {
            nodes,
            parents,
            seed,
            n_features,
        })
    }

    /// Build a tree from the parallel-array layout.
    ///
    /// # Errors
    ///
    /// Everything [`Tree::from_nodes`] rejects, plus
    /// [`ForestError::ArrayLengthMismatch`] when the arrays disagree in length
    /// and [`ForestError::HalfSplit`] when a node has exactly one child.
    pub fn from_arrays(
        tree: usize,
        arrays: &TreeArrays,
        n_features: usize,
    ) -> Result<Self, ForestError> {
        let n_nodes = arrays.children_left.len();
        let lengths = [
            ("children_right", arrays.children_right.len()),
            ("feature", arrays.feature.len()),
            ("threshold", arrays.threshold.len()),
            ("impurity", arrays.impurity.len()),
        ];
        for (field, got) in lengths {
            if got != n_nodes {
                return Err(ForestError::ArrayLengthMismatch {
                    tree,
                    field,
                    expected: n_nodes,
                    got,
                });
            }
        }

        let mut nodes = Vec::with_capacity(n_nodes);
        for i in 0..n_nodes {
            let left = arrays.children_left[i];
            let right = arrays.children_right[i];
            let impurity = Impurity::new(arrays.impurity[i]);
            let node = match (left < 0, right < 0) {
                (true, true) => Node::Leaf { impurity },
                (false, false) => {
                    let feature = arrays.feature[i];
                    if feature < 0 || feature as usize >= n_features {
                        return Err(ForestError::FeatureOutOfBounds {
                            tree,
                            node: i,
                            feature,
                            n_features,
                        });
                    }
                    for child in [left, right] {
                        if child as usize >= n_nodes {
                            return Err(ForestError::ChildOutOfBounds {
                                tree,
                                node: i,
                                child,
                                n_nodes,
                            });
                        }
                    }
                    Node::Split {
                        feature: FeatureIndex::new(feature as usize),
                        threshold: arrays.threshold[i],
                        left: NodeIndex::new(left as usize),
                        right: NodeIndex::new(right as usize),
                        impurity,
                    }
                }
                _ => {
                    return Err(ForestError::HalfSplit {
                        tree,
                        node: i,
                        left,
                        right,
                    });
                }
            };
            nodes.push(node);
        }

        Self::from_nodes(tree, nodes, arrays.seed, n_features)
    }

    /// Return the bootstrap seed, if the tree recorded one.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Return the number of input features the tree was fit on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Borrow the node arena.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Borrow a single node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not a node of this tree.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.index()]
    }

    /// Return the parent of `idx`, or `None` for the root.
    #[must_use]
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.parents[idx.index()]
    }

    /// Iterate over the split nodes with their features.
    pub fn splits(&self) -> impl Iterator<Item = (NodeIndex, FeatureIndex)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.split_feature().map(|f| (NodeIndex::new(i), f)))
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back((NodeIndex::ROOT, 0usize));

        while let Some((idx, d)) = queue.pop_front() {
            match self.node(idx).children() {
                None => max_depth = max_depth.max(d),
                Some((left, right)) => {
                    queue.push_back((left, d + 1));
                    queue.push_back((right, d + 1));
                }
            }
        }

        max_depth
    }

    /// Append every node `sample` visits, root first and leaf last, to `path`.
    ///
    /// At each split the sample goes left when `sample[feature] <= threshold`.
    /// The caller guarantees `sample.len() == self.n_features()`.
    pub fn extend_path(&self, sample: &[f64], path: &mut Vec<NodeIndex>) {
        let mut idx = NodeIndex::ROOT;
        loop {
            path.push(idx);
            match self.node(idx) {
                Node::Leaf { .. } => return,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    #[cfg(test)]
    fn leaf(&self, sample: &[f64]) -> NodeIndex {
        let mut path = Vec::new();
        self.extend_path(sample, &mut path);
        path.last().copied().unwrap_or(NodeIndex::ROOT)
    }
}
