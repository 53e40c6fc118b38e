/// Errors from building or replaying a tree ensemble.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when a forest is constructed with zero trees.
    #[error("forest must contain at least one tree")]
    EmptyForest,

    /// Returned when a forest is constructed with zero input features.
    #[error("forest must record at least one input feature")]
    ZeroFeatures,

    /// Returned when a tree was built for a different feature count than its forest.
    #[error("tree {tree} was built for {got} features, forest records {expected}")]
    TreeFeatureMismatch {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// Feature count recorded by the forest.
        expected: usize,
        /// Feature count the tree was built for.
        got: usize,
    },

    /// Returned when a tree has no nodes at all.
    #[error("tree {tree} has no nodes")]
    EmptyTree {
        /// Zero-based position of the tree in the forest.
        tree: usize,
    },

    /// Returned when the parallel node arrays of a tree disagree in length.
    #[error("tree {tree}: array `{field}` has {got} entries, expected {expected}")]
    ArrayLengthMismatch {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// Name of the offending array.
        field: &'static str,
        /// Length of `children_left`, which defines the node count.
        expected: usize,
        /// Length of the offending array.
        got: usize,
    },

    /// Returned when a node has exactly one child.
    #[error("tree {tree}, node {node}: has one child (left {left}, right {right})")]
    HalfSplit {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// The offending node id.
        node: usize,
        /// Raw left-child id.
        left: i64,
        /// Raw right-child id.
        right: i64,
    },

    /// Returned when a child id points outside the node arena.
    #[error("tree {tree}, node {node}: child id {child} is outside [1, {n_nodes})")]
    ChildOutOfBounds {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// The offending node id.
        node: usize,
        /// The raw child id.
        child: i64,
        /// Number of nodes in the tree.
        n_nodes: usize,
    },

    /// Returned when a node is referenced as a child more than once, or the root is referenced at all.
    #[error("tree {tree}: node {node} has more than one parent")]
    SharedChild {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// The node that was claimed twice.
        node: usize,
    },

    /// Returned when a node cannot be reached from the root.
    #[error("tree {tree}: node {node} is unreachable from the root")]
    UnreachableNode {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// The unreachable node id.
        node: usize,
    },

    /// Returned when a split node tests a feature the forest does not have.
    #[error("tree {tree}, node {node}: split feature {feature} is outside [0, {n_features})")]
    FeatureOutOfBounds {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// The offending node id.
        node: usize,
        /// The raw feature id.
        feature: i64,
        /// Number of features recorded by the forest.
        n_features: usize,
    },

    /// Returned when a split threshold or training impurity is NaN or infinite.
    #[error("tree {tree}, node {node}: non-finite {field}")]
    NonFiniteNodeValue {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// The offending node id.
        node: usize,
        /// Which value was non-finite.
        field: &'static str,
    },

    /// Returned when an exported bootstrap draw indexes past the training set.
    #[error("bootstrap draw {position} is sample {draw}, outside [0, {n_samples})")]
    DrawOutOfRange {
        /// Position of the draw in the exported sequence.
        position: usize,
        /// The drawn sample index.
        draw: usize,
        /// Number of training samples.
        n_samples: usize,
    },

    /// Returned when a tree's bootstrap cannot be reproduced.
    #[error("tree {tree}: untraceable bootstrap ({reason})")]
    UntraceableBootstrap {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// Human-readable description of why replay is impossible.
        reason: String,
    },
}
