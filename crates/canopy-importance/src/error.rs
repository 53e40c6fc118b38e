use canopy_forest::ForestError;

/// Errors from computing debiased importances or contrast-probe significance.
#[derive(Debug, thiserror::Error)]
pub enum ImportanceError {
    /// Returned when the dataset has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when a dataset row does not have the forest's feature count.
    #[error("configuration mismatch: sample {sample_index} has {got} features, forest was fit on {expected}")]
    ConfigurationMismatch {
        /// Feature count recorded by the forest.
        expected: usize,
        /// Feature count of the offending row.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the target vector and feature matrix disagree in length.
    #[error("{n_targets} targets for {n_samples} samples")]
    TargetLengthMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of targets.
        n_targets: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a target value is NaN or infinite.
    #[error("non-finite target at sample {sample_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a classification target is not 0 or 1.
    #[error("classification target at sample {sample_index} is {value}, expected 0 or 1")]
    NonBinaryLabel {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The offending target value.
        value: f64,
    },

    /// Returned when explicit in-bag counts do not hold one column per tree.
    #[error("{got} in-bag columns for {expected} trees")]
    InbagColumnCount {
        /// Number of trees in the forest.
        expected: usize,
        /// Number of columns supplied.
        got: usize,
    },

    /// Returned when an explicit in-bag column does not cover every sample.
    #[error("in-bag counts for tree {tree} cover {got} samples, expected {expected}")]
    InbagShapeMismatch {
        /// The tree whose counts are malformed.
        tree: usize,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when an explicit in-bag column does not record exactly one
    /// draw per sample.
    #[error("in-bag counts for tree {tree} sum to {got}, expected {expected} draws")]
    InbagConservation {
        /// The tree whose counts are malformed.
        tree: usize,
        /// Number of samples, which every bootstrap draws.
        expected: u64,
        /// Sum of the supplied counts.
        got: u64,
    },

    /// Returned when a tree's bootstrap cannot be replayed and the policy aborts.
    #[error("tree {tree}: bootstrap sample cannot be reconstructed")]
    UntraceableBootstrap {
        /// Zero-based position of the tree in the forest.
        tree: usize,
        /// The underlying replay error.
        source: ForestError,
    },

    /// Returned when every tree was skipped as untraceable.
    #[error("none of the {n_trees} trees has a traceable bootstrap")]
    NoTraceableTrees {
        /// Number of trees in the forest.
        n_trees: usize,
    },

    /// Returned when feature names do not match the importance vector.
    #[error("{got} feature names for {expected} importances")]
    FeatureNameMismatch {
        /// Number of importances.
        expected: usize,
        /// Number of names supplied.
        got: usize,
    },

    /// Returned when the contrast-probe procedure is configured with zero rounds.
    #[error("n_permutations must be at least 1, got {n_permutations}")]
    InvalidPermutationCount {
        /// The invalid value provided.
        n_permutations: usize,
    },

    /// Returned when the importance model fails during a contrast-probe round.
    #[error("importance model failed in round {round}")]
    ContrastModel {
        /// Round index: 0 is the baseline fit, 1.. are permutation rounds.
        round: usize,
        /// The model's error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when the importance model returns a vector of the wrong length.
    #[error("importance model returned {got} importances in round {round}, expected {expected}")]
    ContrastImportanceLength {
        /// Round index: 0 is the baseline fit, 1.. are permutation rounds.
        round: usize,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },
}
