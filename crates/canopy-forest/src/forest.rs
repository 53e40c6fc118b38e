//! A fitted bagged ensemble, read-only.

use tracing::{debug, instrument};

use crate::bootstrap::{BootstrapSampler, InbagCounts, InbagMatrix};
use crate::error::ForestError;
use crate::tree::{Tree, TreeArrays};

/// Exported description of a fitted forest: every tree in the parallel-array
/// layout plus the feature count and the bootstrap convention.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForestArrays {
    /// Number of input features the forest was fit on.
    pub n_features: usize,
    /// Sampling convention the trainer drew bootstrap samples with.
    #[serde(default)]
    pub sampler: BootstrapSampler,
    /// Trees in ensemble order.
    pub trees: Vec<TreeArrays>,
}

impl ForestArrays {
    /// Validate the description and build the forest.
    ///
    /// # Errors
    ///
    /// See [`Forest::from_arrays`].
    pub fn into_forest(self) -> Result<Forest, ForestError> {
        Forest::from_arrays(&self.trees, self.n_features, self.sampler)
    }
}

/// A fitted bagged tree ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    n_features: usize,
    sampler: BootstrapSampler,
}

impl Forest {
    /// Assemble a forest from validated trees.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ForestError::EmptyForest`] | `trees` is empty |
    /// | [`ForestError::ZeroFeatures`] | `n_features` is zero |
    /// | [`ForestError::TreeFeatureMismatch`] | a tree was built for another feature count |
    pub fn new(
        trees: Vec<Tree>,
        n_features: usize,
        sampler: BootstrapSampler,
    ) -> Result<Self, ForestError> {
        if trees.is_empty() {
            return Err(ForestError::EmptyForest);
        }
        if n_features == 0 {
            return Err(ForestError::ZeroFeatures);
        }
        for (tree, t) in trees.iter().enumerate() {
            if t.n_features() != n_features {
                return Err(ForestError::TreeFeatureMismatch {
                    tree,
                    expected: n_features,
                    got: t.n_features(),
                });
            }
        }
        Ok(Self {
            trees,
            n_features,
            sampler,
        })
    }

    /// Build a forest from per-tree parallel arrays.
    ///
    /// # Errors
    ///
    /// Any structural error from [`Tree::from_arrays`], labelled with the
    /// tree's position, plus the errors of [`Forest::new`].
    #[instrument(skip_all, fields(n_trees = trees.len(), n_features = n_features))]
    pub fn from_arrays(
        trees: &[TreeArrays],
        n_features: usize,
        sampler: BootstrapSampler,
    ) -> Result<Self, ForestError> {
        if n_features == 0 {
            return Err(ForestError::ZeroFeatures);
        }
        let trees = trees
            .iter()
            .enumerate()
            .map(|(i, arrays)| Tree::from_arrays(i, arrays, n_features))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            n_nodes = trees.iter().map(Tree::n_nodes).sum::<usize>(),
            "forest structure validated"
        );
        Self::new(trees, n_features, sampler)
    }

    /// Borrow the trees in ensemble order.
    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of input features recorded by the forest.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the bootstrap sampling convention.
    #[must_use]
    pub fn sampler(&self) -> BootstrapSampler {
        self.sampler
    }

    /// Replay the bootstrap of tree `tree` over a training set of `n_samples`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::UntraceableBootstrap`] when the tree's seed is
    /// missing or cannot be replayed.
    ///
    /// # Panics
    ///
    /// Panics if `tree >= self.n_trees()`.
    pub fn replay(&self, tree: usize, n_samples: usize) -> Result<InbagCounts, ForestError> {
        self.sampler
            .replay(tree, self.trees[tree].seed(), n_samples)
    }

    /// Replay every tree's bootstrap into an `n_samples × n_trees` matrix.
    ///
    /// # Errors
    ///
    /// Returns the first [`ForestError::UntraceableBootstrap`] encountered.
    pub fn inbag_matrix(&self, n_samples: usize) -> Result<InbagMatrix, ForestError> {
        let columns = (0..self.trees.len())
            .map(|t| self.replay(t, n_samples))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(InbagMatrix::from_columns(n_samples, columns))
    }

    /// Count how many split nodes use each feature across the whole forest.
    #[must_use]
    pub fn split_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_features];
        for tree in &self.trees {
            for (_, feature) in tree.splits() {
                counts[feature.index()] += 1;
            }
        }
        counts
    }
}
