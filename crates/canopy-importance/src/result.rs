//! Debiased importance results and feature ranking.

use crate::error::ImportanceError;

/// Listing order for [`DebiasedImportance::ranked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Most important feature first.
    #[default]
    Descending,
    /// Input column order.
    Original,
}

/// A named feature with its debiased score and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Mean debiased impurity decrease across contributing trees. May be negative.
    pub importance: f64,
    /// Standard error of `importance` across trees.
    pub std_error: f64,
    /// 1-based rank by descending importance (1 = most important).
    pub rank: usize,
}

/// Contribution of one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeImportance {
    /// Position of the tree in its forest.
    pub tree: usize,
    /// Per-feature debiased decrease for this tree.
    pub importances: Vec<f64>,
    /// Number of nodes flagged unreliable.
    pub n_unreliable_nodes: usize,
    /// Number of out-of-bag samples.
    pub n_oob_samples: usize,
}

/// Forest-level debiased MDI.
#[derive(Debug, Clone)]
pub struct DebiasedImportance {
    importances: Vec<f64>,
    std_errors: Vec<f64>,
    per_tree: Vec<TreeImportance>,
    skipped_trees: Vec<usize>,
}

impl DebiasedImportance {
    pub(crate) fn new(
        importances: Vec<f64>,
        std_errors: Vec<f64>,
        per_tree: Vec<TreeImportance>,
        skipped_trees: Vec<usize>,
    ) -> Self {
        Self {
            importances,
            std_errors,
            per_tree,
            skipped_trees,
        }
    }

    /// Return the averaged importance per feature, in input column order.
    #[must_use]
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Consume the result and return the importance vector.
    #[must_use]
    pub fn into_importances(self) -> Vec<f64> {
        self.importances
    }

    /// Return the standard error per feature.
    #[must_use]
    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    /// Return the contributions of the trees that were averaged, in tree order.
    #[must_use]
    pub fn per_tree(&self) -> &[TreeImportance] {
        &self.per_tree
    }

    /// Return the positions of trees skipped as untraceable.
    #[must_use]
    pub fn skipped_trees(&self) -> &[usize] {
        &self.skipped_trees
    }

    /// Return the number of trees that contributed to the average.
    #[must_use]
    pub fn n_trees_used(&self) -> usize {
        self.per_tree.len()
    }

    /// Attach names and ranks.
    ///
    /// Ranks always follow descending importance; `order` only decides the
    /// listing order. Ties keep input order.
    ///
    /// # Errors
    ///
    /// Returns [`ImportanceError::FeatureNameMismatch`] if `names` does not
    /// have one entry per feature.
    pub fn ranked(
        &self,
        names: &[String],
        order: Order,
    ) -> Result<Vec<RankedFeature>, ImportanceError> {
        if names.len() != self.importances.len() {
            return Err(ImportanceError::FeatureNameMismatch {
                expected: self.importances.len(),
                got: names.len(),
            });
        }

        let mut features: Vec<RankedFeature> = names
            .iter()
            .zip(self.importances.iter().zip(self.std_errors.iter()))
            .map(|(name, (&importance, &std_error))| RankedFeature {
                name: name.clone(),
                importance,
                std_error,
                rank: 0,
            })
            .collect();

        let mut by_score: Vec<usize> = (0..features.len()).collect();
        by_score.sort_by(|&a, &b| {
            features[b]
                .importance
                .total_cmp(&features[a].importance)
        });
        for (rank, &i) in by_score.iter().enumerate() {
            features[i].rank = rank + 1;
        }

        if order == Order::Descending {
            features.sort_by_key(|f| f.rank);
        }
        Ok(features)
    }
}
