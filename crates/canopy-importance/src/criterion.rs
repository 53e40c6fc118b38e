use canopy_forest::Impurity;

use crate::error::ImportanceError;

/// Target type of the forest, selecting the debiased node statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebiasCriterion {
    /// Binary classification with labels in {0, 1}.
    ///
    /// Node impurity is the Gini cross term `1 - p·q - (1-p)(1-q)` where `p`
    /// is the OOB positive rate and `q` the in-bag positive rate.
    Classification,
    /// Regression on real targets.
    ///
    /// Node impurity is the mean squared OOB residual around the in-bag mean,
    /// added to the tree's stored training impurity.
    Regression,
}

impl DebiasCriterion {
    /// Check that every target is admissible for this criterion.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ImportanceError::NonFiniteTarget`] | a target is NaN or infinite |
    /// | [`ImportanceError::NonBinaryLabel`] | classification target other than 0 or 1 |
    pub fn validate_targets(self, targets: &[f64]) -> Result<(), ImportanceError> {
        for (sample_index, &value) in targets.iter().enumerate() {
            if !value.is_finite() {
                return Err(ImportanceError::NonFiniteTarget { sample_index });
            }
            if self == DebiasCriterion::Classification && value != 0.0 && value != 1.0 {
                return Err(ImportanceError::NonBinaryLabel {
                    sample_index,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Debiased impurity of one node.
    ///
    /// `oob` holds the targets of the out-of-bag samples reaching the node
    /// and must be non-empty; `inbag_mean` is the occurrence-weighted mean
    /// target of the in-bag samples reaching it.
    #[must_use]
    pub fn node_impurity(self, oob: &[f64], inbag_mean: f64, trained: Impurity) -> f64 {
        let n = oob.len() as f64;
        match self {
            DebiasCriterion::Classification => {
                let p = oob.iter().sum::<f64>() / n;
                1.0 - p * inbag_mean - (1.0 - p) * (1.0 - inbag_mean)
            }
            DebiasCriterion::Regression => {
                let correction = oob
                    .iter()
                    .map(|&y| (y - inbag_mean) * (y - inbag_mean))
                    .sum::<f64>()
                    / n;
                correction + trained.value()
            }
        }
    }
}
