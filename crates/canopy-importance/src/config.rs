//! Configuration builder for debiased importance computation.

use canopy_forest::{Forest, InbagCounts};

use crate::criterion::DebiasCriterion;
use crate::ensemble::{self, InbagSource};
use crate::error::ImportanceError;
use crate::result::DebiasedImportance;

/// What to do with a tree whose bootstrap sample cannot be replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UntraceablePolicy {
    /// Fail the whole computation.
    #[default]
    Abort,
    /// Leave the tree out and average over the remaining trees.
    SkipTree,
}

/// Configuration for out-of-bag debiased MDI.
///
/// Construct via [`DebiasedImportanceConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter  | Default |
/// |------------|---------|
/// | `policy`   | `Abort` |
/// | `parallel` | `true`  |
#[derive(Debug, Clone)]
pub struct DebiasedImportanceConfig {
    pub(crate) criterion: DebiasCriterion,
    pub(crate) policy: UntraceablePolicy,
    pub(crate) parallel: bool,
}

impl DebiasedImportanceConfig {
    /// Create a config for the forest's target type.
    #[must_use]
    pub fn new(criterion: DebiasCriterion) -> Self {
        Self {
            criterion,
            policy: UntraceablePolicy::Abort,
            parallel: true,
        }
    }

    // --- Setters ---

    /// Set the handling of trees without a replayable bootstrap.
    #[must_use]
    pub fn with_policy(mut self, policy: UntraceablePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process trees on the rayon pool (`true`) or on the calling thread.
    /// Results are identical either way.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // --- Getters ---

    /// Return the target type.
    #[must_use]
    pub fn criterion(&self) -> DebiasCriterion {
        self.criterion
    }

    /// Return the untraceable-tree policy.
    #[must_use]
    pub fn policy(&self) -> UntraceablePolicy {
        self.policy
    }

    /// Return whether trees are processed in parallel.
    #[must_use]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Compute debiased MDI, replaying each tree's bootstrap from its seed.
    ///
    /// `features[sample_idx][feature_idx]` must be the exact training set the
    /// forest was fit on, in the same row order; `targets[sample_idx]` its
    /// training targets (0/1 for classification).
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ImportanceError::EmptyDataset`] | `features` is empty |
    /// | [`ImportanceError::ConfigurationMismatch`] | a row's width differs from the forest's feature count |
    /// | [`ImportanceError::NonFiniteValue`] | a feature value is NaN or infinite |
    /// | [`ImportanceError::TargetLengthMismatch`] | `targets.len() != features.len()` |
    /// | [`ImportanceError::NonFiniteTarget`] | a target is NaN or infinite |
    /// | [`ImportanceError::NonBinaryLabel`] | classification target other than 0 or 1 |
    /// | [`ImportanceError::UntraceableBootstrap`] | a tree cannot be replayed under `Abort` |
    /// | [`ImportanceError::NoTraceableTrees`] | every tree was skipped under `SkipTree` |
    pub fn compute(
        &self,
        forest: &Forest,
        features: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<DebiasedImportance, ImportanceError> {
        ensemble::run(self, forest, features, targets, InbagSource::Replay)
    }

    /// Compute debiased MDI from explicitly supplied in-bag counts, one
    /// [`InbagCounts`] per tree in forest order.
    ///
    /// # Errors
    ///
    /// As [`compute`](Self::compute), plus
    /// [`ImportanceError::InbagColumnCount`] when `inbag` does not hold one
    /// column per tree, [`ImportanceError::InbagShapeMismatch`] when a
    /// column does not cover every sample and
    /// [`ImportanceError::InbagConservation`] when a column's counts do not
    /// sum to the sample count.
    pub fn compute_with_inbag(
        &self,
        forest: &Forest,
        features: &[Vec<f64>],
        targets: &[f64],
        inbag: &[InbagCounts],
    ) -> Result<DebiasedImportance, ImportanceError> {
        ensemble::run(self, forest, features, targets, InbagSource::Explicit(inbag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = DebiasedImportanceConfig::new(DebiasCriterion::Regression);
        assert_eq!(cfg.criterion(), DebiasCriterion::Regression);
        assert_eq!(cfg.policy(), UntraceablePolicy::Abort);
        assert!(cfg.parallel());
    }

    #[test]
    fn setters_chain() {
        let cfg = DebiasedImportanceConfig::new(DebiasCriterion::Classification)
            .with_policy(UntraceablePolicy::SkipTree)
            .with_parallel(false);
        assert_eq!(cfg.policy(), UntraceablePolicy::SkipTree);
        assert!(!cfg.parallel());
    }
}
