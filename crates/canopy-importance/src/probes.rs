//! Contrast-probe significance: how often does a real feature lose to noise?
//!
//! Each round appends one shuffled copy of every feature (a "contrast"),
//! refits the caller's model and counts the real features scoring no higher
//! than the best contrast. The per-feature count divided by the number of
//! rounds estimates the family-wise error rate of calling that feature
//! relevant.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::error::ImportanceError;

/// A model that can be fit on a dataset and report one importance per column.
///
/// Fitting is the implementor's business; the probe procedure only calls
/// this once for the baseline and once per round.
pub trait ImportanceModel {
    /// Error returned when fitting fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fit on `features[sample][column]` and `targets`, returning one
    /// importance per column.
    ///
    /// # Errors
    ///
    /// Whatever the underlying learner reports.
    fn fit_importances(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<Vec<f64>, Self::Error>;
}

/// Significance estimate for one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Feature name.
    pub name: String,
    /// Importance from the baseline fit without contrasts.
    pub importance: f64,
    /// Fraction of rounds in which the feature scored at or below the best contrast.
    pub fwer: f64,
}

/// Configuration for the contrast-probe procedure.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `joint`   | `false` |
/// | `seed`    | 42      |
#[derive(Debug, Clone)]
pub struct ContrastProbeConfig {
    n_permutations: usize,
    joint: bool,
    seed: u64,
}

impl ContrastProbeConfig {
    /// Create a config running `n_permutations` rounds.
    ///
    /// # Errors
    ///
    /// Returns [`ImportanceError::InvalidPermutationCount`] if `n_permutations` is zero.
    pub fn new(n_permutations: usize) -> Result<Self, ImportanceError> {
        if n_permutations == 0 {
            return Err(ImportanceError::InvalidPermutationCount { n_permutations });
        }
        Ok(Self {
            n_permutations,
            joint: false,
            seed: 42,
        })
    }

    /// Permute whole rows jointly (`true`) instead of each column independently.
    #[must_use]
    pub fn with_joint(mut self, joint: bool) -> Self {
        self.joint = joint;
        self
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of rounds.
    #[must_use]
    pub fn n_permutations(&self) -> usize {
        self.n_permutations
    }

    /// Return whether contrasts are built by a joint row permutation.
    #[must_use]
    pub fn joint(&self) -> bool {
        self.joint
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run the procedure against `model`.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ImportanceError::EmptyDataset`] | `features` is empty |
    /// | [`ImportanceError::ConfigurationMismatch`] | rows have inconsistent widths |
    /// | [`ImportanceError::TargetLengthMismatch`] | `targets.len() != features.len()` |
    /// | [`ImportanceError::FeatureNameMismatch`] | `feature_names` has the wrong length |
    /// | [`ImportanceError::ContrastModel`] | the model fails to fit |
    /// | [`ImportanceError::ContrastImportanceLength`] | the model returns the wrong number of importances |
    #[instrument(skip_all, fields(n_permutations = self.n_permutations, joint = self.joint))]
    pub fn evaluate<M: ImportanceModel>(
        &self,
        model: &mut M,
        features: &[Vec<f64>],
        targets: &[f64],
        feature_names: &[String],
    ) -> Result<Vec<ProbeResult>, ImportanceError> {
        // --- Validate inputs ---
        if features.is_empty() {
            return Err(ImportanceError::EmptyDataset);
        }
        let n_samples = features.len();
        let n_features = features[0].len();
        if let Some((sample_index, row)) = features
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n_features)
        {
            return Err(ImportanceError::ConfigurationMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if targets.len() != n_samples {
            return Err(ImportanceError::TargetLengthMismatch {
                n_samples,
                n_targets: targets.len(),
            });
        }
        if feature_names.len() != n_features {
            return Err(ImportanceError::FeatureNameMismatch {
                expected: n_features,
                got: feature_names.len(),
            });
        }

        info!(n_samples, n_features, "running contrast probes");
        let baseline = fit_checked(model, features, targets, 0, n_features)?;

        let mut augmented: Vec<Vec<f64>> = features
            .iter()
            .map(|row| {
                let mut wide = Vec::with_capacity(2 * n_features);
                wide.extend_from_slice(row);
                wide.resize(2 * n_features, 0.0);
                wide
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut losses = vec![0usize; n_features];

        for round in 1..=self.n_permutations {
            // --- Fill contrast columns ---
            if self.joint {
                let mut order: Vec<usize> = (0..n_samples).collect();
                order.shuffle(&mut rng);
                for (row, &src) in augmented.iter_mut().zip(order.iter()) {
                    row[n_features..].copy_from_slice(&features[src]);
                }
            } else {
                for j in 0..n_features {
                    let mut column: Vec<f64> = features.iter().map(|row| row[j]).collect();
                    column.shuffle(&mut rng);
                    for (row, v) in augmented.iter_mut().zip(column) {
                        row[n_features + j] = v;
                    }
                }
            }

            let scores = fit_checked(model, &augmented, targets, round, 2 * n_features)?;
            let best_contrast = scores[n_features..]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            for (loss, &score) in losses.iter_mut().zip(&scores[..n_features]) {
                if score <= best_contrast {
                    *loss += 1;
                }
            }
            debug!(round, best_contrast, "contrast round complete");
        }

        let n = self.n_permutations as f64;
        Ok(feature_names
            .iter()
            .zip(baseline)
            .zip(losses)
            .map(|((name, importance), loss)| ProbeResult {
                name: name.clone(),
                importance,
                fwer: loss as f64 / n,
            })
            .collect())
    }
}

fn fit_checked<M: ImportanceModel>(
    model: &mut M,
    features: &[Vec<f64>],
    targets: &[f64],
    round: usize,
    expected: usize,
) -> Result<Vec<f64>, ImportanceError> {
    let scores = model
        .fit_importances(features, targets)
        .map_err(|e| ImportanceError::ContrastModel {
            round,
            source: Box::new(e),
        })?;
    if scores.len() != expected {
        return Err(ImportanceError::ContrastImportanceLength {
            round,
            expected,
            got: scores.len(),
        });
    }
    Ok(scores)
}
