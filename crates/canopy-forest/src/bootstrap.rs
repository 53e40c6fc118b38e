//! Deterministic replay of each tree's bootstrap sample.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ForestError;
use crate::mt19937::Mt19937;

/// The sampling convention a forest drew its bootstrap samples with.
///
/// Replay only reproduces the multiset a tree was fit on when the generator,
/// the seeding and the bounded-integer algorithm all match the trainer's.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapSampler {
    /// `ChaCha8Rng::seed_from_u64(seed)` followed by `gen_range(0..n)` per draw.
    #[default]
    #[serde(rename = "chacha8")]
    ChaCha8,
    /// NumPy `RandomState(seed).randint(0, n, n)`, as used by scikit-learn.
    NumpyLegacy,
}

impl BootstrapSampler {
    /// Replay the `n_samples` draws with replacement made for one tree and
    /// return how often each sample was drawn.
    ///
    /// `tree` is the tree's position in its forest and only labels errors.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::UntraceableBootstrap`] when `seed` is `None`,
    /// or when the seed or sample count cannot be expressed in this
    /// sampler's convention.
    pub fn replay(
        self,
        tree: usize,
        seed: Option<u64>,
        n_samples: usize,
    ) -> Result<InbagCounts, ForestError> {
        let Some(seed) = seed else {
            return Err(ForestError::UntraceableBootstrap {
                tree,
                reason: "no bootstrap seed recorded".to_string(),
            });
        };

        let mut counts = vec![0u32; n_samples];
        if n_samples == 0 {
            return Ok(InbagCounts(counts));
        }

        match self {
            BootstrapSampler::ChaCha8 => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                for _ in 0..n_samples {
                    counts[rng.gen_range(0..n_samples)] += 1;
                }
            }
            BootstrapSampler::NumpyLegacy => {
                let seed = u32::try_from(seed).map_err(|_| ForestError::UntraceableBootstrap {
                    tree,
                    reason: format!("seed {seed} exceeds the 32-bit MT19937 seed range"),
                })?;
                let max = u32::try_from(n_samples - 1).map_err(|_| {
                    ForestError::UntraceableBootstrap {
                        tree,
                        reason: format!("{n_samples} samples exceed 32-bit bounded draws"),
                    }
                })?;
                let mut rng = Mt19937::new(seed);
                for _ in 0..n_samples {
                    counts[rng.bounded_masked(max) as usize] += 1;
                }
            }
        }

        Ok(InbagCounts(counts))
    }
}

/// Per-sample in-bag occurrence counts for one tree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InbagCounts(Vec<u32>);

impl InbagCounts {
    /// Wrap explicit counts, e.g. when the trainer exported its draws directly.
    #[must_use]
    pub fn new(counts: Vec<u32>) -> Self {
        Self(counts)
    }

    /// Count occurrences of each drawn index in `[0, n_samples)`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::DrawOutOfRange`] if a draw is `>= n_samples`.
    pub fn from_draws(draws: &[usize], n_samples: usize) -> Result<Self, ForestError> {
        let mut counts = vec![0u32; n_samples];
        for (position, &draw) in draws.iter().enumerate() {
            let Some(count) = counts.get_mut(draw) else {
                return Err(ForestError::DrawOutOfRange {
                    position,
                    draw,
                    n_samples,
                });
            };
            *count += 1;
        }
        Ok(Self(counts))
    }

    /// Return the counts as a slice, one entry per sample.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Return the number of samples covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when no samples are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the total number of draws (equals the sample count for a full bootstrap).
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    /// Return the indices of samples drawn at least once.
    #[must_use]
    pub fn inbag_indices(&self) -> Vec<usize> {
        (0..self.0.len()).filter(|&i| self.0[i] > 0).collect()
    }

    /// Return the indices of samples never drawn.
    #[must_use]
    pub fn oob_indices(&self) -> Vec<usize> {
        (0..self.0.len()).filter(|&i| self.0[i] == 0).collect()
    }
}

/// `n_samples × n_trees` in-bag occurrence counts for a whole forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InbagMatrix {
    n_samples: usize,
    columns: Vec<InbagCounts>,
}

impl InbagMatrix {
    pub(crate) fn from_columns(n_samples: usize, columns: Vec<InbagCounts>) -> Self {
        Self { n_samples, columns }
    }

    /// Return the number of samples (rows).
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Return the number of trees (columns).
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.columns.len()
    }

    #[cfg(test)]
    fn get(&self, sample: usize, tree: usize) -> u32 {
        self.columns[tree].as_slice()[sample]
    }

    /// Borrow the counts of one tree.
    #[must_use]
    pub fn column(&self, tree: usize) -> &InbagCounts {
        &self.columns[tree]
    }

    /// Return the matrix in row-major order: `rows[sample][tree]`.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        (0..self.n_samples)
            .map(|s| self.columns.iter().map(|c| c.as_slice()[s]).collect())
            .collect()
    }
}
