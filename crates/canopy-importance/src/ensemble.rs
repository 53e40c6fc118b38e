//! Forest-level orchestration: validate, process trees, average.

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use canopy_forest::{Forest, InbagCounts};

use crate::aggregate::{average, standard_error, tree_importance};
use crate::config::{DebiasedImportanceConfig, UntraceablePolicy};
use crate::error::ImportanceError;
use crate::result::{DebiasedImportance, TreeImportance};
use crate::stats::NodeStats;

/// Where each tree's in-bag counts come from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum InbagSource<'a> {
    /// Replay from the tree's stored seed.
    Replay,
    /// Supplied by the caller, one column per tree.
    Explicit(&'a [InbagCounts]),
}

fn validate_dataset(
    forest: &Forest,
    features: &[Vec<f64>],
    targets: &[f64],
) -> Result<(), ImportanceError> {
    if features.is_empty() {
        return Err(ImportanceError::EmptyDataset);
    }
    let n_features = forest.n_features();
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ImportanceError::ConfigurationMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(ImportanceError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    if targets.len() != features.len() {
        return Err(ImportanceError::TargetLengthMismatch {
            n_samples: features.len(),
            n_targets: targets.len(),
        });
    }
    Ok(())
}

fn validate_inbag(
    inbag: &[InbagCounts],
    n_trees: usize,
    n_samples: usize,
) -> Result<(), ImportanceError> {
    if inbag.len() != n_trees {
        return Err(ImportanceError::InbagColumnCount {
            expected: n_trees,
            got: inbag.len(),
        });
    }
    for (tree, counts) in inbag.iter().enumerate() {
        if counts.len() != n_samples {
            return Err(ImportanceError::InbagShapeMismatch {
                tree,
                expected: n_samples,
                got: counts.len(),
            });
        }
        let total = counts.total();
        if total != n_samples as u64 {
            return Err(ImportanceError::InbagConservation {
                tree,
                expected: n_samples as u64,
                got: total,
            });
        }
    }
    Ok(())
}

/// Process one tree. `Ok(None)` means the tree was skipped as untraceable.
fn process_tree(
    config: &DebiasedImportanceConfig,
    forest: &Forest,
    t: usize,
    features: &[Vec<f64>],
    targets: &[f64],
    source: InbagSource<'_>,
) -> Result<Option<TreeImportance>, ImportanceError> {
    let replayed;
    let counts = match source {
        InbagSource::Explicit(columns) => &columns[t],
        InbagSource::Replay => match forest.replay(t, features.len()) {
            Ok(counts) => {
                replayed = counts;
                &replayed
            }
            Err(err) => match config.policy {
                UntraceablePolicy::Abort => {
                    return Err(ImportanceError::UntraceableBootstrap {
                        tree: t,
                        source: err,
                    });
                }
                UntraceablePolicy::SkipTree => {
                    warn!(tree = t, error = %err, "skipping untraceable tree");
                    return Ok(None);
                }
            },
        },
    };

    let tree = &forest.trees()[t];
    let stats = NodeStats::compute(tree, features, targets, counts, config.criterion);
    let importances = tree_importance(tree, &stats);
    debug!(
        tree = t,
        n_oob = stats.n_oob(),
        n_unreliable = stats.n_unreliable(),
        "tree importance computed"
    );
    Ok(Some(TreeImportance {
        tree: t,
        importances,
        n_unreliable_nodes: stats.n_unreliable(),
        n_oob_samples: stats.n_oob(),
    }))
}

#[instrument(skip_all, fields(n_trees = forest.n_trees(), n_samples = features.len()))]
pub(crate) fn run(
    config: &DebiasedImportanceConfig,
    forest: &Forest,
    features: &[Vec<f64>],
    targets: &[f64],
    source: InbagSource<'_>,
) -> Result<DebiasedImportance, ImportanceError> {
    // --- Validate inputs ---
    validate_dataset(forest, features, targets)?;
    config.criterion.validate_targets(targets)?;
    if let InbagSource::Explicit(inbag) = source {
        validate_inbag(inbag, forest.n_trees(), features.len())?;
    }

    let n_trees = forest.n_trees();
    let n_features = forest.n_features();
    info!(
        n_trees,
        n_samples = features.len(),
        n_features,
        criterion = ?config.criterion,
        parallel = config.parallel,
        "computing debiased importance"
    );

    // --- Per-tree phase ---
    let results: Vec<Result<Option<TreeImportance>, ImportanceError>> = if config.parallel {
        (0..n_trees)
            .into_par_iter()
            .map(|t| process_tree(config, forest, t, features, targets, source))
            .collect()
    } else {
        (0..n_trees)
            .map(|t| process_tree(config, forest, t, features, targets, source))
            .collect()
    };

    // --- Ordered reduction ---
    let mut per_tree = Vec::with_capacity(n_trees);
    let mut skipped_trees = Vec::new();
    for (t, result) in results.into_iter().enumerate() {
        match result? {
            Some(contribution) => per_tree.push(contribution),
            None => skipped_trees.push(t),
        }
    }
    if per_tree.is_empty() {
        return Err(ImportanceError::NoTraceableTrees { n_trees });
    }

    let rows: Vec<&[f64]> = per_tree.iter().map(|c| c.importances.as_slice()).collect();
    let importances = average(&rows, n_features);
    let std_errors = standard_error(&rows, &importances);

    info!(
        n_trees_used = per_tree.len(),
        n_skipped = skipped_trees.len(),
        "debiased importance complete"
    );
    Ok(DebiasedImportance::new(
        importances,
        std_errors,
        per_tree,
        skipped_trees,
    ))
}
