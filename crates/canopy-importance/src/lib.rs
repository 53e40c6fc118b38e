//! Out-of-bag debiased Mean Decrease Impurity for bagged tree ensembles.
//!
//! Ordinary MDI scores each split with impurities measured on the very
//! samples the tree was fit on, which inflates features with many candidate
//! thresholds. Here each tree's bootstrap is replayed, node impurities are
//! re-estimated by crossing in-bag and out-of-bag statistics, and the
//! resulting decreases are averaged across trees. Scores can be negative.
//!
//! A contrast-probe procedure ([`ContrastProbeConfig`]) estimates how often a
//! feature scores below shuffled copies of the data under any caller-supplied
//! importance model.

mod aggregate;
mod config;
mod criterion;
mod ensemble;
mod error;
mod probes;
mod result;
mod stats;

pub use aggregate::{average, standard_error, tree_importance};
pub use config::{DebiasedImportanceConfig, UntraceablePolicy};
pub use criterion::DebiasCriterion;
pub use error::ImportanceError;
pub use probes::{ContrastProbeConfig, ImportanceModel, ProbeResult};
pub use result::{DebiasedImportance, Order, RankedFeature, TreeImportance};
pub use stats::{NodeStat, NodeStats};

#[cfg(test)]
pub(crate) mod tests {
    use canopy_forest::{Tree, TreeArrays};

    /// One split on feature 0 at 1.5.
    pub(crate) fn stump() -> Tree {
        let arrays = TreeArrays {
            seed: Some(0),
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![1.5, -2.0, -2.0],
            impurity: vec![0.5, 0.0, 0.0],
        };
        Tree::from_arrays(0, &arrays, 1).unwrap()
    }

    /// Root splits feature 0 at 1.5; the right child splits feature 1 at 0.5.
    pub(crate) fn two_level() -> Tree {
        let arrays = TreeArrays {
            seed: Some(0),
            children_left: vec![1, -1, 3, -1, -1],
            children_right: vec![2, -1, 4, -1, -1],
            feature: vec![0, -2, 1, -2, -2],
            threshold: vec![1.5, -2.0, 0.5, -2.0, -2.0],
            impurity: vec![0.5, 0.0, 0.5, 0.0, 0.0],
        };
        Tree::from_arrays(0, &arrays, 2).unwrap()
    }
}
