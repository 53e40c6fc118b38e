//! Per-node debiased statistics for one tree.

use canopy_forest::{DecisionPath, InbagCounts, NodeIndex, Tree};

use crate::criterion::DebiasCriterion;

/// Debiased statistics of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStat {
    /// Fraction of the tree's in-bag draws reaching the node. The root is 1.
    pub weight: f64,
    /// Debiased impurity, meaningful only when `reliable`.
    pub impurity: f64,
    /// `false` when the node, or one of its children, has no OOB samples or
    /// no in-bag weight.
    pub reliable: bool,
}

/// Statistics for every node of a tree, indexed by node id.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStats {
    stats: Vec<NodeStat>,
    n_oob: usize,
}

impl NodeStats {
    /// Compute node weights, debiased impurities and reliability flags.
    ///
    /// In-bag samples count once per draw; OOB samples are those with a zero
    /// count. `features` and `targets` must already be validated against the
    /// tree and `inbag` must cover every sample.
    #[must_use]
    pub fn compute(
        tree: &Tree,
        features: &[Vec<f64>],
        targets: &[f64],
        inbag: &InbagCounts,
        criterion: DebiasCriterion,
    ) -> Self {
        let n_nodes = tree.n_nodes();
        let counts = inbag.as_slice();
        let inbag_samples = inbag.inbag_indices();
        let oob_samples = inbag.oob_indices();

        // --- In-bag weight and weighted target sum per node ---
        let inbag_path = DecisionPath::compute(tree, features, &inbag_samples);
        let draws = |r: usize| f64::from(counts[inbag_samples[r]]);
        let inbag_weight = inbag_path.node_totals(draws);
        let inbag_target = inbag_path.node_totals(|r| draws(r) * targets[inbag_samples[r]]);
        let total = inbag.total() as f64;

        // --- OOB targets per node ---
        let oob_path = DecisionPath::compute(tree, features, &oob_samples);
        let mut oob_targets: Vec<Vec<f64>> = vec![Vec::new(); n_nodes];
        for (r, row) in oob_path.rows().enumerate() {
            let y = targets[oob_samples[r]];
            for node in row {
                oob_targets[node.index()].push(y);
            }
        }

        let mut stats: Vec<NodeStat> = inbag_weight
            .iter()
            .map(|&w| NodeStat {
                weight: if total > 0.0 { w / total } else { 0.0 },
                impurity: 0.0,
                reliable: true,
            })
            .collect();

        for i in 0..n_nodes {
            if oob_targets[i].is_empty() || inbag_weight[i] == 0.0 {
                stats[i].reliable = false;
                if let Some(parent) = tree.parent(NodeIndex::new(i)) {
                    stats[parent.index()].reliable = false;
                }
                continue;
            }
            let inbag_mean = inbag_target[i] / inbag_weight[i];
            stats[i].impurity = criterion.node_impurity(
                &oob_targets[i],
                inbag_mean,
                tree.node(NodeIndex::new(i)).impurity(),
            );
        }

        Self {
            stats,
            n_oob: oob_samples.len(),
        }
    }

    /// Borrow the statistics of one node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn get(&self, node: NodeIndex) -> &NodeStat {
        &self.stats[node.index()]
    }

    /// Borrow every node's statistics, indexed by node id.
    #[must_use]
    pub fn as_slice(&self) -> &[NodeStat] {
        &self.stats
    }

    /// Return the number of nodes flagged unreliable.
    #[must_use]
    pub fn n_unreliable(&self) -> usize {
        self.stats.iter().filter(|s| !s.reliable).count()
    }

    /// Return the number of OOB samples of the tree.
    #[must_use]
    pub fn n_oob(&self) -> usize {
        self.n_oob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{stump, two_level};

    fn stump_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        (
            vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]],
            vec![0.0, 0.0, 1.0, 1.0],
        )
    }

    #[test]
    fn root_weight_is_one() {
        let (x, y) = stump_data();
        let tree = stump();
        let stats = NodeStats::compute(
            &tree,
            &x,
            &y,
            &InbagCounts::new(vec![2, 0, 1, 1]),
            DebiasCriterion::Classification,
        );
        assert!((stats.get(NodeIndex::ROOT).weight - 1.0).abs() < 1e-12);
        assert!((stats.get(NodeIndex::new(1)).weight - 0.5).abs() < 1e-12);
        assert!((stats.get(NodeIndex::new(2)).weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn oob_starved_child_flags_parent() {
        // Only sample 1 is OOB and it lands in the left leaf.
        let (x, y) = stump_data();
        let stats = NodeStats::compute(
            &stump(),
            &x,
            &y,
            &InbagCounts::new(vec![2, 0, 1, 1]),
            DebiasCriterion::Classification,
        );
        assert!(!stats.get(NodeIndex::new(2)).reliable);
        assert!(!stats.get(NodeIndex::ROOT).reliable);
        assert!(stats.get(NodeIndex::new(1)).reliable);
        assert_eq!(stats.n_unreliable(), 2);
        assert_eq!(stats.n_oob(), 1);
    }

    #[test]
    fn inbag_starved_node_is_unreliable() {
        // Every draw lands left of the root threshold.
        let (x, y) = stump_data();
        let stats = NodeStats::compute(
            &stump(),
            &x,
            &y,
            &InbagCounts::new(vec![3, 1, 0, 0]),
            DebiasCriterion::Regression,
        );
        assert_eq!(stats.get(NodeIndex::new(2)).weight, 0.0);
        assert!(!stats.get(NodeIndex::new(2)).reliable);
        assert!(!stats.get(NodeIndex::ROOT).reliable);
    }

    #[test]
    fn unreliable_root_only_flags_itself() {
        // No OOB samples at all.
        let (x, y) = stump_data();
        let stats = NodeStats::compute(
            &stump(),
            &x,
            &y,
            &InbagCounts::new(vec![1, 1, 1, 1]),
            DebiasCriterion::Classification,
        );
        assert_eq!(stats.n_unreliable(), 3);
        assert_eq!(stats.n_oob(), 0);
    }

    #[test]
    fn classification_impurities_by_hand() {
        // in-bag {0, 0, 2}, OOB {1, 3}
        let (x, y) = stump_data();
        let stats = NodeStats::compute(
            &stump(),
            &x,
            &y,
            &InbagCounts::new(vec![2, 0, 2, 0]),
            DebiasCriterion::Classification,
        );
        // root: p = 0.5, q = 0.5
        assert!((stats.get(NodeIndex::ROOT).impurity - 0.5).abs() < 1e-12);
        // left leaf: OOB {y=0}, in-bag {0, 0}: pure agreement
        assert!(stats.get(NodeIndex::new(1)).impurity.abs() < 1e-12);
        // right leaf: OOB {y=1}, in-bag {1, 1}
        assert!(stats.get(NodeIndex::new(2)).impurity.abs() < 1e-12);
        assert_eq!(stats.n_unreliable(), 0);
    }

    #[test]
    fn regression_adds_stored_impurity() {
        let tree = two_level();
        let x = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.0], vec![3.0, 1.0]];
        let y = vec![1.0, 3.0, 5.0, 7.0];
        let stats = NodeStats::compute(
            &tree,
            &x,
            &y,
            &InbagCounts::new(vec![1, 1, 1, 1]),
            DebiasCriterion::Regression,
        );
        // Without OOB samples nothing is reliable and impurities stay zero.
        assert!(stats.as_slice().iter().all(|s| !s.reliable && s.impurity == 0.0));

        let stats = NodeStats::compute(
            &tree,
            &x,
            &y,
            &InbagCounts::new(vec![2, 0, 1, 1]),
            DebiasCriterion::Regression,
        );
        // root: OOB {3}, in-bag mean (1+1+5+7)/4 = 3.5, stored 0.5
        let root = stats.get(NodeIndex::ROOT);
        assert!((root.impurity - (0.25 + 0.5)).abs() < 1e-12);
    }
}
