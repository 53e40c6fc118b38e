use canopy_forest::Tree;

use crate::stats::NodeStats;

/// Sum the weighted debiased impurity decrease of every reliable split, per feature.
///
/// A split at node `n` with children `l`, `r` contributes
/// `w(n)·imp(n) - w(l)·imp(l) - w(r)·imp(r)`, which may be negative.
/// Features never split on, or only split on at unreliable nodes, stay 0.
#[must_use]
pub fn tree_importance(tree: &Tree, stats: &NodeStats) -> Vec<f64> {
    let mut importances = vec![0.0f64; tree.n_features()];
    for (node, feature) in tree.splits() {
        let parent = stats.get(node);
        if !parent.reliable {
            continue;
        }
        let Some((left, right)) = tree.node(node).children() else {
            continue;
        };
        let left = stats.get(left);
        let right = stats.get(right);
        importances[feature.index()] += parent.weight * parent.impurity
            - left.weight * left.impurity
            - right.weight * right.impurity;
    }
    importances
}

/// Element-wise mean of per-tree vectors, folded in tree order.
///
/// Returns zeros when `per_tree` is empty.
#[must_use]
pub fn average(per_tree: &[&[f64]], n_features: usize) -> Vec<f64> {
    let mut sum = vec![0.0f64; n_features];
    if per_tree.is_empty() {
        return sum;
    }
    for row in per_tree {
        for (acc, &v) in sum.iter_mut().zip(row.iter()) {
            *acc += v;
        }
    }
    let n = per_tree.len() as f64;
    sum.iter_mut().for_each(|v| *v /= n);
    sum
}

/// Standard error of the mean per feature: population standard deviation
/// across trees divided by `sqrt(n_trees)`.
#[must_use]
pub fn standard_error(per_tree: &[&[f64]], mean: &[f64]) -> Vec<f64> {
    if per_tree.is_empty() {
        return vec![0.0; mean.len()];
    }
    let n = per_tree.len() as f64;
    mean.iter()
        .enumerate()
        .map(|(j, &m)| {
            let var = per_tree.iter().map(|row| (row[j] - m).powi(2)).sum::<f64>() / n;
            var.sqrt() / n.sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::DebiasCriterion;
    use crate::tests::{stump, two_level};
    use canopy_forest::InbagCounts;

    #[test]
    fn unused_feature_stays_zero() {
        let x = vec![vec![0.0, 9.0], vec![1.0, 9.0], vec![2.0, 9.0], vec![3.0, 9.0]];
        let y = vec![0.0, 0.0, 1.0, 1.0];
        let tree = stump_with_features(2);
        let stats = NodeStats::compute(
            &tree,
            &x,
            &y,
            &InbagCounts::new(vec![1, 0, 2, 1]),
            DebiasCriterion::Classification,
        );
        let imp = tree_importance(&tree, &stats);
        assert_eq!(imp.len(), 2);
        assert_eq!(imp[1], 0.0);
    }

    fn stump_with_features(n_features: usize) -> Tree {
        let arrays = canopy_forest::TreeArrays {
            seed: Some(0),
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![1.5, -2.0, -2.0],
            impurity: vec![0.5, 0.0, 0.0],
        };
        Tree::from_arrays(0, &arrays, n_features).unwrap()
    }

    #[test]
    fn stump_decrease_by_hand() {
        // in-bag {0, 2, 2, 3}, OOB {1}: right leaf has no OOB, so nothing counts.
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![0.0, 0.0, 1.0, 1.0];
        let stats = NodeStats::compute(
            &stump(),
            &x,
            &y,
            &InbagCounts::new(vec![1, 0, 2, 1]),
            DebiasCriterion::Classification,
        );
        assert_eq!(tree_importance(&stump(), &stats), vec![0.0]);

        // in-bag {0, 2}, OOB {1, 3}: root 0.5, both leaves pure.
        let stats = NodeStats::compute(
            &stump(),
            &x,
            &y,
            &InbagCounts::new(vec![2, 0, 2, 0]),
            DebiasCriterion::Classification,
        );
        let imp = tree_importance(&stump(), &stats);
        assert!((imp[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn decrease_can_be_negative() {
        // OOB labels disagree with in-bag labels in both leaves.
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![0.0, 1.0, 1.0, 0.0];
        let stats = NodeStats::compute(
            &stump(),
            &x,
            &y,
            &InbagCounts::new(vec![2, 0, 2, 0]),
            DebiasCriterion::Classification,
        );
        // root p = 0.5, q = 0.5 -> 0.5; leaves fully misclassified -> 1.0 each
        let imp = tree_importance(&stump(), &stats);
        assert!((imp[0] - (0.5 - 0.5 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn unreliable_split_is_skipped() {
        // Node 2 splits feature 1 but its children see no OOB samples.
        let tree = two_level();
        let x = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.0], vec![3.0, 1.0]];
        let y = vec![0.0, 1.0, 0.0, 1.0];
        let stats = NodeStats::compute(
            &tree,
            &x,
            &y,
            &InbagCounts::new(vec![1, 0, 2, 1]),
            DebiasCriterion::Classification,
        );
        let imp = tree_importance(&tree, &stats);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn average_and_standard_error() {
        let a = [1.0, 0.0];
        let b = [3.0, 0.0];
        let rows: Vec<&[f64]> = vec![&a, &b];
        let mean = average(&rows, 2);
        assert_eq!(mean, vec![2.0, 0.0]);
        let se = standard_error(&rows, &mean);
        assert!((se[0] - 1.0 / 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(se[1], 0.0);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(&[], 3), vec![0.0; 3]);
    }
}
