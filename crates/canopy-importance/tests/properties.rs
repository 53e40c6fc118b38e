//! Properties over randomly generated forests and datasets.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use canopy_forest::{BootstrapSampler, Forest, NodeIndex, TreeArrays};
use canopy_importance::{DebiasCriterion, DebiasedImportanceConfig, NodeStats};

/// Random tree of at most `max_depth` levels splitting only on `features_used`.
fn random_tree(
    rng: &mut ChaCha8Rng,
    seed: u64,
    max_depth: usize,
    features_used: usize,
) -> TreeArrays {
    let mut arrays = TreeArrays {
        seed: Some(seed),
        children_left: Vec::new(),
        children_right: Vec::new(),
        feature: Vec::new(),
        threshold: Vec::new(),
        impurity: Vec::new(),
    };
    grow(rng, &mut arrays, 0, max_depth, features_used);
    arrays
}

fn grow(
    rng: &mut ChaCha8Rng,
    arrays: &mut TreeArrays,
    depth: usize,
    max_depth: usize,
    features_used: usize,
) -> i64 {
    let id = arrays.children_left.len();
    arrays.children_left.push(-1);
    arrays.children_right.push(-1);
    arrays.feature.push(-2);
    arrays.threshold.push(-2.0);
    arrays.impurity.push(rng.r#gen::<f64>() * 0.5);
    if depth < max_depth && rng.r#gen::<f64>() < 0.8 {
        arrays.feature[id] = rng.gen_range(0..features_used) as i64;
        arrays.threshold[id] = rng.r#gen::<f64>();
        let left = grow(rng, arrays, depth + 1, max_depth, features_used);
        let right = grow(rng, arrays, depth + 1, max_depth, features_used);
        arrays.children_left[id] = left;
        arrays.children_right[id] = right;
    }
    id as i64
}

struct Case {
    forest: Forest,
    features: Vec<Vec<f64>>,
    labels: Vec<f64>,
    values: Vec<f64>,
}

fn case(seed: u64, n_trees: usize, n_features: usize, features_used: usize) -> Case {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let trees: Vec<TreeArrays> = (0..n_trees)
        .map(|t| random_tree(&mut rng, seed * 1000 + t as u64, 5, features_used))
        .collect();
    let forest = Forest::from_arrays(&trees, n_features, BootstrapSampler::ChaCha8).unwrap();
    let n_samples = 60;
    let features: Vec<Vec<f64>> = (0..n_samples)
        .map(|_| (0..n_features).map(|_| rng.r#gen::<f64>()).collect())
        .collect();
    let labels = features
        .iter()
        .map(|row| if row[0] + rng.r#gen::<f64>() * 0.3 > 0.6 { 1.0 } else { 0.0 })
        .collect();
    let values = features
        .iter()
        .map(|row| 2.0 * row[0] - row[1] + rng.r#gen::<f64>() * 0.1)
        .collect();
    Case {
        forest,
        features,
        labels,
        values,
    }
}

#[test]
fn output_length_matches_recorded_feature_count() {
    for seed in 0..5 {
        let c = case(seed, 8, 6, 3);
        let result = DebiasedImportanceConfig::new(DebiasCriterion::Classification)
            .compute(&c.forest, &c.features, &c.labels)
            .unwrap();
        assert_eq!(result.importances().len(), 6);
        assert_eq!(result.std_errors().len(), 6);
        assert_eq!(result.per_tree().len(), 8);
    }
}

#[test]
fn unused_features_score_exactly_zero() {
    for seed in 0..5 {
        let c = case(seed, 10, 7, 4);
        let counts = c.forest.split_counts();
        for (criterion, targets) in [
            (DebiasCriterion::Classification, &c.labels),
            (DebiasCriterion::Regression, &c.values),
        ] {
            let result = DebiasedImportanceConfig::new(criterion)
                .compute(&c.forest, &c.features, targets)
                .unwrap();
            for (j, &imp) in result.importances().iter().enumerate() {
                if counts[j] == 0 {
                    assert_eq!(imp, 0.0, "feature {j} is never split on");
                }
            }
        }
    }
}

#[test]
fn parallel_and_sequential_agree_bit_for_bit() {
    for seed in 0..4 {
        let c = case(seed, 16, 5, 5);
        for (criterion, targets) in [
            (DebiasCriterion::Classification, &c.labels),
            (DebiasCriterion::Regression, &c.values),
        ] {
            let par = DebiasedImportanceConfig::new(criterion)
                .compute(&c.forest, &c.features, targets)
                .unwrap();
            let seq = DebiasedImportanceConfig::new(criterion)
                .with_parallel(false)
                .compute(&c.forest, &c.features, targets)
                .unwrap();
            let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(par.importances()), bits(seq.importances()));
            assert_eq!(bits(par.std_errors()), bits(seq.std_errors()));
        }
    }
}

#[test]
fn replay_is_deterministic() {
    let c = case(9, 6, 4, 4);
    let cfg = DebiasedImportanceConfig::new(DebiasCriterion::Regression);
    let a = cfg.compute(&c.forest, &c.features, &c.values).unwrap();
    let b = cfg.compute(&c.forest, &c.features, &c.values).unwrap();
    assert_eq!(a.importances(), b.importances());
    assert_eq!(c.forest.inbag_matrix(60).unwrap(), c.forest.inbag_matrix(60).unwrap());
}

#[test]
fn root_weight_is_one_for_every_tree() {
    let c = case(3, 6, 4, 4);
    let matrix = c.forest.inbag_matrix(c.features.len()).unwrap();
    for (t, tree) in c.forest.trees().iter().enumerate() {
        let stats = NodeStats::compute(
            tree,
            &c.features,
            &c.labels,
            matrix.column(t),
            DebiasCriterion::Classification,
        );
        assert!((stats.get(NodeIndex::ROOT).weight - 1.0).abs() < 1e-12);
    }
}

#[test]
fn nodes_without_inbag_weight_flag_their_parents() {
    let c = case(5, 6, 4, 4);
    let matrix = c.forest.inbag_matrix(c.features.len()).unwrap();
    for (t, tree) in c.forest.trees().iter().enumerate() {
        let stats = NodeStats::compute(
            tree,
            &c.features,
            &c.values,
            matrix.column(t),
            DebiasCriterion::Regression,
        );
        for i in 0..tree.n_nodes() {
            let node = NodeIndex::new(i);
            if stats.get(node).weight > 0.0 {
                continue;
            }
            assert!(!stats.get(node).reliable);
            if let Some(parent) = tree.parent(node) {
                assert!(!stats.get(parent).reliable);
            }
        }
    }
}
