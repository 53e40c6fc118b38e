//! Criterion benchmarks for canopy-importance: the per-tree engine and the full ensemble.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use canopy_forest::{BootstrapSampler, Forest, TreeArrays};
use canopy_importance::{DebiasCriterion, DebiasedImportanceConfig, NodeStats, tree_importance};

/// Complete binary tree in breadth-first layout with random splits.
fn random_complete_tree(depth: u32, n_features: usize, seed: u64) -> TreeArrays {
    let n_nodes = (1usize << (depth + 1)) - 1;
    let n_internal = (1usize << depth) - 1;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut arrays = TreeArrays {
        seed: Some(seed),
        children_left: vec![-1; n_nodes],
        children_right: vec![-1; n_nodes],
        feature: vec![-2; n_nodes],
        threshold: vec![-2.0; n_nodes],
        impurity: vec![0.0; n_nodes],
    };
    for i in 0..n_internal {
        arrays.children_left[i] = (2 * i + 1) as i64;
        arrays.children_right[i] = (2 * i + 2) as i64;
        arrays.feature[i] = rng.gen_range(0..n_features) as i64;
        arrays.threshold[i] = rng.r#gen::<f64>();
        arrays.impurity[i] = rng.r#gen::<f64>() * 0.25;
    }
    arrays
}

fn make_regression(n_samples: usize, n_features: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let features: Vec<Vec<f64>> = (0..n_samples)
        .map(|_| (0..n_features).map(|_| rng.r#gen::<f64>()).collect())
        .collect();
    let targets = features
        .iter()
        .map(|row| row[0] * 3.0 + row[1] + rng.r#gen::<f64>() * 0.2)
        .collect();
    (features, targets)
}

fn bench_single_tree(c: &mut Criterion) {
    let (features, targets) = make_regression(2000, 20, 1);
    let forest =
        Forest::from_arrays(&[random_complete_tree(8, 20, 7)], 20, BootstrapSampler::ChaCha8)
            .unwrap();
    let counts = forest.replay(0, features.len()).unwrap();
    let tree = &forest.trees()[0];

    c.bench_function("node_stats_2000x20_depth8", |b| {
        b.iter(|| {
            let stats = NodeStats::compute(
                tree,
                &features,
                &targets,
                &counts,
                DebiasCriterion::Regression,
            );
            tree_importance(tree, &stats)
        });
    });
}

fn bench_ensemble(c: &mut Criterion) {
    let (features, targets) = make_regression(1000, 20, 2);
    let trees: Vec<TreeArrays> = (0..100).map(|s| random_complete_tree(7, 20, s)).collect();
    let forest = Forest::from_arrays(&trees, 20, BootstrapSampler::ChaCha8).unwrap();

    let par = DebiasedImportanceConfig::new(DebiasCriterion::Regression);
    c.bench_function("debiased_mdi_1000x20_100trees_parallel", |b| {
        b.iter(|| par.compute(&forest, &features, &targets).unwrap());
    });

    let seq = par.clone().with_parallel(false);
    c.bench_function("debiased_mdi_1000x20_100trees_sequential", |b| {
        b.iter(|| seq.compute(&forest, &features, &targets).unwrap());
    });
}

criterion_group!(benches, bench_single_tree, bench_ensemble);
criterion_main!(benches);
