use crate::uniform::{DIMENSION as D, LEAF_SIZE, NUM_POINTS, NUM_QUERIES};
use balltree::{BallTree, Metric};
use criterion::Criterion;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("build");
    //group.sample_size(10);

    let points = uniform_points(NUM_POINTS, 0);
    for metric in [Metric::Euclidean, Metric::Manhattan] {
        group.bench_function(metric.name(), |b| {
            b.iter(|| BallTree::new(points.view(), LEAF_SIZE, metric).expect("valid input"));
        });
    }
}

pub fn uniform_points(n: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((n, D), |_| rng.gen_range(-100.0..100.0))
}

pub fn build_balltree() -> (BallTree, Array2<f64>) {
    let points = uniform_points(NUM_POINTS, 0);
    let tree = BallTree::new(points.view(), LEAF_SIZE, Metric::Euclidean).expect("valid input");
    (tree, uniform_points(NUM_QUERIES, 1))
}
