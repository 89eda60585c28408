use crate::uniform::build::{build_balltree, uniform_points};
use crate::uniform::{DIMENSION as D, NUM_POINTS, RADIUS};
use balltree::{BallTree, RadiusOptions};
use criterion::Criterion;
use ndarray::Array2;

pub fn benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("query_radius");
    //group.sample_size(10);

    let (tree, queries) = build_balltree();
    group.bench_function("indices", |b| {
        b.iter(|| query_range_balltree(&tree, &queries, RadiusOptions::default()));
    });

    let options = RadiusOptions {
        return_distance: true,
        sort_results: true,
        breadth_first: false,
    };
    group.bench_function("sorted", |b| {
        b.iter(|| query_range_balltree(&tree, &queries, options));
    });

    group.bench_function("count", |b| {
        b.iter(|| tree.count_radius(queries.view(), RADIUS).expect("valid query"));
    });

    let points = uniform_points(NUM_POINTS, 0);
    group.bench_function("list", |b| {
        b.iter(|| query_range_list(&points, &queries));
    });
}

fn query_range_balltree(tree: &BallTree, queries: &Array2<f64>, options: RadiusOptions) {
    let result = tree
        .query_radius(queries.view(), RADIUS, options)
        .expect("valid query");
    assert_eq!(result.indices.len(), queries.nrows());
}

fn query_range_list(points: &Array2<f64>, queries: &Array2<f64>) {
    for query in queries.rows() {
        let mut results = Vec::new();
        for (i, point) in points.rows().into_iter().enumerate() {
            let dist = (0..D)
                .map(|j| (query[j] - point[j]).powi(2))
                .sum::<f64>()
                .sqrt();
            if dist <= RADIUS {
                results.push(i);
            }
        }
        assert!(results.len() <= NUM_POINTS);
    }
}
