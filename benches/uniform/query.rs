use crate::uniform::build::build_balltree;
use crate::uniform::{DIMENSION as D, K, NUM_POINTS};
use balltree::{BallTree, QueryOptions};
use criterion::Criterion;
use ndarray::Array2;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

pub fn benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("query");
    //group.sample_size(10);

    let (tree, queries) = build_balltree();
    for (name, dualtree, breadth_first) in [
        ("single_depth_first", false, false),
        ("single_breadth_first", false, true),
        ("dual_depth_first", true, false),
        ("dual_breadth_first", true, true),
    ] {
        let options = QueryOptions {
            dualtree,
            breadth_first,
            return_distance: true,
        };
        group.bench_function(name, |b| {
            b.iter(|| query_balltree(&tree, &queries, options));
        });
    }

    let points = crate::uniform::build::uniform_points(NUM_POINTS, 0);
    group.bench_function("list", |b| {
        b.iter(|| query_list(&points, &queries));
    });
}

fn query_balltree(tree: &BallTree, queries: &Array2<f64>, options: QueryOptions) {
    let neighbors = tree.query(queries.view(), K, options).expect("valid query");
    assert_eq!(neighbors.indices.ncols(), K);
}

fn query_list(points: &Array2<f64>, queries: &Array2<f64>) {
    for query in queries.rows() {
        let mut results = BinaryHeap::from(vec![OrderedFloat(f64::INFINITY); K]);
        for point in points.rows() {
            let dist = (0..D)
                .map(|i| (query[i] - point[i]).powi(2))
                .sum::<f64>()
                .sqrt();
            if let Some(mut largest) = results.peek_mut() {
                if dist < largest.0 {
                    *largest = OrderedFloat(dist);
                }
            }
        }
        assert_eq!(results.len(), K);
    }
}
