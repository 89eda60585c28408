use balltree::{BallTree, Metric, QueryOptions, RadiusOptions};
use ndarray::{Array2, ArrayView1};
use ordered_float::OrderedFloat;
use rand::{rngs::StdRng, Rng, SeedableRng};

const METRICS: [Metric; 4] = [
    Metric::Euclidean,
    Metric::Manhattan,
    Metric::Minkowski(3.0),
    Metric::Chebyshev,
];

fn random_points(rng: &mut StdRng, n: usize, dim: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, dim), |_| rng.gen_range(-100.0..100.0))
}

fn distance(metric: Metric, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let a = a.as_slice().expect("standard layout");
    let b = b.as_slice().expect("standard layout");
    metric.distance(a, b)
}

// All points sorted by (distance, index)
fn brute_force(
    metric: Metric,
    points: &Array2<f64>,
    query: ArrayView1<f64>,
) -> Vec<(f64, usize)> {
    let mut all: Vec<(f64, usize)> = points
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, point)| (distance(metric, query, point), i))
        .collect();
    all.sort_by_key(|&(d, i)| (OrderedFloat(d), i));
    all
}

#[test]
fn test_random_knn() {
    let mut rng = StdRng::seed_from_u64(0);
    let points = random_points(&mut rng, 500, 3);
    let queries = random_points(&mut rng, 40, 3);

    for metric in METRICS {
        let tree = BallTree::new(points.view(), 10, metric).expect("valid input");
        let expected: Vec<_> = queries
            .rows()
            .into_iter()
            .map(|query| brute_force(metric, &points, query))
            .collect();

        for k in [1, 3, 5] {
            for dualtree in [false, true] {
                for breadth_first in [false, true] {
                    let options = QueryOptions {
                        dualtree,
                        breadth_first,
                        return_distance: true,
                    };
                    let neighbors = tree.query(queries.view(), k, options).expect("valid query");
                    let distances = neighbors.distances.expect("distances requested");
                    for (i, expected) in expected.iter().enumerate() {
                        for j in 0..k {
                            assert_eq!(neighbors.indices[[i, j]], expected[j].1);
                            assert_eq!(distances[[i, j]], expected[j].0);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_random_radius() {
    let mut rng = StdRng::seed_from_u64(1);
    let points = random_points(&mut rng, 400, 2);
    let queries = random_points(&mut rng, 30, 2);
    let radii: Vec<f64> = (0..30).map(|_| rng.gen_range(5.0..40.0)).collect();

    for metric in METRICS {
        let tree = BallTree::new(points.view(), 8, metric).expect("valid input");
        for breadth_first in [false, true] {
            let options = RadiusOptions {
                return_distance: true,
                sort_results: true,
                breadth_first,
            };
            let result = tree
                .query_radius(queries.view(), radii.clone(), options)
                .expect("valid query");
            let distances = result.distances.expect("distances requested");

            for (i, query) in queries.rows().into_iter().enumerate() {
                let (expected_distances, expected_indices): (Vec<f64>, Vec<usize>) =
                    brute_force(metric, &points, query)
                        .into_iter()
                        .filter(|&(d, _)| d <= radii[i])
                        .unzip();
                assert_eq!(result.indices[i], expected_indices);
                assert_eq!(distances[i], expected_distances);
            }

            let counts = tree
                .count_radius(queries.view(), radii.clone())
                .expect("valid query");
            let lengths: Vec<usize> = result.indices.iter().map(Vec::len).collect();
            assert_eq!(counts, lengths);
        }
    }
}

#[test]
fn test_radius_matches_knn() {
    // The points within the distance of the k-th neighbor are exactly the k
    // nearest ones when there are no ties.
    let mut rng = StdRng::seed_from_u64(2);
    let points = random_points(&mut rng, 300, 4);
    let queries = random_points(&mut rng, 20, 4);
    let tree = BallTree::new(points.view(), 4, Metric::Euclidean).expect("valid input");

    let k = 12;
    let neighbors = tree
        .query(queries.view(), k, QueryOptions::default())
        .expect("valid query");
    let distances = neighbors.distances.expect("distances requested");
    let radii: Vec<f64> = distances.rows().into_iter().map(|row| row[k - 1]).collect();
    let options = RadiusOptions {
        sort_results: true,
        ..RadiusOptions::default()
    };
    let result = tree
        .query_radius(queries.view(), radii, options)
        .expect("valid query");
    for (i, row) in result.indices.iter().enumerate() {
        let expected: Vec<usize> = neighbors.indices.row(i).to_vec();
        assert_eq!(row, &expected);
    }
}

#[test]
fn test_build_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(3);
    let points = random_points(&mut rng, 1000, 5);
    let queries = random_points(&mut rng, 10, 5);
    let a = BallTree::new(points.view(), 7, Metric::Manhattan).expect("valid input");
    let b = BallTree::new(points.view(), 7, Metric::Manhattan).expect("valid input");
    assert_eq!(a.index_order(), b.index_order());
    assert_eq!(a.height(), b.height());
    assert_eq!(
        a.query(queries.view(), 4, QueryOptions::default()),
        b.query(queries.view(), 4, QueryOptions::default())
    );
}

#[test]
fn test_duplicates_and_ties() {
    // Many identical points: ties must be broken by ascending index
    let mut rng = StdRng::seed_from_u64(4);
    let mut points = Array2::zeros((120, 2));
    for mut row in points.rows_mut() {
        row[0] = f64::from(rng.gen_range(0..3_u8));
        row[1] = f64::from(rng.gen_range(0..3_u8));
    }
    let queries = random_points(&mut rng, 5, 2).mapv(|x| x / 50.0);

    for leaf_size in [1, 3, 20] {
        let tree = BallTree::new(points.view(), leaf_size, Metric::Euclidean).expect("valid input");
        for dualtree in [false, true] {
            for breadth_first in [false, true] {
                let options = QueryOptions {
                    dualtree,
                    breadth_first,
                    return_distance: false,
                };
                let neighbors = tree.query(queries.view(), 30, options).expect("valid query");
                for (i, query) in queries.rows().into_iter().enumerate() {
                    let expected = brute_force(Metric::Euclidean, &points, query);
                    let actual: Vec<usize> = neighbors.indices.row(i).to_vec();
                    let expected: Vec<usize> = expected[..30].iter().map(|&(_, i)| i).collect();
                    assert_eq!(actual, expected);
                }
            }
        }
    }
}

fn grid_points(rng: &mut StdRng, n: usize, dim: usize, side: u8) -> Array2<f64> {
    Array2::from_shape_fn((n, dim), |_| f64::from(rng.gen_range(0..side)))
}

fn strategies() -> Vec<QueryOptions> {
    let mut strategies = Vec::new();
    for dualtree in [false, true] {
        for breadth_first in [false, true] {
            strategies.push(QueryOptions {
                dualtree,
                breadth_first,
                return_distance: true,
            });
        }
    }
    strategies
}

#[test]
fn test_grid_knn_ties() {
    // Integer grids put many points at exactly the k-th distance while node
    // centers are fractional means.
    let mut rng = StdRng::seed_from_u64(5);
    for dim in [2, 3] {
        let points = grid_points(&mut rng, 150, dim, 5);
        let queries = grid_points(&mut rng, 20, dim, 5);
        for metric in METRICS {
            let expected: Vec<_> = queries
                .rows()
                .into_iter()
                .map(|query| brute_force(metric, &points, query))
                .collect();
            for leaf_size in [1, 3, 8, 40] {
                let tree = BallTree::new(points.view(), leaf_size, metric).expect("valid input");
                for k in [1, 5, 17, 40] {
                    for options in strategies() {
                        let neighbors =
                            tree.query(queries.view(), k, options).expect("valid query");
                        let distances = neighbors.distances.expect("distances requested");
                        for (i, expected) in expected.iter().enumerate() {
                            let (expected_distances, expected_indices): (Vec<f64>, Vec<usize>) =
                                expected[..k].iter().copied().unzip();
                            assert_eq!(
                                neighbors.indices.row(i).to_vec(),
                                expected_indices,
                                "{} leaf_size = {leaf_size} k = {k} {options:?}",
                                metric.name()
                            );
                            assert_eq!(distances.row(i).to_vec(), expected_distances);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_grid_radius_boundaries() {
    // Integer radii land exactly on point distances; the boundary is inclusive.
    let mut rng = StdRng::seed_from_u64(6);
    let points = grid_points(&mut rng, 200, 2, 6);
    let queries = grid_points(&mut rng, 25, 2, 6);
    for metric in METRICS {
        for leaf_size in [1, 3, 8] {
            let tree = BallTree::new(points.view(), leaf_size, metric).expect("valid input");
            for radius in [0.0, 1.0, 2.0, 3.0, 5.0] {
                for breadth_first in [false, true] {
                    let options = RadiusOptions {
                        return_distance: true,
                        sort_results: true,
                        breadth_first,
                    };
                    let result = tree
                        .query_radius(queries.view(), radius, options)
                        .expect("valid query");
                    let distances = result.distances.expect("distances requested");
                    let counts = tree.count_radius(queries.view(), radius).expect("valid query");

                    for (i, query) in queries.rows().into_iter().enumerate() {
                        let (expected_distances, expected_indices): (Vec<f64>, Vec<usize>) =
                            brute_force(metric, &points, query)
                                .into_iter()
                                .filter(|&(d, _)| d <= radius)
                                .unzip();
                        assert_eq!(
                            result.indices[i],
                            expected_indices,
                            "{} leaf_size = {leaf_size} r = {radius}",
                            metric.name()
                        );
                        assert_eq!(distances[i], expected_distances);
                        assert_eq!(counts[i], expected_indices.len());
                    }
                }
            }
        }
    }
}

#[test]
fn test_rows_sorted_on_reported_distance() {
    // On a 0.1 grid, distinct squared distances can share one reported
    // distance; rows must still list those ties by ascending index.
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let points = grid_points(&mut rng, 40, 2, 10).mapv(|x| x * 0.1);
        let queries = grid_points(&mut rng, 5, 2, 10).mapv(|x| x * 0.1);
        for leaf_size in [3, 40] {
            let tree =
                BallTree::new(points.view(), leaf_size, Metric::Euclidean).expect("valid input");
            for options in strategies() {
                let neighbors = tree.query(queries.view(), 15, options).expect("valid query");
                let distances = neighbors.distances.expect("distances requested");
                for (i, query) in queries.rows().into_iter().enumerate() {
                    let expected = brute_force(Metric::Euclidean, &points, query);
                    let actual: Vec<(f64, usize)> = distances
                        .row(i)
                        .iter()
                        .copied()
                        .zip(neighbors.indices.row(i).iter().copied())
                        .collect();
                    assert_eq!(actual, expected[..15].to_vec());
                }
            }
        }
    }
}
