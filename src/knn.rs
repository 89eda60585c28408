use ndarray::{Array2, ArrayView2};

use crate::{
    error::{Error, Result},
    heap::NeighborHeap,
    metric::{Bounds, Metric},
    node::Node,
    traversal::{self, DualTreeVisitor, SingleTreeVisitor, Visit},
    tree::BallTree,
};

/// Traversal strategy and output shape of a k-nearest-neighbor query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryOptions {
    /// Build a second tree over the queries and walk both trees together.
    pub dualtree: bool,
    /// Visit nodes by ascending lower bound instead of recursively.
    pub breadth_first: bool,
    /// Also report distances, not only indices.
    pub return_distance: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            dualtree: false,
            breadth_first: false,
            return_distance: true,
        }
    }
}

/// Result of [`BallTree::query`]: one row per query point, `k` columns,
/// nearest first (ties by ascending index).
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbors {
    pub indices: Array2<usize>,
    pub distances: Option<Array2<f64>>,
}

impl BallTree {
    /// Finds the `k` nearest indexed points of every row of `queries`.
    ///
    /// Every strategy in [`QueryOptions`] returns the same neighbors.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is not in `1..=num_points`, the query
    /// dimension differs from the tree's, or a query value is not finite.
    pub fn query(
        &self,
        queries: ArrayView2<'_, f64>,
        k: usize,
        options: QueryOptions,
    ) -> Result<Neighbors> {
        if k < 1 || k > self.num_points() {
            return Err(Error::InvalidNeighborCount {
                k,
                n: self.num_points(),
            });
        }
        let points = self.check_queries(queries)?;
        let num_queries = queries.nrows();
        log::debug!(
            "knn query: {} points, k = {}, dualtree = {}, breadth_first = {}",
            num_queries,
            k,
            options.dualtree,
            options.breadth_first
        );

        let neighbors = if num_queries == 0 {
            Vec::new()
        } else if options.dualtree {
            self.knn_dual(points, k, options.breadth_first)
        } else {
            points
                .chunks_exact(self.dim())
                .map(|query| {
                    let mut visitor = KnnVisitor {
                        metric: self.metric(),
                        heap: NeighborHeap::new(k),
                    };
                    traversal::single_tree(self, query, &mut visitor, options.breadth_first);
                    visitor.heap.into_sorted_vec()
                })
                .collect()
        };

        let indices = Array2::from_shape_fn((num_queries, k), |(i, j)| neighbors[i][j].1);
        let distances = options
            .return_distance
            .then(|| Array2::from_shape_fn((num_queries, k), |(i, j)| neighbors[i][j].0));
        Ok(Neighbors { indices, distances })
    }

    fn knn_dual(
        &self,
        points: Vec<f64>,
        k: usize,
        breadth_first: bool,
    ) -> Vec<Vec<(f64, usize)>> {
        let query_tree = BallTree::from_flat(points, self.dim(), self.leaf_size(), self.metric());
        let mut visitor = DualKnnVisitor {
            metric: self.metric(),
            heaps: vec![NeighborHeap::new(k); query_tree.num_points()],
            bounds: vec![f64::INFINITY; query_tree.node_count()],
        };
        traversal::dual_tree(&query_tree, self, &mut visitor, breadth_first);

        let mut neighbors = vec![Vec::new(); query_tree.num_points()];
        for (position, heap) in visitor.heaps.into_iter().enumerate() {
            neighbors[query_tree.original_index(position)] = heap.into_sorted_vec();
        }
        neighbors
    }
}

/// The heap holds reported distances, so ties are broken on the same values
/// the caller sees.
struct KnnVisitor {
    metric: Metric,
    heap: NeighborHeap,
}

impl SingleTreeVisitor for KnnVisitor {
    fn cutoff(&self) -> f64 {
        self.heap.largest()
    }

    fn visit_node(&mut self, _: &BallTree, _: &Node, _: &[f64], _: Bounds) -> Visit {
        Visit::Descend
    }

    fn visit_leaf(&mut self, tree: &BallTree, node: &Node, query: &[f64]) {
        for position in node.range.clone() {
            let distance = self.metric.distance(query, tree.point(position));
            self.heap.push(distance, tree.original_index(position));
        }
    }
}

/// One heap per query point (in query tree order) and, per query node, the
/// largest distance any of its points still needs to beat.
struct DualKnnVisitor {
    metric: Metric,
    heaps: Vec<NeighborHeap>,
    bounds: Vec<f64>,
}

impl DualTreeVisitor for DualKnnVisitor {
    fn cutoff(&self, query_node: &Node) -> f64 {
        self.bounds[query_node.slot_id]
    }

    fn visit_pair(&mut self, _: &Node, _: &Node, _: Bounds) -> Visit {
        Visit::Descend
    }

    fn visit_leaves(
        &mut self,
        query_tree: &BallTree,
        query_node: &Node,
        reference_tree: &BallTree,
        reference_node: &Node,
    ) {
        let mut bound: f64 = 0.0;
        for query_position in query_node.range.clone() {
            let query = query_tree.point(query_position);
            let heap = &mut self.heaps[query_position];
            for position in reference_node.range.clone() {
                let distance = self.metric.distance(query, reference_tree.point(position));
                heap.push(distance, reference_tree.original_index(position));
            }
            bound = bound.max(heap.largest());
        }
        self.bounds[query_node.slot_id] = bound;
    }

    fn refresh(&mut self, query_node: &Node) {
        if let Some([left, right]) = query_node.children {
            self.bounds[query_node.slot_id] = self.bounds[left].max(self.bounds[right]);
        }
    }
}
