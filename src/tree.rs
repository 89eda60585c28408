use std::ops::Range;

use ndarray::ArrayView2;
use ordered_float::OrderedFloat;

use crate::{
    error::{Error, Result},
    metric::{Metric, MetricParams},
    node::Node,
    sphere::Sphere,
};

/// Leaf size used when the caller has no preference.
pub const DEFAULT_LEAF_SIZE: usize = 20;

/// An immutable ball tree over a fixed set of points.
///
/// The points are copied in tree order so that every node owns a contiguous
/// block of rows; `idx_array` maps tree positions back to original rows.
/// Nodes live in an arena in pre-order, the root being slot 0.
#[derive(Clone, Debug)]
pub struct BallTree {
    leaf_size: usize,
    metric: Metric,
    dim: usize,
    data: Vec<f64>,
    idx_array: Vec<usize>,
    nodes: Vec<Node>,
}

impl BallTree {
    /// Builds a tree over the rows of `points`.
    ///
    /// # Errors
    ///
    /// Returns an error if `leaf_size` is zero, `points` has no rows or
    /// columns, any coordinate is NaN or infinite, or the points are spread
    /// so far apart that their distances overflow `f64`.
    pub fn new(points: ArrayView2<'_, f64>, leaf_size: usize, metric: Metric) -> Result<Self> {
        if leaf_size < 1 {
            return Err(Error::InvalidLeafSize(leaf_size));
        }
        let (num_points, dim) = points.dim();
        if num_points == 0 || dim == 0 {
            return Err(Error::EmptyInput);
        }
        let data = flatten(points)?;
        let tree = Self::from_flat(data, dim, leaf_size, metric);

        // Every pairwise distance is at most the root diameter.
        let root = &tree.node(tree.root()).sphere;
        if !metric.distance_to_reduced(2.0 * root.radius).is_finite() {
            return Err(Error::DistanceOverflow);
        }
        Ok(tree)
    }

    /// Builds a tree with a metric looked up by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the metric cannot be resolved or [`BallTree::new`]
    /// rejects the input.
    pub fn build(
        points: ArrayView2<'_, f64>,
        leaf_size: usize,
        metric: &str,
        params: &MetricParams,
    ) -> Result<Self> {
        let metric = Metric::get(metric, params)?;
        Self::new(points, leaf_size, metric)
    }

    /// Builds from already validated, row-major points.
    pub(crate) fn from_flat(
        points: Vec<f64>,
        dim: usize,
        leaf_size: usize,
        metric: Metric,
    ) -> Self {
        let num_points = points.len() / dim;
        let mut builder = Builder {
            points: &points,
            dim,
            leaf_size,
            metric,
            idx_array: (0..num_points).collect(),
            nodes: Vec::new(),
        };
        builder.build_subtree(0..num_points, usize::MAX);
        let Builder {
            idx_array, nodes, ..
        } = builder;

        let data = idx_array
            .iter()
            .flat_map(|&i| row(&points, dim, i))
            .copied()
            .collect();

        let tree = BallTree {
            leaf_size,
            metric,
            dim,
            data,
            idx_array,
            nodes,
        };
        log::debug!(
            "built ball tree: {} points, {} dims, leaf size {}, {} nodes, height {}, metric {}",
            num_points,
            dim,
            leaf_size,
            tree.node_count(),
            tree.height(),
            metric.name()
        );
        tree
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        self.idx_array.len()
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.nodes.first().map_or(0, |root| root.height)
    }

    /// Original row index of each point, in tree order.
    #[must_use]
    pub fn index_order(&self) -> &[usize] {
        &self.idx_array
    }

    pub(crate) fn root(&self) -> usize {
        0
    }

    pub(crate) fn node(&self, slot_id: usize) -> &Node {
        &self.nodes[slot_id]
    }

    /// Point at tree position `position`.
    pub(crate) fn point(&self, position: usize) -> &[f64] {
        row(&self.data, self.dim, position)
    }

    /// Original row index of the point at tree position `position`.
    pub(crate) fn original_index(&self, position: usize) -> usize {
        self.idx_array[position]
    }

    /// Validates a query matrix against the tree and flattens it. Queries so
    /// far away that a distance to some indexed point could overflow are
    /// rejected.
    pub(crate) fn check_queries(&self, queries: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        if queries.ncols() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: queries.ncols(),
            });
        }
        let points = flatten(queries)?;
        let root = &self.node(self.root()).sphere;
        for query in points.chunks_exact(self.dim) {
            let reach = self.metric.distance(&root.center, query) + root.radius;
            if !self.metric.distance_to_reduced(reach).is_finite() {
                return Err(Error::DistanceOverflow);
            }
        }
        Ok(points)
    }
}

struct Builder<'a> {
    points: &'a [f64],
    dim: usize,
    leaf_size: usize,
    metric: Metric,
    idx_array: Vec<usize>,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn build_subtree(&mut self, range: Range<usize>, parent: usize) -> usize {
        let sphere = Sphere::enclosing(
            self.metric,
            self.dim,
            self.idx_array[range.clone()]
                .iter()
                .map(|&i| row(self.points, self.dim, i)),
        );
        let slot_id = self.nodes.len();
        self.nodes.push(Node::new(slot_id, parent, sphere, range.clone()));

        if range.len() <= self.leaf_size {
            return slot_id;
        }

        // Halve the points around the median of the widest dimension.
        let split_dimension = self.split_dimension(range.clone());
        let mid = range.start + range.len() / 2;
        let (points, dim) = (self.points, self.dim);
        self.idx_array[range.clone()].select_nth_unstable_by_key(mid - range.start, |&i| {
            (OrderedFloat(points[i * dim + split_dimension]), i)
        });

        let left = self.build_subtree(range.start..mid, slot_id);
        let right = self.build_subtree(mid..range.end, slot_id);
        let height = self.nodes[left].height.max(self.nodes[right].height) + 1;

        let node = &mut self.nodes[slot_id];
        node.children = Some([left, right]);
        node.height = height;
        slot_id
    }

    // Dimension with the largest spread (max - min); ties go to the lowest dimension.
    fn split_dimension(&self, range: Range<usize>) -> usize {
        let mut best = (0, f64::NEG_INFINITY);
        for axis in 0..self.dim {
            let (min, max) = self.idx_array[range.clone()].iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(min, max), &i| {
                    let x = self.points[i * self.dim + axis];
                    (min.min(x), max.max(x))
                },
            );
            if max - min > best.1 {
                best = (axis, max - min);
            }
        }
        best.0
    }
}

fn row(points: &[f64], dim: usize, i: usize) -> &[f64] {
    &points[i * dim..(i + 1) * dim]
}

/// Row-major copy of `points`, rejecting non-finite values.
pub(crate) fn flatten(points: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
    if let Some(((row, column), _)) = points.indexed_iter().find(|(_, x)| !x.is_finite()) {
        return Err(Error::NonFinite { row, column });
    }
    Ok(points.iter().copied().collect())
}
