use ndarray::ArrayView2;
use ordered_float::OrderedFloat;

use crate::{
    error::{Error, Result},
    metric::{Bounds, Metric},
    node::Node,
    traversal::{self, SingleTreeVisitor, Visit},
    tree::BallTree,
};

/// Search radius: one for all queries, or one per query row.
#[derive(Clone, Debug, PartialEq)]
pub enum Radius {
    Scalar(f64),
    PerQuery(Vec<f64>),
}

impl From<f64> for Radius {
    fn from(radius: f64) -> Self {
        Radius::Scalar(radius)
    }
}

impl From<Vec<f64>> for Radius {
    fn from(radii: Vec<f64>) -> Self {
        Radius::PerQuery(radii)
    }
}

impl From<&[f64]> for Radius {
    fn from(radii: &[f64]) -> Self {
        Radius::PerQuery(radii.to_vec())
    }
}

impl Radius {
    fn resolve(self, num_queries: usize) -> Result<Vec<f64>> {
        let radii = match self {
            Radius::Scalar(radius) => vec![radius; num_queries],
            Radius::PerQuery(radii) if radii.len() != num_queries => {
                return Err(Error::RadiusCountMismatch {
                    expected: num_queries,
                    found: radii.len(),
                });
            }
            Radius::PerQuery(radii) => radii,
        };
        match radii.iter().find(|radius| radius.is_nan()) {
            Some(&value) => Err(Error::InvalidParameter {
                name: "radius",
                value,
            }),
            None => Ok(radii),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadiusOptions {
    /// Also report the distance of each returned point.
    pub return_distance: bool,
    /// Order each row by ascending distance (ties by index).
    pub sort_results: bool,
    /// Visit nodes by ascending lower bound instead of recursively.
    pub breadth_first: bool,
}

/// Result of [`BallTree::query_radius`]. Rows have different lengths.
#[derive(Clone, Debug, PartialEq)]
pub struct RadiusNeighbors {
    pub indices: Vec<Vec<usize>>,
    pub distances: Option<Vec<Vec<f64>>>,
}

impl BallTree {
    /// Finds, for every row of `queries`, all indexed points within the
    /// radius (boundary included).
    ///
    /// Unless `sort_results` is set, the order within a row is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error if the query dimension differs from the tree's, a
    /// query value is not finite, a radius is NaN, or the number of radii
    /// does not match the number of queries.
    pub fn query_radius(
        &self,
        queries: ArrayView2<'_, f64>,
        radius: impl Into<Radius>,
        options: RadiusOptions,
    ) -> Result<RadiusNeighbors> {
        let points = self.check_queries(queries)?;
        let radii = radius.into().resolve(queries.nrows())?;
        log::debug!(
            "radius query: {} points, breadth_first = {}",
            queries.nrows(),
            options.breadth_first
        );

        let keep_distances = options.return_distance || options.sort_results;
        let mut indices = Vec::with_capacity(radii.len());
        let mut distances = Vec::with_capacity(radii.len());
        for (query, &radius) in points.chunks_exact(self.dim()).zip(&radii) {
            let mut visitor = RadiusVisitor::new(self.metric(), radius, true, keep_distances);
            traversal::single_tree(self, query, &mut visitor, options.breadth_first);

            let (mut row_indices, mut row_distances) = (visitor.indices, visitor.distances);
            if options.sort_results {
                let mut pairs: Vec<(f64, usize)> =
                    row_distances.into_iter().zip(row_indices).collect();
                pairs.sort_unstable_by_key(|&(distance, index)| (OrderedFloat(distance), index));
                (row_distances, row_indices) = pairs.into_iter().unzip();
            }
            indices.push(row_indices);
            distances.push(row_distances);
        }

        Ok(RadiusNeighbors {
            indices,
            distances: options.return_distance.then_some(distances),
        })
    }

    /// Counts, for every row of `queries`, the indexed points within the
    /// radius, without collecting them.
    ///
    /// # Errors
    ///
    /// Same conditions as [`BallTree::query_radius`].
    pub fn count_radius(
        &self,
        queries: ArrayView2<'_, f64>,
        radius: impl Into<Radius>,
    ) -> Result<Vec<usize>> {
        let points = self.check_queries(queries)?;
        let radii = radius.into().resolve(queries.nrows())?;
        log::debug!("radius count: {} points", queries.nrows());

        Ok(points
            .chunks_exact(self.dim())
            .zip(radii)
            .map(|(query, radius)| {
                let mut visitor = RadiusVisitor::new(self.metric(), radius, false, false);
                traversal::depth_first(self, query, &mut visitor);
                visitor.count
            })
            .collect())
    }
}

/// Accepts whole nodes that lie inside the radius, rejects those outside
/// (through the cutoff) and checks leaves point by point.
struct RadiusVisitor {
    metric: Metric,
    radius: f64,
    keep_indices: bool,
    keep_distances: bool,
    count: usize,
    indices: Vec<usize>,
    distances: Vec<f64>,
}

impl RadiusVisitor {
    fn new(metric: Metric, radius: f64, keep_indices: bool, keep_distances: bool) -> Self {
        RadiusVisitor {
            metric,
            radius,
            keep_indices,
            keep_distances,
            count: 0,
            indices: Vec::new(),
            distances: Vec::new(),
        }
    }

    fn add(&mut self, index: usize, distance: impl FnOnce() -> f64) {
        self.count += 1;
        if self.keep_indices {
            self.indices.push(index);
        }
        if self.keep_distances {
            self.distances.push(distance());
        }
    }
}

impl SingleTreeVisitor for RadiusVisitor {
    fn cutoff(&self) -> f64 {
        self.radius
    }

    fn visit_node(
        &mut self,
        tree: &BallTree,
        node: &Node,
        query: &[f64],
        bounds: Bounds,
    ) -> Visit {
        if bounds.upper > self.radius {
            return Visit::Descend;
        }
        if !self.keep_indices && !self.keep_distances {
            self.count += node.num_points();
            return Visit::Accept;
        }
        for position in node.range.clone() {
            let metric = self.metric;
            self.add(tree.original_index(position), || {
                metric.distance(query, tree.point(position))
            });
        }
        Visit::Accept
    }

    fn visit_leaf(&mut self, tree: &BallTree, node: &Node, query: &[f64]) {
        for position in node.range.clone() {
            let distance = self.metric.distance(query, tree.point(position));
            if distance <= self.radius {
                self.add(tree.original_index(position), || distance);
            }
        }
    }
}
