use ndarray::{Array1, ArrayView2};

use crate::{
    error::{Error, Result},
    kernel::Kernel,
    metric::{Bounds, Metric},
    node::Node,
    sphere::weight_of,
    traversal::{self, DualTreeVisitor, SingleTreeVisitor, Visit},
    tree::BallTree,
};

/// Error tolerance and traversal strategy of a density query.
///
/// With both tolerances at zero the estimate is the exact kernel sum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KdeOptions {
    pub atol: f64,
    pub rtol: f64,
    pub breadth_first: bool,
    pub dualtree: bool,
}

impl BallTree {
    /// Kernel density at every row of `queries`: the sum over all indexed
    /// points of `kernel(distance / bandwidth)`.
    ///
    /// Each estimate is within `atol + rtol * exact` of the exact sum.
    ///
    /// # Errors
    ///
    /// Returns an error if the bandwidth is not positive, a tolerance is
    /// negative, the query dimension differs from the tree's, or any value is
    /// not finite.
    pub fn kernel_density(
        &self,
        queries: ArrayView2<'_, f64>,
        bandwidth: f64,
        kernel: Kernel,
        options: KdeOptions,
    ) -> Result<Array1<f64>> {
        check_parameter("bandwidth", bandwidth, bandwidth > 0.0)?;
        check_parameter("atol", options.atol, options.atol >= 0.0)?;
        check_parameter("rtol", options.rtol, options.rtol >= 0.0)?;
        let points = self.check_queries(queries)?;
        let num_queries = queries.nrows();
        log::debug!(
            "kernel density: {} points, kernel {}, h = {}, {:?}",
            num_queries,
            kernel.name(),
            bandwidth,
            options
        );

        let estimator = Estimator {
            metric: self.metric(),
            kernel,
            bandwidth,
            atol: options.atol,
            rtol: options.rtol,
            total_weight: weight_of(self.num_points()),
        };

        if num_queries == 0 {
            return Ok(Array1::zeros(0));
        }
        if options.dualtree {
            return Ok(self.density_dual(points, estimator, options.breadth_first));
        }
        Ok(points
            .chunks_exact(self.dim())
            .map(|query| {
                let mut visitor = KdeVisitor {
                    estimator,
                    density: Density::default(),
                };
                traversal::single_tree(self, query, &mut visitor, options.breadth_first);
                visitor.density.estimate
            })
            .collect())
    }

    fn density_dual(
        &self,
        points: Vec<f64>,
        estimator: Estimator,
        breadth_first: bool,
    ) -> Array1<f64> {
        let query_tree = BallTree::from_flat(points, self.dim(), self.leaf_size(), self.metric());
        let mut visitor = DualKdeVisitor {
            estimator,
            densities: vec![Density::default(); query_tree.num_points()],
            settled: vec![0.0; query_tree.node_count()],
        };
        traversal::dual_tree(&query_tree, self, &mut visitor, breadth_first);

        let mut estimates = Array1::zeros(query_tree.num_points());
        for (position, density) in visitor.densities.iter().enumerate() {
            estimates[query_tree.original_index(position)] = density.estimate;
        }
        estimates
    }
}

fn check_parameter(name: &'static str, value: f64, valid: bool) -> Result<()> {
    if valid && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

/// Running estimate for one query point. `settled` is a lower bound on the
/// exact density, made of exact leaf sums and the lower bounds of
/// approximated nodes.
#[derive(Clone, Copy, Debug, Default)]
struct Density {
    estimate: f64,
    settled: f64,
}

impl Density {
    fn add_exact(&mut self, sum: f64) {
        self.estimate += sum;
        self.settled += sum;
    }

    fn add_approximate(&mut self, low: f64, high: f64) {
        self.estimate += 0.5 * (low + high);
        self.settled += low;
    }
}

#[derive(Clone, Copy, Debug)]
struct Estimator {
    metric: Metric,
    kernel: Kernel,
    bandwidth: f64,
    atol: f64,
    rtol: f64,
    total_weight: f64,
}

impl Estimator {
    /// Bounds on the summed kernel values of `weight` points whose
    /// distances lie within `bounds`.
    fn contribution(&self, weight: f64, bounds: Bounds) -> (f64, f64) {
        (
            weight * self.kernel.evaluate(bounds.upper, self.bandwidth),
            weight * self.kernel.evaluate(bounds.lower, self.bandwidth),
        )
    }

    /// Whether a node's contribution interval is narrow enough to replace the
    /// node by its midpoint. `settled` must not exceed the exact density of
    /// the query outside this node.
    ///
    /// Each node may use its share `weight / total_weight` of the error
    /// budget, so the sum of midpoint errors stays within
    /// `atol + rtol * exact`.
    fn within_tolerance(&self, weight: f64, low: f64, high: f64, settled: f64) -> bool {
        let budget = (self.atol + self.rtol * (settled + low)) * weight / self.total_weight;
        high - low <= budget
    }

    fn kernel_sum<'a>(&self, query: &[f64], points: impl Iterator<Item = &'a [f64]>) -> f64 {
        points
            .map(|point| {
                self.kernel
                    .evaluate(self.metric.distance(query, point), self.bandwidth)
            })
            .sum()
    }
}

struct KdeVisitor {
    estimator: Estimator,
    density: Density,
}

impl SingleTreeVisitor for KdeVisitor {
    fn visit_node(&mut self, _: &BallTree, node: &Node, _: &[f64], bounds: Bounds) -> Visit {
        let weight = node.sphere.weight;
        let (low, high) = self.estimator.contribution(weight, bounds);
        if self
            .estimator
            .within_tolerance(weight, low, high, self.density.settled)
        {
            self.density.add_approximate(low, high);
            Visit::Accept
        } else {
            Visit::Descend
        }
    }

    fn visit_leaf(&mut self, tree: &BallTree, node: &Node, query: &[f64]) {
        let sum = self
            .estimator
            .kernel_sum(query, node.range.clone().map(|position| tree.point(position)));
        self.density.add_exact(sum);
    }
}

/// Densities are kept per query point in query tree order; `settled` holds,
/// per query node, a lower bound on the smallest settled density among its
/// points.
struct DualKdeVisitor {
    estimator: Estimator,
    densities: Vec<Density>,
    settled: Vec<f64>,
}

impl DualTreeVisitor for DualKdeVisitor {
    fn visit_pair(&mut self, query_node: &Node, reference_node: &Node, bounds: Bounds) -> Visit {
        let weight = reference_node.sphere.weight;
        let (low, high) = self.estimator.contribution(weight, bounds);
        if !self
            .estimator
            .within_tolerance(weight, low, high, self.settled[query_node.slot_id])
        {
            return Visit::Descend;
        }
        for density in &mut self.densities[query_node.range.clone()] {
            density.add_approximate(low, high);
        }
        self.settled[query_node.slot_id] += low;
        Visit::Accept
    }

    fn visit_leaves(
        &mut self,
        query_tree: &BallTree,
        query_node: &Node,
        reference_tree: &BallTree,
        reference_node: &Node,
    ) {
        let mut settled = f64::INFINITY;
        for position in query_node.range.clone() {
            let sum = self.estimator.kernel_sum(
                query_tree.point(position),
                reference_node
                    .range
                    .clone()
                    .map(|reference| reference_tree.point(reference)),
            );
            let density = &mut self.densities[position];
            density.add_exact(sum);
            settled = settled.min(density.settled);
        }
        self.settled[query_node.slot_id] = settled;
    }

    fn refresh(&mut self, query_node: &Node) {
        if let Some([left, right]) = query_node.children {
            let from_children = self.settled[left].min(self.settled[right]);
            let settled = &mut self.settled[query_node.slot_id];
            *settled = settled.max(from_children);
        }
    }
}
