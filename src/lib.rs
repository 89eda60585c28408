//! A static ball tree for exact k-nearest-neighbor search, radius search and
//! tolerance-bounded kernel density estimation over points in a metric space.
//!
//! ```
//! use balltree::{BallTree, Metric, QueryOptions};
//! use ndarray::array;
//!
//! let points = array![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]];
//! let tree = BallTree::new(points.view(), 1, Metric::Euclidean).unwrap();
//! let neighbors = tree
//!     .query(array![[1.0, 1.0]].view(), 2, QueryOptions::default())
//!     .unwrap();
//! assert_eq!(neighbors.indices, array![[0, 1]]);
//! ```

mod error;
mod heap;
mod kde;
mod kernel;
mod knn;
mod metric;
mod node;
mod radius;
mod sphere;
mod traversal;
mod tree;

pub use error::{Error, ErrorKind, Result};
pub use heap::NeighborHeap;
pub use kde::KdeOptions;
pub use kernel::Kernel;
pub use knn::{Neighbors, QueryOptions};
pub use metric::{Bounds, Metric, MetricParams};
pub use radius::{Radius, RadiusNeighbors, RadiusOptions};
pub use tree::{BallTree, DEFAULT_LEAF_SIZE};

/// Resolves a metric by name; see [`Metric::get`].
///
/// # Errors
///
/// Returns a configuration error for unknown names or bad parameters.
pub fn get_metric(name: &str, params: &MetricParams) -> Result<Metric> {
    Metric::get(name, params)
}
