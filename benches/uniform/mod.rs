mod build;
mod kernel_density;
mod query;
mod query_radius;

// Benchmark parameters:
pub const DIMENSION: usize = 3;
pub const NUM_POINTS: usize = 10000; // Number of indexed points
pub const NUM_QUERIES: usize = 1000;
pub const LEAF_SIZE: usize = 20;
pub const K: usize = 10; // Number of neighbors to query
pub const RADIUS: f64 = 5.0; // Radius for range queries
pub const BANDWIDTH: f64 = 2.0;

pub use build::benchmark as build;
pub use kernel_density::benchmark as kernel_density;
pub use query::benchmark as query;
pub use query_radius::benchmark as query_radius;
