use conv::ValueFrom;

use crate::metric::{Bounds, Metric};

/// A bounding ball: every point of its subtree lies within `radius` of
/// `center` under the tree's metric.
#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec<f64>,
    pub radius: f64,
    pub weight: f64,
}

impl Sphere {
    /// The tight ball around `points` (flattened rows of length `dim`):
    /// centered on their mean, with the largest exact distance as radius.
    #[must_use]
    pub fn enclosing<'a, I>(metric: Metric, dim: usize, points: I) -> Sphere
    where
        I: Iterator<Item = &'a [f64]> + Clone,
    {
        let mut center = vec![0.0; dim];
        let mut count = 0_usize;
        for point in points.clone() {
            for (c, x) in center.iter_mut().zip(point) {
                *c += x;
            }
            count += 1;
        }
        let weight = weight_of(count);
        for c in &mut center {
            *c /= weight;
        }

        let radius = points
            .map(|point| metric.distance(&center, point))
            .fold(0.0, f64::max);

        Sphere {
            center,
            radius,
            weight,
        }
    }

    #[must_use]
    pub fn point_bounds(&self, metric: Metric, point: &[f64]) -> Bounds {
        Metric::point_bounds(metric.distance(&self.center, point), self.radius)
    }

    #[must_use]
    pub fn sphere_bounds(&self, metric: Metric, other: &Sphere) -> Bounds {
        Metric::ball_bounds(
            metric.distance(&self.center, &other.center),
            self.radius,
            other.radius,
        )
    }
}

/// Number of points as a float weight.
pub(crate) fn weight_of(count: usize) -> f64 {
    f64::value_from(count).unwrap_or(f64::MAX)
}
