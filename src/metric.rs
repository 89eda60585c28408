use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2, Zip};

use crate::error::{Error, Result};

/// Relative rounding margin applied to ball bounds. It covers the error of
/// summing a few thousand rounded terms.
const BOUND_SLACK: f64 = 1e-10;

/// Named parameters for a metric, e.g. `{"p": 3.0}` for Minkowski.
pub type MetricParams = BTreeMap<String, f64>;

/// A distance function family with ball-bound support.
///
/// Every variant is a true metric (symmetric, triangle inequality), which is
/// what makes the ball bounds below valid pruning criteria.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
    Minkowski(f64),
}

impl Metric {
    /// Resolves a metric by name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is unknown, a required
    /// parameter is missing or invalid, or an unsupported parameter is given.
    pub fn get(name: &str, params: &MetricParams) -> Result<Self> {
        let metric = match name.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Metric::Euclidean,
            "manhattan" | "cityblock" | "l1" => Metric::Manhattan,
            "chebyshev" | "infinity" => Metric::Chebyshev,
            "minkowski" => {
                let p = *params.get("p").ok_or(Error::MissingMetricParam {
                    metric: "minkowski",
                    param: "p",
                })?;
                return reject_extra(Self::minkowski(p)?, "minkowski", params, &["p"]);
            }
            _ => return Err(Error::UnknownMetric(name.to_string())),
        };
        reject_extra(metric, metric.name(), params, &[])
    }

    /// A Minkowski metric of power `p`; `p = inf` is Chebyshev.
    ///
    /// # Errors
    ///
    /// Returns an error if `p` is NaN or below 1 (not a metric).
    pub fn minkowski(p: f64) -> Result<Self> {
        if p.is_nan() || p < 1.0 {
            return Err(Error::InvalidMetricParam {
                param: "p",
                value: p,
                reason: "p must be a number >= 1",
            });
        }
        if p.is_infinite() {
            return Ok(Metric::Chebyshev);
        }
        Ok(Metric::Minkowski(p))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Chebyshev => "chebyshev",
            Metric::Minkowski(_) => "minkowski",
        }
    }

    /// Exact distance between two points of equal length.
    #[must_use]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self.reduced_to_distance(self.reduced_distance(a, b))
    }

    /// A monotone surrogate of [`Metric::distance`] that skips the final root.
    #[must_use]
    pub fn reduced_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        self.reduce(a.iter().zip(b))
    }

    fn reduce<'a>(&self, pairs: impl Iterator<Item = (&'a f64, &'a f64)>) -> f64 {
        let diffs = pairs.map(|(x, y)| (x - y).abs());
        match *self {
            Metric::Euclidean => diffs.map(|d| d * d).sum(),
            Metric::Manhattan => diffs.sum(),
            Metric::Chebyshev => diffs.fold(0.0, f64::max),
            Metric::Minkowski(p) => diffs.map(|d| d.powf(p)).sum(),
        }
    }

    #[must_use]
    pub fn reduced_to_distance(&self, reduced: f64) -> f64 {
        match *self {
            Metric::Euclidean => reduced.sqrt(),
            Metric::Manhattan | Metric::Chebyshev => reduced,
            Metric::Minkowski(p) => reduced.powf(p.recip()),
        }
    }

    #[must_use]
    pub fn distance_to_reduced(&self, distance: f64) -> f64 {
        match *self {
            Metric::Euclidean => distance * distance,
            Metric::Manhattan | Metric::Chebyshev => distance,
            Metric::Minkowski(p) => distance.powf(p),
        }
    }

    /// Distance bounds between any point of ball A and any point of ball B,
    /// given the distance between their centers.
    ///
    /// Both ends are widened by a rounding margin proportional to the
    /// distances involved, so a computed point distance never falls outside
    /// the bounds of a ball that holds the point.
    #[must_use]
    pub fn ball_bounds(center_distance: f64, radius_a: f64, radius_b: f64) -> Bounds {
        let extent = center_distance + radius_a + radius_b;
        let slack = extent * BOUND_SLACK;
        Bounds::new(
            (center_distance - radius_a - radius_b - slack).max(0.0),
            extent + slack,
        )
    }

    /// Distance bounds between a fixed point and any point of a ball.
    #[must_use]
    pub fn point_bounds(center_distance: f64, radius: f64) -> Bounds {
        Self::ball_bounds(center_distance, radius, 0.0)
    }

    /// All distances between rows of `a` and rows of `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the column counts differ.
    pub fn pairwise(&self, a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if a.ncols() != b.ncols() {
            return Err(Error::DimensionMismatch {
                expected: a.ncols(),
                found: b.ncols(),
            });
        }
        let mut distances = Array2::zeros((a.nrows(), b.nrows()));
        Zip::from(distances.rows_mut())
            .and(a.rows())
            .for_each(|out, a_row| {
                Zip::from(out).and(b.rows()).for_each(|d, b_row| {
                    *d = self.reduced_to_distance(self.reduce(a_row.iter().zip(b_row.iter())));
                });
            });
        Ok(distances)
    }
}

fn reject_extra(
    metric: Metric,
    name: &'static str,
    params: &MetricParams,
    allowed: &[&str],
) -> Result<Metric> {
    match params.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(Error::UnexpectedMetricParam {
            metric: name,
            param: key.clone(),
        }),
        None => Ok(metric),
    }
}

/// A closed interval of possible distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        debug_assert!(lower <= upper, "lower bound {lower} exceeds upper bound {upper}");
        Bounds { lower, upper }
    }
}
