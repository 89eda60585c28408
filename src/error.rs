/// Result alias for `balltree`.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was malformed: bad parameters, shapes or names.
    Configuration,
    /// The input contained NaN or infinite values.
    NumericalInput,
}

/// Errors returned by tree construction and queries.
///
/// Every error is raised before any traversal starts, so a failed call never
/// leaves partial results behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("leaf size must be at least 1, got {0}")]
    InvalidLeafSize(usize),

    #[error("cannot build a tree over an empty point set")]
    EmptyInput,

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("metric '{metric}' requires parameter '{param}'")]
    MissingMetricParam {
        metric: &'static str,
        param: &'static str,
    },

    #[error("invalid value {value} for metric parameter '{param}': {reason}")]
    InvalidMetricParam {
        param: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("metric '{metric}' does not accept parameter '{param}'")]
    UnexpectedMetricParam { metric: &'static str, param: String },

    #[error("unknown kernel '{0}'")]
    UnknownKernel(String),

    #[error("k must be in [1, {n}], got {k}")]
    InvalidNeighborCount { k: usize, n: usize },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("expected {expected} radii (one per query point), found {found}")]
    RadiusCountMismatch { expected: usize, found: usize },

    #[error("invalid value {value} for parameter '{name}'")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("non-finite value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    #[error("coordinates too large: distances overflow")]
    DistanceOverflow,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NonFinite { .. } | Error::DistanceOverflow => ErrorKind::NumericalInput,
            Error::InvalidParameter { value, .. } if !value.is_finite() => {
                ErrorKind::NumericalInput
            }
            _ => ErrorKind::Configuration,
        }
    }
}
