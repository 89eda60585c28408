use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::str::FromStr;

use crate::error::Error;

/// Smoothing kernels for density estimation.
///
/// Each kernel is a one-dimensional profile evaluated at `u = distance / h`,
/// without bandwidth or dimension normalization. All of them are
/// non-increasing in `u`, which is what lets a ball's distance bounds turn
/// into bounds on its density contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Kernel {
    #[default]
    Gaussian,
    Tophat,
    Epanechnikov,
    Exponential,
    Linear,
    Cosine,
}

impl Kernel {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Gaussian => "gaussian",
            Kernel::Tophat => "tophat",
            Kernel::Epanechnikov => "epanechnikov",
            Kernel::Exponential => "exponential",
            Kernel::Linear => "linear",
            Kernel::Cosine => "cosine",
        }
    }

    /// Kernel value at `distance` for bandwidth `h`.
    #[must_use]
    pub fn evaluate(&self, distance: f64, h: f64) -> f64 {
        let u = distance / h;
        match self {
            Kernel::Gaussian => (-0.5 * u * u).exp() / (2.0 * PI).sqrt(),
            Kernel::Tophat => {
                if u < 1.0 {
                    0.5
                } else {
                    0.0
                }
            }
            Kernel::Epanechnikov => {
                if u < 1.0 {
                    0.75 * (1.0 - u * u)
                } else {
                    0.0
                }
            }
            Kernel::Exponential => 0.5 * (-u).exp(),
            Kernel::Linear => (1.0 - u).max(0.0),
            Kernel::Cosine => {
                if u < 1.0 {
                    FRAC_PI_4 * (FRAC_PI_2 * u).cos()
                } else {
                    0.0
                }
            }
        }
    }
}

impl FromStr for Kernel {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(Kernel::Gaussian),
            "tophat" => Ok(Kernel::Tophat),
            "epanechnikov" => Ok(Kernel::Epanechnikov),
            "exponential" => Ok(Kernel::Exponential),
            "linear" => Ok(Kernel::Linear),
            "cosine" => Ok(Kernel::Cosine),
            _ => Err(Error::UnknownKernel(name.to_string())),
        }
    }
}
