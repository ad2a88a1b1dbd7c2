//! Material models for saturable flux paths.
//!
//! A material model maps field strength H to the relative permeability used
//! by a permeance at its operating point, and to the differential
//! permeability used as its Jacobian coefficient. Models are registered on a
//! [`Circuit`](crate::Circuit) under a label and referenced by permeances
//! through that label.

mod bh;
pub mod spline;

pub use bh::{BhModel, HysteresisCoefficients, EXTRAPOLATION_POINTS};

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::EmcError;

/// Kinds of material model a circuit can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Tabulated B-H curve
    Bh,
}

impl FromStr for ModelKind {
    type Err = EmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("bh") {
            Ok(ModelKind::Bh)
        } else {
            Err(EmcError::UnknownModelKind {
                kind: s.to_string(),
            })
        }
    }
}

/// Parameters for instantiating a model from disk.
#[derive(Debug, Clone, Default)]
pub struct ModelParams {
    /// Path to the tab-separated `H\tB` table
    pub path: PathBuf,
    /// Loss coefficients stored alongside the curve
    pub coefficients: HysteresisCoefficients,
}

impl ModelParams {
    /// Create parameters for the table at `path` with zero loss coefficients.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            coefficients: HysteresisCoefficients::default(),
        }
    }

    /// Set the hysteresis and eddy-current loss coefficients.
    pub fn with_coefficients(mut self, kh: f64, ke: f64) -> Self {
        self.coefficients = HysteresisCoefficients { kh, ke };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("BH".parse::<ModelKind>().unwrap(), ModelKind::Bh);
        assert_eq!("bh".parse::<ModelKind>().unwrap(), ModelKind::Bh);
        assert!(matches!(
            "ekv".parse::<ModelKind>(),
            Err(EmcError::UnknownModelKind { .. })
        ));
    }
}
