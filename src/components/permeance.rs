//! Permeance element: the magnetic analogue of a conductance.

use crate::circuit::NodeId;
use crate::material::BhModel;
use crate::{MILLIMETER, MU0};

/// A permeance branch with rectangular cross-section.
///
/// Geometry is given in millimetres: the cross-section is `width × depth`
/// and the flux path has length `length`. The permeance is
/// `P = µ0 · µr · A / l` evaluated in SI units.
///
/// When `model` is set, `mur` and `mur_d` are operating-point values that the
/// solver refreshes from the named B-H model on every pass. Without a model
/// they stay at the constant supplied on construction.
#[derive(Debug, Clone)]
pub struct Permeance {
    pub name: String,
    pub nodes: [NodeId; 2],
    /// Relative permeability at the operating point
    pub mur: f64,
    /// Differential (incremental) relative permeability at the operating point
    pub mur_d: f64,
    /// Cross-section width (mm)
    pub width: f64,
    /// Cross-section depth (mm)
    pub depth: f64,
    /// Magnetic path length (mm)
    pub length: f64,
    /// Label of the B-H model in the circuit registry
    pub model: Option<String>,
}

impl Permeance {
    /// Create a new permeance. The differential permeability starts equal to `mur`.
    pub fn new(
        name: String,
        nodes: [NodeId; 2],
        mur: f64,
        width: f64,
        depth: f64,
        length: f64,
        model: Option<String>,
    ) -> Self {
        Self {
            name,
            nodes,
            mur,
            mur_d: mur,
            width,
            depth,
            length,
            model,
        }
    }

    /// Whether the permeability follows a saturation curve.
    pub fn is_nonlinear(&self) -> bool {
        self.model.is_some()
    }

    /// Geometric factor `A / l` in metres.
    fn shape_factor(&self) -> f64 {
        (self.width * MILLIMETER) * (self.depth * MILLIMETER) / (self.length * MILLIMETER)
    }

    /// Permeance at the operating point (Wb/A).
    pub fn permeance(&self) -> f64 {
        MU0 * self.mur * self.shape_factor()
    }

    /// Differential permeance, the Jacobian coefficient of this branch.
    pub fn differential_permeance(&self) -> f64 {
        MU0 * self.mur_d * self.shape_factor()
    }

    /// Magnetomotive-force drop from `n1` to `n2`.
    pub fn mmf(&self, x: &[f64]) -> f64 {
        self.nodes[0].potential(x) - self.nodes[1].potential(x)
    }

    /// Flux from `n1` to `n2` (Wb).
    pub fn flux(&self, x: &[f64]) -> f64 {
        self.mmf(x) * self.permeance()
    }

    /// Field strength along the path (A/m).
    pub fn field_strength(&self, x: &[f64]) -> f64 {
        self.mmf(x) / (self.length * MILLIMETER)
    }

    /// Flux density in the cross-section (T).
    pub fn flux_density(&self, x: &[f64]) -> f64 {
        MU0 * self.mur * self.field_strength(x)
    }

    /// Re-evaluate `mur` and `mur_d` from `model` at the field magnitude implied by `x`.
    pub fn update_operating_point(&mut self, model: &BhModel, x: &[f64]) {
        let h = self.field_strength(x).abs();
        self.mur = model.mur(h);
        self.mur_d = model.mur_d(h);
    }
}
