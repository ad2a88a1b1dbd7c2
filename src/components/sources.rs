//! MMF and flux sources.

use crate::circuit::{BranchId, NodeId};

/// A magnetomotive-force source component.
///
/// MMF sources require an extra row/column in the MNA matrix for the
/// branch flux. The source enforces: U[n1] - U[n2] = MMF
#[derive(Debug, Clone)]
pub struct MmfSource {
    pub name: String,
    pub nodes: [NodeId; 2],
    pub value: f64,
    pub branch: BranchId,
}

impl MmfSource {
    /// Create a new MMF source.
    pub fn new(name: String, nodes: [NodeId; 2], value: f64, branch: BranchId) -> Self {
        Self {
            name,
            nodes,
            value,
            branch,
        }
    }

    /// Get the source MMF (A).
    pub fn mmf(&self) -> f64 {
        self.value
    }
}

/// A flux source component.
///
/// Flux sources add directly to the RHS vector of the MNA equations:
/// the source delivers `value` into `n1` and draws it from `n2`.
#[derive(Debug, Clone)]
pub struct PhiSource {
    pub name: String,
    pub nodes: [NodeId; 2],
    pub value: f64,
}

impl PhiSource {
    /// Create a new flux source.
    pub fn new(name: String, nodes: [NodeId; 2], value: f64) -> Self {
        Self { name, nodes, value }
    }

    /// Get the injected flux (Wb).
    pub fn flux(&self) -> f64 {
        self.value
    }

    /// Flux through the source measured from `n1` to `n2`.
    ///
    /// The source pushes flux into `n1`, so inside the source it travels from
    /// `n2` to `n1`.
    pub fn branch_flux(&self) -> f64 {
        -self.value
    }
}
