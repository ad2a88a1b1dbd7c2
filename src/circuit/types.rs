//! Core types for circuit representation.

use std::fmt;

/// External name of the reference (ground) node.
pub const GROUND_NAME: &str = "0";

/// A unique identifier for a node in the circuit.
/// Node 0 is always ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The ground node (always index 0).
    pub const GROUND: NodeId = NodeId(0);

    /// Check if this is the ground node.
    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }

    /// Magnetic potential of this node in a solution vector.
    /// Ground is fixed at zero and is not stored in `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x` is shorter than this node's index, i.e. when the node
    /// does not belong to the circuit `x` was solved for.
    pub fn potential(&self, x: &[f64]) -> f64 {
        if self.is_ground() {
            0.0
        } else {
            x[VarIndex::Potential(*self).to_index(0)]
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "N{}", self.0)
        }
    }
}

/// Index of an auxiliary unknown (the flux through an MMF source).
///
/// Branches are numbered in the order their MMF sources were added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchId(pub usize);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PHI{}", self.0)
    }
}

/// Variable index in the solution vector.
/// Can be either a node potential or an MMF-source branch flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarIndex {
    /// Node magnetic potential
    Potential(NodeId),
    /// Flux through an MMF source
    Flux(BranchId),
}

impl VarIndex {
    /// Get the raw index into the solution vector.
    /// Node potentials come first (excluding ground), then branch fluxes.
    pub fn to_index(&self, num_nodes: usize) -> usize {
        match self {
            VarIndex::Potential(NodeId(n)) => {
                debug_assert!(*n > 0, "Ground node should not be in solution vector");
                n - 1
            }
            VarIndex::Flux(BranchId(b)) => (num_nodes - 1) + b,
        }
    }
}
