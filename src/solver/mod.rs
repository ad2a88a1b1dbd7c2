//! Nonlinear magnetic circuit solver.
//!
//! This module provides the numerical engine for the magnetostatic solve.
//!
//! ## Modified Nodal Analysis
//!
//! Each Newton pass assembles a system `J·dx = b` where:
//! - x contains node magnetic potentials and MMF-source branch fluxes
//! - J is the permeance matrix built from differential permeances
//! - b is the residual of the current estimate
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ u   ]   [ phi ]
//! [ C   0 ] [ phi ] = [ mmf ]
//! ```
//!
//! where:
//! - G is the permeance matrix (flux balance at each node)
//! - B, C connect MMF sources to nodes
//! - u is the vector of node potentials
//! - phi (unknown) is the vector of MMF-source branch fluxes
//! - phi (right-hand side) is the sum of flux sources into each node
//! - mmf is the vector of MMF source values
//!
//! The residual is formed with operating-point permeances while J uses the
//! differential ones, so each pass is a quasi-Newton step: its convergence
//! rate depends on how well `µr_d` approximates the true derivative of the
//! flux through each saturable branch.

mod mna;
mod newton;

pub use mna::{assemble, update_operating_points, MnaMatrix};
pub use newton::{solve, NewtonSolver, Solution, SolveStatus, SolverConfig};

/// Convergence tolerance on the increment norm relative to the first increment.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-3;

/// Maximum number of Newton passes before giving up.
pub const MAX_ITERATIONS: usize = 2000;

/// Smallest pivot accepted by the LU factorization.
pub const MIN_PIVOT: f64 = 1e-20;
