//! # EMC Core
//!
//! A nonlinear magnetic equivalent circuit solver.
//!
//! This library provides:
//! - A circuit graph of permeances, MMF sources and flux sources
//! - Saturable materials described by measured B-H curves
//! - Modified Nodal Analysis (MNA) assembly of the magnetic network
//! - A damped Newton iteration for the nonlinear operating point
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Circuit graph representation and validation
//! - [`components`] - Element models (permeance, MMF source, flux source)
//! - [`material`] - B-H curve fitting and permeability evaluation
//! - [`solver`] - MNA matrix assembly and Newton iteration
//!
//! ## Usage
//!
//! ```no_run
//! use emc_core::{solve, Circuit, ModelParams};
//!
//! # fn main() -> emc_core::Result<()> {
//! let mut circ = Circuit::new("EMC");
//! circ.add_model("BH", "35PN210", ModelParams::new("35PN210.tab"))?;
//! circ.add_mmf_source("MMF1", "n1", "0", 10000.0)?;
//! circ.add_permeance("Rc", "n1", "n2", 3000.0, 10.0, 10.0, 120.0, Some("35PN210"))?;
//! circ.add_permeance("Rg", "n2", "0", 1.0, 10.0, 10.0, 1.0, None)?;
//!
//! let solution = solve(&mut circ, 1.0)?;
//! let gap = circ.get_element("Rg")?.as_permeance().unwrap();
//! println!("airgap flux density: {}", gap.flux_density(&solution.x));
//! # Ok(())
//! # }
//! ```
//!
//! ## Units
//!
//! Permeance geometry is given in millimetres, MMF in ampere-turns, flux in
//! webers, field strength in A/m and flux density in tesla.

pub mod circuit;
pub mod components;
pub mod error;
pub mod material;
pub mod solver;

// Re-export main types for convenience
pub use circuit::Circuit;
pub use error::{EmcError, Result};
pub use material::{BhModel, HysteresisCoefficients, ModelParams};
pub use solver::{solve, NewtonSolver, Solution, SolveStatus, SolverConfig};

/// Vacuum permeability µ0 in H/m
pub const MU0: f64 = 4.0e-7 * std::f64::consts::PI;

/// One millimetre in metres, the length unit of permeance geometry
pub const MILLIMETER: f64 = 1e-3;
