//! Damped Newton iteration over the magnetic circuit.

use tracing::{debug, info, warn};

use super::mna::{assemble, update_operating_points};
use super::{CONVERGENCE_TOLERANCE, MAX_ITERATIONS};
use crate::circuit::{validate_circuit, Circuit, NodeId};
use crate::error::{EmcError, Result};

/// Configuration for the Newton solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Relaxation factor applied to every increment after the first, in (0, 1].
    pub relaxation: f64,
    /// Convergence tolerance on the relative increment norm.
    pub tolerance: f64,
    /// Maximum number of passes.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            relaxation: 1.0,
            tolerance: CONVERGENCE_TOLERANCE,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relaxation factor.
    ///
    /// Values below 1 damp each update and help with strongly saturated cores.
    pub fn with_relaxation(mut self, relaxation: f64) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximum number of passes.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.relaxation > 0.0 && self.relaxation <= 1.0) {
            return Err(EmcError::InvalidSimulationParam {
                message: format!("relaxation must be in (0, 1], got {}", self.relaxation),
            });
        }
        if !(self.tolerance > 0.0) {
            return Err(EmcError::InvalidSimulationParam {
                message: format!("tolerance must be positive, got {}", self.tolerance),
            });
        }
        if self.max_iterations == 0 {
            return Err(EmcError::InvalidSimulationParam {
                message: "max_iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// How the iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The relative increment fell below the tolerance.
    Converged,
    /// The pass budget ran out; the last iterate is returned.
    Exhausted,
}

/// Result of a solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Node potentials followed by MMF-source branch fluxes
    pub x: Vec<f64>,
    /// Whether the tolerance was met or the pass budget ran out
    pub status: SolveStatus,
    /// Number of passes performed
    pub iterations: usize,
    /// Relative increment norm of the last pass
    pub error: f64,
}

impl Solution {
    /// Check if the solve met its tolerance.
    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// Magnetic potential of a node (zero for ground).
    pub fn potential(&self, node: NodeId) -> f64 {
        node.potential(&self.x)
    }
}

/// Newton solver for nonlinear magnetic circuits.
#[derive(Debug, Clone, Default)]
pub struct NewtonSolver {
    config: SolverConfig,
}

impl NewtonSolver {
    /// Create a new solver.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the circuit starting from all-zero potentials.
    ///
    /// The first increment is taken in full; later increments are scaled by
    /// the relaxation factor. Iteration stops once `|dx| / |dx_first|` drops
    /// below the tolerance, or after `max_iterations` passes have been
    /// exceeded, in which case the last iterate is returned with
    /// [`SolveStatus::Exhausted`].
    ///
    /// On return, every model-bound permeance holds the permeability of the
    /// returned potentials.
    pub fn solve(&self, circuit: &mut Circuit) -> Result<Solution> {
        self.config.validate()?;
        validate_circuit(circuit)?;

        let gamma = self.config.relaxation;
        let mut x = vec![0.0; circuit.matrix_size()];
        let mut first_norm = 0.0;
        let mut iterations = 0usize;

        let (status, error) = loop {
            let mut matrix = assemble(circuit, &x)?;
            matrix.factor()?;
            matrix.solve()?;
            let dx = &matrix.x;
            let norm = dx.iter().map(|v| v * v).sum::<f64>().sqrt();

            if iterations == 0 {
                x.copy_from_slice(dx);
                first_norm = norm;
            } else {
                for (xi, dxi) in x.iter_mut().zip(dx) {
                    *xi += gamma * dxi;
                }
            }
            iterations += 1;

            // A zero first increment means x = 0 already solves the circuit
            let error = if first_norm > 0.0 { norm / first_norm } else { 0.0 };
            debug!(iteration = iterations, error, "newton pass");

            if error < self.config.tolerance {
                break (SolveStatus::Converged, error);
            }
            if iterations > self.config.max_iterations {
                break (SolveStatus::Exhausted, error);
            }
        };

        let (elements, models) = circuit.elements_and_models_mut();
        update_operating_points(elements, models, &x)?;

        match status {
            SolveStatus::Converged => info!(iterations, error, "circuit solved"),
            SolveStatus::Exhausted => warn!(
                iterations,
                error, "iteration budget exhausted, returning last iterate"
            ),
        }

        Ok(Solution {
            x,
            status,
            iterations,
            error,
        })
    }
}

/// Solve `circuit` with the given relaxation factor and default tolerances.
pub fn solve(circuit: &mut Circuit, relaxation: f64) -> Result<Solution> {
    NewtonSolver::new(SolverConfig::new().with_relaxation(relaxation)).solve(circuit)
}
