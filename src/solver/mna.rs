//! MNA matrix assembly and solving.

use crate::circuit::{Circuit, ModelRegistry};
use crate::components::Element;
use crate::error::{EmcError, Result};

use super::MIN_PIVOT;

/// Linearized system for one Newton pass.
///
/// Holds two coefficient matrices of the same shape: `a_op`, assembled with
/// each permeance's operating-point permeance, and `a`, assembled with the
/// differential permeance. `a` is the matrix that gets factored; `a_op` is
/// only used to form the residual `z - a_op · x`.
#[derive(Debug)]
pub struct MnaMatrix {
    /// Differential (Jacobian) matrix, row-major
    pub a: Vec<f64>,
    /// Operating-point matrix, row-major
    pub a_op: Vec<f64>,
    /// Source vector z, replaced by the residual after [`apply_residual`](Self::apply_residual)
    pub z: Vec<f64>,
    /// Solution of `a · x = z`
    pub x: Vec<f64>,
    /// Matrix dimension
    pub size: usize,
    /// LU decomposition of `a`
    pub lu: Vec<f64>,
    /// Pivot indices for LU decomposition
    pub pivots: Vec<usize>,
}

impl MnaMatrix {
    /// Create a zeroed system of the given dimension.
    pub fn new(size: usize) -> Self {
        Self {
            a: vec![0.0; size * size],
            a_op: vec![0.0; size * size],
            z: vec![0.0; size],
            x: vec![0.0; size],
            size,
            lu: vec![0.0; size * size],
            pivots: vec![0; size],
        }
    }

    /// Get differential matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.a[row * self.size + col]
    }

    /// Get operating-point matrix element at (row, col).
    pub fn get_op(&self, row: usize, col: usize) -> f64 {
        self.a_op[row * self.size + col]
    }

    /// Add to both matrices at (row, col).
    fn add(&mut self, row: usize, col: usize, op: f64, diff: f64) {
        let idx = row * self.size + col;
        self.a_op[idx] += op;
        self.a[idx] += diff;
    }

    /// Stamp a permeance between two nodes.
    /// For permeance P (differential dP) between nodes n1 and n2:
    ///   A[n1,n1] += P
    ///   A[n2,n2] += P
    ///   A[n1,n2] -= P
    ///   A[n2,n1] -= P
    pub fn stamp_permeance(&mut self, n1: Option<usize>, n2: Option<usize>, p: f64, dp: f64) {
        if let Some(i) = n1 {
            self.add(i, i, p, dp);
        }
        if let Some(j) = n2 {
            self.add(j, j, p, dp);
        }
        if let (Some(i), Some(j)) = (n1, n2) {
            self.add(i, j, -p, -dp);
            self.add(j, i, -p, -dp);
        }
    }

    /// Stamp an MMF source between two nodes with branch flux at index br.
    /// U[n1] - U[n2] = MMF
    pub fn stamp_mmf_source(&mut self, n1: Option<usize>, n2: Option<usize>, br: usize, mmf: f64) {
        if let Some(i) = n1 {
            // Flux balance at n1 and driving law
            self.add(i, br, 1.0, 1.0);
            self.add(br, i, 1.0, 1.0);
        }
        if let Some(j) = n2 {
            self.add(j, br, -1.0, -1.0);
            self.add(br, j, -1.0, -1.0);
        }
        self.z[br] = mmf;
    }

    /// Stamp a flux source delivering `phi` into n1 and drawing it from n2.
    pub fn stamp_flux_source(&mut self, n1: Option<usize>, n2: Option<usize>, phi: f64) {
        if let Some(i) = n1 {
            self.z[i] += phi;
        }
        if let Some(j) = n2 {
            self.z[j] -= phi;
        }
    }

    /// Replace the source vector by the residual `z - a_op · x`.
    pub fn apply_residual(&mut self, x: &[f64]) {
        let n = self.size;
        for i in 0..n {
            let row = &self.a_op[i * n..(i + 1) * n];
            let ax: f64 = row.iter().zip(x).map(|(a, x)| a * x).sum();
            self.z[i] -= ax;
        }
    }

    /// Perform LU decomposition of the differential matrix with partial pivoting.
    pub fn factor(&mut self) -> Result<()> {
        let n = self.size;
        self.lu.copy_from_slice(&self.a);

        for i in 0..n {
            self.pivots[i] = i;
        }

        for k in 0..n {
            // Find pivot
            let mut max_val = self.lu[k * n + k].abs();
            let mut max_row = k;

            for i in (k + 1)..n {
                let val = self.lu[i * n + k].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if max_val < MIN_PIVOT {
                return Err(EmcError::SingularMatrix);
            }

            // Swap rows if needed
            if max_row != k {
                self.pivots.swap(k, max_row);
                for j in 0..n {
                    self.lu.swap(k * n + j, max_row * n + j);
                }
            }

            // Eliminate
            let pivot = self.lu[k * n + k];
            for i in (k + 1)..n {
                let factor = self.lu[i * n + k] / pivot;
                self.lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    self.lu[i * n + j] -= factor * self.lu[k * n + j];
                }
            }
        }

        Ok(())
    }

    /// Solve the system using the pre-computed LU decomposition.
    pub fn solve(&mut self) -> Result<()> {
        let n = self.size;

        // Apply pivot permutation to z
        for i in 0..n {
            self.x[i] = self.z[self.pivots[i]];
        }

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                self.x[i] -= self.lu[i * n + j] * self.x[j];
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                self.x[i] -= self.lu[i * n + j] * self.x[j];
            }
            let diag = self.lu[i * n + i];
            if diag.abs() < MIN_PIVOT {
                return Err(EmcError::SingularMatrix);
            }
            self.x[i] /= diag;
        }

        Ok(())
    }
}

/// Refresh `mur`/`mur_d` of every model-bound permeance at the potentials `x`.
pub fn update_operating_points(
    elements: &mut [Element],
    models: &ModelRegistry,
    x: &[f64],
) -> Result<()> {
    for element in elements.iter_mut() {
        if let Element::Permeance(p) = element {
            if let Some(label) = &p.model {
                let model = models.get(label).ok_or_else(|| EmcError::UndefinedModel {
                    model: label.clone(),
                    element: p.name.clone(),
                })?;
                p.update_operating_point(model, x);
            }
        }
    }
    Ok(())
}

/// Assemble the linearized system around the estimate `x`.
///
/// Operating points are refreshed first, then every element is stamped and
/// the source vector is turned into the residual of `x`. The returned matrix
/// has not been factored yet.
pub fn assemble(circuit: &mut Circuit, x: &[f64]) -> Result<MnaMatrix> {
    {
        let (elements, models) = circuit.elements_and_models_mut();
        update_operating_points(elements, models, x)?;
    }

    let mut matrix = MnaMatrix::new(circuit.matrix_size());
    for element in circuit.elements() {
        let [n1, n2] = element.nodes();
        let (i, j) = (circuit.node_index(n1), circuit.node_index(n2));
        match element {
            Element::Permeance(p) => {
                matrix.stamp_permeance(i, j, p.permeance(), p.differential_permeance());
            }
            Element::MmfSource(v) => {
                let br = circuit.branch_index(v.branch);
                matrix.stamp_mmf_source(i, j, br, v.mmf());
            }
            Element::PhiSource(f) => {
                matrix.stamp_flux_source(i, j, f.flux());
            }
        }
    }

    matrix.apply_residual(x);
    Ok(matrix)
}
