//! Natural cubic spline interpolation.

use crate::error::{EmcError, Result};

/// Piecewise cubic interpolant with zero curvature at both end knots.
///
/// Segment `i` covers `[xs[i], xs[i + 1]]` and is stored as
/// `y = a + b·t + c·t² + d·t³` with `t = x - xs[i]`. Outside the knot range
/// the first or last segment polynomial is continued.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural cubic spline through `(xs[i], ys[i])`.
    ///
    /// `xs` must be strictly ascending with at least two knots.
    pub fn natural(xs: &[f64], ys: &[f64]) -> Result<Self> {
        let n = xs.len();
        if n != ys.len() {
            return Err(EmcError::invalid_bh(format!(
                "{} abscissae but {} ordinates",
                n,
                ys.len()
            )));
        }
        if n < 2 {
            return Err(EmcError::invalid_bh(format!(
                "at least 2 samples are required, got {}",
                n
            )));
        }
        if let Some(i) = (1..n).find(|&i| !(xs[i] > xs[i - 1])) {
            return Err(EmcError::invalid_bh(format!(
                "H must be strictly ascending (sample {} = {} after {})",
                i, xs[i], xs[i - 1]
            )));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(EmcError::invalid_bh("samples must be finite"));
        }

        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

        // Second derivatives m[i]; m[0] = m[n-1] = 0 for the natural end condition.
        // Interior equations form a symmetric tridiagonal system solved by the
        // Thomas algorithm.
        let mut m = vec![0.0; n];
        if n > 2 {
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for j in 0..k {
                let i = j + 1;
                diag[j] = 2.0 * (h[i - 1] + h[i]);
                rhs[j] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
            }

            // Forward sweep; the off-diagonal between rows j-1 and j is h[j]
            for j in 1..k {
                let factor = h[j] / diag[j - 1];
                diag[j] -= factor * h[j];
                rhs[j] -= factor * rhs[j - 1];
            }

            // Back substitution
            m[k] = rhs[k - 1] / diag[k - 1];
            for j in (0..k - 1).rev() {
                m[j + 1] = (rhs[j] - h[j + 1] * m[j + 2]) / diag[j];
            }
        }

        let segments = n - 1;
        let mut a = Vec::with_capacity(segments);
        let mut b = Vec::with_capacity(segments);
        let mut c = Vec::with_capacity(segments);
        let mut d = Vec::with_capacity(segments);
        for i in 0..segments {
            a.push(ys[i]);
            b.push((ys[i + 1] - ys[i]) / h[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0);
            c.push(m[i] / 2.0);
            d.push((m[i + 1] - m[i]) / (6.0 * h[i]));
        }

        Ok(Self {
            xs: xs.to_vec(),
            a,
            b,
            c,
            d,
        })
    }

    /// Evaluate the spline at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let i = self.segment(x);
        let t = x - self.xs[i];
        self.a[i] + t * (self.b[i] + t * (self.c[i] + t * self.d[i]))
    }

    /// First derivative at `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        let i = self.segment(x);
        let t = x - self.xs[i];
        self.b[i] + t * (2.0 * self.c[i] + 3.0 * t * self.d[i])
    }

    /// Second derivative at `x`; zero at both end knots.
    pub fn second_derivative(&self, x: f64) -> f64 {
        let i = self.segment(x);
        let t = x - self.xs[i];
        2.0 * self.c[i] + 6.0 * t * self.d[i]
    }

    /// Knot abscissae.
    pub fn knots(&self) -> &[f64] {
        &self.xs
    }

    fn segment(&self, x: f64) -> usize {
        let last = self.a.len() - 1;
        // Number of knots <= x, minus one, clamped to a valid segment
        self.xs.partition_point(|&k| k <= x).saturating_sub(1).min(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reproduces_knots() {
        let xs = [0.0, 1.0, 2.5, 4.0, 7.0];
        let ys = [0.0, 0.8, 1.1, 1.3, 1.35];
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert_relative_eq!(s.eval(x), y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_data_is_exact() {
        let xs = [0.0, 1.0, 3.0, 10.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let s = CubicSpline::natural(&xs, &ys).unwrap();

        assert_relative_eq!(s.eval(2.0), 5.0, epsilon = 1e-12);
        assert_relative_eq!(s.eval(6.5), 14.0, epsilon = 1e-12);
        // Extrapolation continues the end segments
        assert_relative_eq!(s.eval(-1.0), -1.0, epsilon = 1e-12);
        assert_relative_eq!(s.eval(20.0), 41.0, epsilon = 1e-12);
        assert_relative_eq!(s.derivative(4.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_points_is_a_line() {
        let s = CubicSpline::natural(&[1.0, 3.0], &[2.0, 6.0]).unwrap();
        assert_relative_eq!(s.eval(2.0), 4.0, epsilon = 1e-12);
        assert_relative_eq!(s.eval(5.0), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_natural_end_condition() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 0.0, 1.0];
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        assert!(s.second_derivative(0.0).abs() < 1e-12);
        assert!(s.second_derivative(3.0).abs() < 1e-12);
        // Interior knots carry the curvature: m1 = -4, m2 = 4 for this data
        assert_relative_eq!(s.second_derivative(1.0), -4.0, epsilon = 1e-12);
        assert_relative_eq!(s.second_derivative(2.0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_knots() {
        assert!(CubicSpline::natural(&[1.0], &[1.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 1.0], &[0.0]).is_err());
    }
}
