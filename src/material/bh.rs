//! Saturable material model fitted to a measured B-H curve.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::spline::CubicSpline;
use crate::error::{EmcError, Result};
use crate::MU0;

/// Number of synthetic samples appended past the last measured point.
pub const EXTRAPOLATION_POINTS: usize = 50;

/// Step of the forward difference used for `dµ/dH` (A/m).
const DERIVATIVE_STEP: f64 = 1e-3;

/// Factor applied to the second permeability sample to replace the first one.
const ORIGIN_PERMEABILITY_FACTOR: f64 = 1.05;

/// Iron-loss coefficients carried with a material table.
///
/// They are stored with the model for loss post-processing and do not take
/// part in the magnetostatic solve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HysteresisCoefficients {
    /// Hysteresis loss coefficient
    pub kh: f64,
    /// Eddy-current loss coefficient
    pub ke: f64,
}

/// A nonlinear B-H material model.
///
/// Two interpolants are fitted once on construction:
/// - `B(H)`, a natural cubic spline through the measured table extended by
///   [`EXTRAPOLATION_POINTS`] samples of slope µ0 beyond the last point;
/// - `µ(H) = B/H`, a natural cubic spline through the same abscissae, whose
///   first sample is replaced by `1.05 ×` the second one since `B/H` is
///   unreliable at the origin.
///
/// The model is immutable and can be shared between circuits.
#[derive(Debug, Clone)]
pub struct BhModel {
    hb: CubicSpline,
    hu: CubicSpline,
    coefficients: HysteresisCoefficients,
}

impl BhModel {
    /// Build a model from `(H, B)` samples with H strictly ascending.
    pub fn from_points(
        points: Vec<(f64, f64)>,
        coefficients: HysteresisCoefficients,
    ) -> Result<Self> {
        let (h_max, b_max) = match points.last() {
            Some(&last) if points.len() >= 2 => last,
            _ => {
                return Err(EmcError::invalid_bh(format!(
                    "at least 2 samples are required, got {}",
                    points.len()
                )))
            }
        };

        let mut samples = points;
        samples.reserve(EXTRAPOLATION_POINTS);
        for i in 0..EXTRAPOLATION_POINTS {
            let h_ex = h_max * (2.0 + i as f64 * 10_000.0);
            let b_ex = b_max + MU0 * (h_ex - h_max);
            samples.push((h_ex, b_ex));
        }

        let hs: Vec<f64> = samples.iter().map(|&(h, _)| h).collect();
        let bs: Vec<f64> = samples.iter().map(|&(_, b)| b).collect();
        let hb = CubicSpline::natural(&hs, &bs)?;

        let mut us: Vec<f64> = samples
            .iter()
            .map(|&(h, b)| if b == 0.0 { 0.0 } else { b / h })
            .collect();
        us[0] = us[1] * ORIGIN_PERMEABILITY_FACTOR;
        let hu = CubicSpline::natural(&hs, &us)?;

        Ok(Self {
            hb,
            hu,
            coefficients,
        })
    }

    /// Load a model from a tab-separated `H\tB` table.
    pub fn from_reader<R: BufRead>(
        reader: R,
        coefficients: HysteresisCoefficients,
    ) -> Result<Self> {
        let mut points = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| EmcError::malformed(line_no, e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split('\t');
            let h = parse_field(fields.next(), "H", line_no)?;
            let b = parse_field(fields.next(), "B", line_no)?;
            points.push((h, b));
        }

        Self::from_points(points, coefficients)
    }

    /// Load a model from a B-H table file.
    pub fn from_file(
        path: impl AsRef<Path>,
        coefficients: HysteresisCoefficients,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EmcError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let model = Self::from_reader(BufReader::new(file), coefficients)?;
        debug!(path = %path.display(), "loaded B-H table");
        Ok(model)
    }

    /// Flux density on the fitted curve (T).
    pub fn b(&self, h: f64) -> f64 {
        self.hb.eval(h)
    }

    /// Relative permeability `B(H) / (µ0 H)`.
    ///
    /// A non-positive field falls back to the curve value at `H = 1 A/m`.
    pub fn mur(&self, h: f64) -> f64 {
        if h > 0.0 {
            self.hb.eval(h) / h / MU0
        } else {
            self.hb.eval(1.0) / MU0
        }
    }

    /// Differential relative permeability, approximately `dB/dH / µ0`.
    ///
    /// Computed as `µr + H · (dµ/dH) / µ0` with `dµ/dH` a forward difference on
    /// the permeability curve.
    pub fn mur_d(&self, h: f64) -> f64 {
        let du_dh = (self.hu.eval(h + DERIVATIVE_STEP) - self.hu.eval(h)) / DERIVATIVE_STEP;
        self.mur(h) + h * du_dh / MU0
    }

    /// Loss coefficients supplied with the table.
    pub fn coefficients(&self) -> HysteresisCoefficients {
        self.coefficients
    }

    /// Number of samples behind the interpolants, extrapolation included.
    pub fn sample_count(&self) -> usize {
        self.hb.knots().len()
    }
}

fn parse_field(field: Option<&str>, name: &str, line: usize) -> Result<f64> {
    let text = field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EmcError::malformed(line, format!("missing {} column", name)))?;
    text.parse::<f64>()
        .map_err(|_| EmcError::malformed(line, format!("invalid {} value '{}'", name, text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    /// Saturating table: B = 1.6 (1 - exp(-H/300)) + µ0 H
    fn steel_points() -> Vec<(f64, f64)> {
        [0.0, 25.0, 50.0, 100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0, 12800.0]
            .iter()
            .map(|&h| (h, 1.6 * (1.0 - (-h / 300.0_f64).exp()) + MU0 * h))
            .collect()
    }

    fn steel() -> BhModel {
        BhModel::from_points(steel_points(), HysteresisCoefficients::default()).unwrap()
    }

    #[test]
    fn test_mur_reproduces_table_entries() {
        let model = steel();
        for &(h, b) in steel_points().iter().skip(1) {
            assert_relative_eq!(model.mur(h), b / h / MU0, max_relative = 1e-9);
            assert_relative_eq!(model.b(h), b, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_mur_at_zero_uses_unit_field() {
        let model = steel();
        let mur0 = model.mur(0.0);
        assert!(mur0.is_finite());
        assert_relative_eq!(mur0, model.b(1.0) / MU0, max_relative = 1e-12);
        assert_relative_eq!(model.mur(-5.0), mur0, max_relative = 1e-12);
        assert!(model.mur_d(0.0).is_finite());
    }

    #[test]
    fn test_extrapolation_points() {
        let model = steel();
        assert_eq!(model.sample_count(), steel_points().len() + EXTRAPOLATION_POINTS);

        // Far beyond the table the curve has slope µ0
        let (h_max, b_max) = *steel_points().last().unwrap();
        let h = h_max * 20_002.0;
        assert_relative_eq!(model.b(h), b_max + MU0 * (h - h_max), max_relative = 1e-9);
    }

    #[test]
    fn test_saturation_lowers_permeability() {
        let model = steel();
        let low = model.mur(100.0);
        let high = model.mur(6400.0);
        assert!(high < low);
        // In saturation the tangent slope is below the secant slope
        assert!(model.mur_d(3200.0) < model.mur(3200.0));
        assert!(model.mur_d(3200.0) > 0.0);
    }

    #[test]
    fn test_mur_d_tracks_curve_slope() {
        // Densely sampled table so interpolation error stays small
        let points: Vec<(f64, f64)> = (0..=100)
            .map(|i| {
                let h = i as f64 * 20.0;
                (h, 1.6 * (1.0 - (-h / 300.0_f64).exp()) + MU0 * h)
            })
            .collect();
        let model = BhModel::from_points(points, HysteresisCoefficients::default()).unwrap();

        for h in [200.0, 400.0, 900.0] {
            let slope = (1.6 / 300.0 * (-h / 300.0_f64).exp() + MU0) / MU0;
            assert_relative_eq!(model.mur_d(h), slope, max_relative = 0.01);
        }
    }

    #[test]
    fn test_from_reader() {
        let table = "0\t0\n100\t0.5\n\n200\t0.9\n400\t1.2\n";
        let model = BhModel::from_reader(Cursor::new(table), HysteresisCoefficients::default())
            .unwrap();
        assert_relative_eq!(model.mur(200.0), 0.9 / 200.0 / MU0, max_relative = 1e-9);
    }

    #[test]
    fn test_from_file_keeps_coefficients() {
        let path = std::env::temp_dir().join(format!("emc_bh_{}.tab", std::process::id()));
        std::fs::write(&path, "0\t0\n100\t0.5\n200\t0.9\n").unwrap();

        let coefficients = HysteresisCoefficients { kh: 0.02, ke: 5e-5 };
        let model = BhModel::from_file(&path, coefficients).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(model.coefficients(), coefficients);
        assert_relative_eq!(model.b(100.0), 0.5, max_relative = 1e-9);
    }

    #[test]
    fn test_missing_file() {
        let err = BhModel::from_file("/nonexistent/35PN210.tab", HysteresisCoefficients::default())
            .unwrap_err();
        assert!(matches!(err, EmcError::FileReadError { .. }));
    }

    #[test]
    fn test_malformed_rows() {
        let err = BhModel::from_reader(
            Cursor::new("0\t0\n100\tabc\n"),
            HysteresisCoefficients::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EmcError::MalformedData { line: 2, .. }));

        let err = BhModel::from_reader(Cursor::new("0\t0\n100\n"), HysteresisCoefficients::default())
            .unwrap_err();
        assert!(matches!(err, EmcError::MalformedData { line: 2, .. }));
    }

    #[test]
    fn test_rejects_short_or_unordered_tables() {
        let err = BhModel::from_points(vec![(0.0, 0.0)], HysteresisCoefficients::default())
            .unwrap_err();
        assert!(matches!(err, EmcError::InvalidBhData { .. }));

        let err = BhModel::from_points(
            vec![(0.0, 0.0), (200.0, 1.0), (100.0, 0.5)],
            HysteresisCoefficients::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EmcError::InvalidBhData { .. }));
    }
}
