//! Forecasting artifacts and the predictor that evaluates them
//!
//! An artifact is a small serialized single-feature regressor mapping ambient
//! temperature (°C) to daily consumption (L). It is produced offline and loaded once
//! when an engine is built. The engine treats it as an opaque `f(temperature)`; two
//! encodings are understood:
//!
//! - `linear_regression`: ordinary least squares line, `usage = coefficient * t + intercept`
//! - `calibration_table`: piecewise-linear interpolation between measured points,
//!   held constant beyond the first and last point
//!
//! ```json
//! { "kind": "linear_regression", "coefficient": 26.357, "intercept": -218.93 }
//! ```

use super::r#trait::UsagePredictor;
use super::{ForecastError, FALLBACK_USAGE_LITERS};
use crate::core_types::units::{Celsius, Liters};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Calibration points (temperature °C, daily usage L) the reference model is fitted on.
///
/// Consumption rises with temperature, mostly from garden irrigation.
pub const REFERENCE_CALIBRATION: [(f64, f64); 7] = [
    (10.0, 150.0),
    (15.0, 180.0),
    (20.0, 250.0),
    (25.0, 350.0),
    (30.0, 500.0),
    (35.0, 700.0),
    (40.0, 950.0),
];

/// Single-feature ordinary least squares model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Slope (L per °C)
    pub coefficient: f64,
    /// Usage at 0 °C (L)
    pub intercept: f64,
}

impl LinearRegression {
    /// Fit a line through `(x, y)` samples by ordinary least squares
    ///
    /// # Errors
    /// Returns [`ForecastError::Invalid`] with fewer than two samples, non-finite
    /// samples, or when every `x` is identical
    pub fn fit(samples: &[(f64, f64)]) -> Result<Self, ForecastError> {
        if samples.len() < 2 {
            return Err(ForecastError::Invalid(format!(
                "least squares needs at least 2 samples, got {}",
                samples.len()
            )));
        }
        if samples.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(ForecastError::Invalid("samples must be finite".into()));
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "Sample counts are tiny calibration sets"
        )]
        let n = samples.len() as f64;
        let mean_x = samples.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (sxy, sxx) = samples.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });

        if sxx == 0.0 {
            return Err(ForecastError::Invalid(
                "samples have no variance in temperature".into(),
            ));
        }

        let coefficient = sxy / sxx;
        Ok(Self {
            coefficient,
            intercept: mean_y - coefficient * mean_x,
        })
    }

    /// Evaluate the line at `x`
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficient * x + self.intercept
    }
}

/// Piecewise-linear table of `[temperature, usage]` points, sorted by temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    /// Points as `[temperature °C, usage L]`
    pub points: Vec<[f64; 2]>,
}

impl CalibrationTable {
    /// Table over [`REFERENCE_CALIBRATION`]
    pub fn reference() -> Self {
        Self {
            points: REFERENCE_CALIBRATION.iter().map(|&(t, u)| [t, u]).collect(),
        }
    }

    /// Evaluate by linear interpolation, clamping outside the table range
    ///
    /// Non-finite input yields NaN rather than a clamped end point.
    pub fn evaluate(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return f64::NAN;
        }
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return f64::NAN,
        };
        if x <= first[0] {
            return first[1];
        }
        if x >= last[0] {
            return last[1];
        }

        for pair in self.points.windows(2) {
            let ([x0, y0], [x1, y1]) = (pair[0], pair[1]);
            if x <= x1 {
                let t = (x - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }
        last[1]
    }

    fn validate(&self) -> Result<(), ForecastError> {
        if self.points.len() < 2 {
            return Err(ForecastError::Invalid(
                "calibration table needs at least 2 points".into(),
            ));
        }
        if self.points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ForecastError::Invalid(
                "calibration table values must be finite".into(),
            ));
        }
        if self.points.windows(2).any(|pair| pair[1][0] <= pair[0][0]) {
            return Err(ForecastError::Invalid(
                "calibration table temperatures must be strictly increasing".into(),
            ));
        }
        Ok(())
    }
}

/// Serialized forecasting model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastArtifact {
    /// Ordinary least squares line
    LinearRegression(LinearRegression),
    /// Interpolated calibration measurements
    CalibrationTable(CalibrationTable),
}

impl ForecastArtifact {
    /// The reference model: OLS fitted on [`REFERENCE_CALIBRATION`]
    ///
    /// # Errors
    /// Never fails for the built-in calibration set; the `Result` comes from [`LinearRegression::fit`]
    pub fn reference() -> Result<Self, ForecastError> {
        LinearRegression::fit(&REFERENCE_CALIBRATION).map(ForecastArtifact::LinearRegression)
    }

    /// Load and validate an artifact from a JSON file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, or the model is unusable
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ForecastError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let artifact: Self = serde_json::from_str(&contents)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Save the artifact as pretty-printed JSON
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ForecastError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ForecastError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check that the model can be evaluated
    ///
    /// # Errors
    /// Returns [`ForecastError::Invalid`] describing the first problem found
    pub fn validate(&self) -> Result<(), ForecastError> {
        match self {
            ForecastArtifact::LinearRegression(model) => {
                if model.coefficient.is_finite() && model.intercept.is_finite() {
                    Ok(())
                } else {
                    Err(ForecastError::Invalid(
                        "regression coefficients must be finite".into(),
                    ))
                }
            }
            ForecastArtifact::CalibrationTable(table) => table.validate(),
        }
    }

    /// Raw model output, before rounding or flooring
    pub fn evaluate(&self, temperature: Celsius) -> f64 {
        match self {
            ForecastArtifact::LinearRegression(model) => model.evaluate(*temperature),
            ForecastArtifact::CalibrationTable(table) => table.evaluate(*temperature),
        }
    }

    /// Evaluate, rejecting non-finite output
    ///
    /// # Errors
    /// Returns [`ForecastError::NonFinite`] if the model produced NaN or infinity
    pub fn try_predict(&self, temperature: Celsius) -> Result<Liters, ForecastError> {
        let raw = self.evaluate(temperature);
        if raw.is_finite() {
            Ok(Liters::new(raw))
        } else {
            Err(ForecastError::NonFinite { temperature })
        }
    }
}

/// Predictor backed by a loaded [`ForecastArtifact`]
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPredictor {
    artifact: ForecastArtifact,
}

impl ArtifactPredictor {
    /// Wrap a validated artifact
    ///
    /// # Errors
    /// Returns [`ForecastError::Invalid`] if the artifact fails validation
    pub fn new(artifact: ForecastArtifact) -> Result<Self, ForecastError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }
}

impl UsagePredictor for ArtifactPredictor {
    fn predict_usage(&self, temperature: Celsius) -> Liters {
        match self.artifact.try_predict(temperature) {
            // Cold days can extrapolate below zero on a fitted line
            Ok(usage) => usage.max(Liters::ZERO).rounded(2),
            Err(e) => {
                warn!("Usage forecast failed, using {FALLBACK_USAGE_LITERS} L fallback: {e}");
                Liters::new(FALLBACK_USAGE_LITERS)
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        match self.artifact {
            ForecastArtifact::LinearRegression(_) => "linear_regression",
            ForecastArtifact::CalibrationTable(_) => "calibration_table",
        }
    }

    fn artifact(&self) -> Option<&ForecastArtifact> {
        Some(&self.artifact)
    }
}
