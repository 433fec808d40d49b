//! Daily consumption forecasting
//!
//! The engine asks a [`UsagePredictor`] how much water the household will draw for a
//! given ambient temperature. Two backends exist:
//!
//! - [`ArtifactPredictor`]: evaluates a [`ForecastArtifact`] produced offline
//! - [`ConstantPredictor`]: returns a fixed volume, 300 L/day by default
//!
//! # Backend Selection
//!
//! The backend is chosen once, when the engine is built:
//! 1. Try to load the artifact from its well-known location
//! 2. Fall back to the constant predictor if the file is absent or unusable
//!
//! Missing or corrupt models therefore never stop a simulation; they only degrade
//! the precision of the consumption estimate.

mod artifact;
mod constant;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

pub use artifact::{
    ArtifactPredictor, CalibrationTable, ForecastArtifact, LinearRegression,
    REFERENCE_CALIBRATION,
};
pub use constant::ConstantPredictor;
pub use r#trait::UsagePredictor;

use crate::core_types::units::Celsius;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default location of the forecasting artifact, relative to the working directory
pub const DEFAULT_ARTIFACT_PATH: &str = "models/usage_forecaster.json";

/// Daily usage assumed when no forecast is available (L)
pub const FALLBACK_USAGE_LITERS: f64 = 300.0;

/// Errors raised while loading, saving or evaluating a forecasting artifact.
///
/// These never reach a simulation caller: predictor selection and prediction
/// absorb them into the fallback volume.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The artifact file is absent or unreadable.
    #[error("Failed to read forecasting artifact {path}: {source}")]
    Read {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The artifact file could not be written.
    #[error("Failed to write forecasting artifact {path}: {source}")]
    Write {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The artifact is not valid JSON of a known kind.
    #[error("Failed to parse forecasting artifact: {0}")]
    Parse(#[from] serde_json::Error),

    /// The artifact parsed but cannot be evaluated.
    #[error("Invalid forecasting artifact: {0}")]
    Invalid(String),

    /// The model produced NaN or infinity.
    #[error("Forecast is not finite at {temperature}")]
    NonFinite {
        /// Input that produced the value
        temperature: Celsius,
    },
}

impl ForecastError {
    /// Whether this error means the artifact simply doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForecastError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Build a predictor from an optional artifact, falling back to the constant backend.
pub fn predictor_from_artifact(artifact: Option<ForecastArtifact>) -> Box<dyn UsagePredictor> {
    match artifact.map(ArtifactPredictor::new) {
        Some(Ok(predictor)) => Box::new(predictor),
        Some(Err(e)) => {
            warn!("Forecasting artifact rejected, using constant fallback: {e}");
            Box::new(ConstantPredictor::fallback())
        }
        None => Box::new(ConstantPredictor::fallback()),
    }
}

/// Create a usage predictor with automatic backend selection
///
/// # Arguments
///
/// * `artifact_path` - Location of the serialized forecasting artifact
///
/// # Returns
///
/// A boxed `UsagePredictor` using the artifact if it loads, the 300 L constant otherwise
pub fn create_usage_predictor<P: AsRef<Path>>(artifact_path: P) -> Box<dyn UsagePredictor> {
    let path = artifact_path.as_ref();

    match ForecastArtifact::load(path) {
        Ok(artifact) => {
            let predictor = predictor_from_artifact(Some(artifact));
            info!(
                "Using {} usage forecast from {}",
                predictor.backend_name(),
                path.display()
            );
            predictor
        }
        Err(e) if e.is_not_found() => {
            info!(
                "No forecasting artifact at {}, using {} L/day fallback",
                path.display(),
                FALLBACK_USAGE_LITERS
            );
            Box::new(ConstantPredictor::fallback())
        }
        Err(e) => {
            warn!(
                "Forecasting artifact at {} is unusable, using {} L/day fallback: {}",
                path.display(),
                FALLBACK_USAGE_LITERS,
                e
            );
            Box::new(ConstantPredictor::fallback())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_artifact_selects_fallback() {
        let path = std::env::temp_dir().join("watertwin_no_such_artifact.json");
        let _ = fs::remove_file(&path);

        let predictor = create_usage_predictor(&path);
        assert_eq!(predictor.backend_name(), "constant");
        assert_eq!(*predictor.predict_usage(Celsius::new(30.0)), 300.0);
    }

    #[test]
    fn test_corrupt_artifact_selects_fallback() {
        let path = std::env::temp_dir().join("watertwin_corrupt_artifact.json");
        fs::write(&path, b"\x80\x04 not a model").unwrap();

        let predictor = create_usage_predictor(&path);
        assert_eq!(predictor.backend_name(), "constant");
        assert_eq!(*predictor.predict_usage(Celsius::new(30.0)), 300.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_artifact_selects_fallback() {
        let path = std::env::temp_dir().join("watertwin_invalid_artifact.json");
        fs::write(&path, r#"{ "kind": "calibration_table", "points": [] }"#).unwrap();

        let predictor = create_usage_predictor(&path);
        assert_eq!(predictor.backend_name(), "constant");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_valid_artifact_selected() {
        let path = std::env::temp_dir().join("watertwin_valid_artifact.json");
        ForecastArtifact::reference().unwrap().save(&path).unwrap();

        let predictor = create_usage_predictor(&path);
        assert_eq!(predictor.backend_name(), "linear_regression");
        assert_eq!(*predictor.predict_usage(Celsius::new(30.0)), 571.79);
        assert!(predictor.artifact().is_some());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_not_found_detection() {
        let err = ForecastArtifact::load("/definitely/not/here.json").unwrap_err();
        assert!(err.is_not_found());

        let err = ForecastError::Invalid("bad".into());
        assert!(!err.is_not_found());
    }
}
