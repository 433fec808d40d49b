//! Engine snapshots
//!
//! A fully constructed engine (configuration, current parameters and the forecasting
//! artifact it was built with) can be written to a single JSON file and rebuilt by a
//! host application later. Snapshots are re-validated on load, so a hand-edited file
//! can't smuggle a non-positive tank capacity past the parameter checks.

use super::WaterTwinEngine;
use crate::config::{EngineParameters, SystemConfig};
use crate::forecast::{predictor_from_artifact, ForecastArtifact};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default location of the persisted engine, relative to the working directory
pub const DEFAULT_ENGINE_PATH: &str = "models/watertwin_engine.json";

/// Serializable state of a constructed engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Static configuration
    pub config: SystemConfig,
    /// Parameters in effect when the snapshot was taken
    pub parameters: EngineParameters,
    /// Forecasting model, absent when the engine ran on the constant fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ForecastArtifact>,
}

impl EngineSnapshot {
    /// Load a snapshot from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| PersistenceError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let snapshot: Self = serde_json::from_str(&contents).map_err(PersistenceError::ParseFailed)?;
        Ok(snapshot)
    }

    /// Save the snapshot to file
    ///
    /// # Errors
    /// Returns error if file cannot be written or snapshot cannot be serialized
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let contents =
            serde_json::to_string_pretty(self).map_err(PersistenceError::SerializeFailed)?;

        fs::write(path, contents).map_err(|source| PersistenceError::SaveFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl WaterTwinEngine {
    /// Capture the engine's current state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            config: self.config,
            parameters: self.parameters,
            artifact: self.predictor.artifact().cloned(),
        }
    }

    /// Rebuild an engine from a snapshot, re-validating every value
    ///
    /// # Errors
    /// Returns [`PersistenceError::Invalid`] if the configuration or parameters are out of range
    pub fn from_snapshot(snapshot: EngineSnapshot) -> Result<Self, PersistenceError> {
        snapshot
            .config
            .validate()
            .map_err(|e| PersistenceError::Invalid(e.to_string()))?;
        snapshot
            .parameters
            .validate()
            .map_err(|e| PersistenceError::Invalid(e.to_string()))?;

        let predictor = predictor_from_artifact(snapshot.artifact);
        Ok(Self::with_parameters(
            snapshot.config,
            snapshot.parameters,
            predictor,
        ))
    }

    /// Persist the engine to file
    ///
    /// # Errors
    /// Returns error if file cannot be written or state cannot be serialized
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        self.snapshot().save(path)?;
        info!("Saved engine snapshot to {}", path.display());
        Ok(())
    }

    /// Load a persisted engine
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed, or holds invalid values
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let engine = Self::from_snapshot(EngineSnapshot::load(path)?)?;
        info!("Loaded engine snapshot from {}", path.display());
        Ok(engine)
    }
}

/// Errors that can occur with persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Failed to load file
    #[error("Failed to load {path}: {source}")]
    LoadFailed {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse file contents
    #[error("Failed to parse: {0}")]
    ParseFailed(#[source] serde_json::Error),
    /// Failed to serialize state
    #[error("Failed to serialize: {0}")]
    SerializeFailed(#[source] serde_json::Error),
    /// Failed to save file
    #[error("Failed to save {path}: {source}")]
    SaveFailed {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Snapshot parsed but holds values no engine may run with
    #[error("Invalid engine snapshot: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::{ArtifactPredictor, ConstantPredictor};
    use crate::simulation::TankStatus;

    fn config() -> SystemConfig {
        SystemConfig::new(100.0, 5000.0, 0.8, 0.1, 15.0).unwrap()
    }

    #[test]
    fn test_snapshot_captures_parameters() {
        let mut engine = WaterTwinEngine::new(config(), Box::new(ConstantPredictor::fallback()));
        engine.set_tank_capacity(7500.0).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(*snapshot.parameters.tank_capacity(), 7500.0);
        assert!(snapshot.artifact.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let predictor = ArtifactPredictor::new(ForecastArtifact::reference().unwrap()).unwrap();
        let mut engine = WaterTwinEngine::new(config(), Box::new(predictor));
        engine.set_roof_area(150.0).unwrap();

        let temp_path = std::env::temp_dir().join("watertwin_test_engine.json");

        // Save
        engine.save(&temp_path).unwrap();

        // Load
        let loaded = WaterTwinEngine::load(&temp_path).unwrap();

        assert_eq!(loaded.snapshot(), engine.snapshot());
        assert_eq!(loaded.forecast_backend(), "linear_regression");
        assert_eq!(
            loaded.run_simulation(25.0, 40.0, 30.0),
            engine.run_simulation(25.0, 40.0, 30.0)
        );

        // Cleanup
        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_fallback_engine_reloads_on_fallback() {
        let engine = WaterTwinEngine::new(config(), Box::new(ConstantPredictor::fallback()));
        let temp_path = std::env::temp_dir().join("watertwin_test_engine_fallback.json");

        engine.save(&temp_path).unwrap();
        let loaded = WaterTwinEngine::load(&temp_path).unwrap();
        assert_eq!(loaded.forecast_backend(), "constant");

        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_invalid_parameters_rejected_on_load() {
        let json = r#"{
            "config": {
                "default_roof_area": 100.0,
                "default_tank_capacity": 5000.0,
                "runoff_coefficient": 0.8,
                "evaporation_loss_rate": 0.1,
                "critical_threshold_pct": 15.0
            },
            "parameters": { "roof_area": 100.0, "tank_capacity": 0.0 }
        }"#;
        let snapshot: EngineSnapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(
            WaterTwinEngine::from_snapshot(snapshot),
            Err(PersistenceError::Invalid(_))
        ));
    }

    #[test]
    fn test_snapshot_threshold_defaults_like_config_file() {
        let json = r#"{
            "config": {
                "default_roof_area": 100.0,
                "default_tank_capacity": 5000.0,
                "runoff_coefficient": 0.8,
                "evaporation_loss_rate": 0.1
            },
            "parameters": { "roof_area": 100.0, "tank_capacity": 5000.0 }
        }"#;
        let snapshot: EngineSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(*snapshot.config.critical_threshold_pct, 15.0);

        let engine = WaterTwinEngine::from_snapshot(snapshot).unwrap();
        // 500 L start, 300 L fallback usage → 4%, below the default threshold
        let result = engine.run_simulation(0.0, 10.0, 25.0);
        assert_eq!(*result.final_fill_pct, 4.0);
        assert_eq!(result.status, TankStatus::CriticalLow);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let temp_path = std::env::temp_dir().join("watertwin_no_such_engine.json");
        let _ = fs::remove_file(&temp_path);
        assert!(matches!(
            WaterTwinEngine::load(&temp_path),
            Err(PersistenceError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let temp_path = std::env::temp_dir().join("watertwin_garbage_engine.json");
        fs::write(&temp_path, "engine?").unwrap();
        assert!(matches!(
            WaterTwinEngine::load(&temp_path),
            Err(PersistenceError::ParseFailed(_))
        ));
        let _ = fs::remove_file(&temp_path);
    }
}
