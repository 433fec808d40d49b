//! Static system parameters
//!
//! The physical constants of the installation (roof area, tank size, runoff and
//! evaporation losses, alert threshold) are read once from a JSON document and
//! validated before an engine is allowed to exist. A configuration that is missing
//! a required key or carries an out-of-domain value is rejected outright; no
//! defaults are substituted for the required constants.

use crate::core_types::units::{Fraction, Liters, Percent, SquareMeters};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default location of the configuration document, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "data/system_params/config.json";

/// Fill percentage below which a tank is reported as critically low, unless configured
pub const DEFAULT_CRITICAL_THRESHOLD_PCT: f64 = 15.0;

/// Errors raised while loading the system configuration. All of them are fatal to
/// engine construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file is absent or unreadable.
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid JSON document of the expected shape.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required key is absent.
    #[error("Missing required configuration key '{0}'")]
    MissingKey(&'static str),

    /// A value lies outside its physical domain.
    #[error("Configuration key '{key}' must be {expected}, got {value}")]
    OutOfRange {
        /// Offending key
        key: &'static str,
        /// Value found in the document
        value: f64,
        /// Human-readable domain
        expected: &'static str,
    },
}

/// Document shape as written on disk. Every field is optional here so that a
/// missing key can be reported by name rather than as a generic parse error.
#[derive(Debug, Deserialize)]
struct RawConfig {
    default_roof_area: Option<f64>,
    default_tank_capacity: Option<f64>,
    runoff_coefficient: Option<f64>,
    evaporation_loss_rate: Option<f64>,
    critical_threshold_pct: Option<f64>,
}

/// Validated static parameters of the harvesting system.
///
/// Immutable once loaded; per-instance overrides live in [`EngineParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Catchment area used when no override is given (m²)
    pub default_roof_area: SquareMeters,
    /// Tank volume used when no override is given (L)
    pub default_tank_capacity: Liters,
    /// Fraction of rainfall converted to usable inflow
    pub runoff_coefficient: Fraction,
    /// Fraction of inflow lost to evaporation
    pub evaporation_loss_rate: Fraction,
    /// Fill percentage below which status becomes critical
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold_pct: Percent,
}

fn default_critical_threshold() -> Percent {
    Percent::new(DEFAULT_CRITICAL_THRESHOLD_PCT)
}

impl SystemConfig {
    /// Build a configuration from raw values, applying the same validation as [`SystemConfig::load`].
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] if any value is outside its domain
    pub fn new(
        default_roof_area: f64,
        default_tank_capacity: f64,
        runoff_coefficient: f64,
        evaporation_loss_rate: f64,
        critical_threshold_pct: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            default_roof_area: SquareMeters::new(default_roof_area),
            default_tank_capacity: Liters::new(default_tank_capacity),
            runoff_coefficient: Fraction::new(runoff_coefficient),
            evaporation_loss_rate: Fraction::new(evaporation_loss_rate),
            critical_threshold_pct: Percent::new(critical_threshold_pct),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate the configuration from a JSON file.
    ///
    /// `critical_threshold_pct` is optional and defaults to 15.0; every other key is required.
    /// Unknown keys are ignored.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, a required key is missing,
    /// or a value is out of range
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&contents)?;
        info!(
            "Loaded system configuration from {}: roof={}, tank={}, runoff={}, evaporation={}, threshold={}",
            path.display(),
            config.default_roof_area,
            config.default_tank_capacity,
            config.runoff_coefficient,
            config.evaporation_loss_rate,
            config.critical_threshold_pct
        );
        Ok(config)
    }

    /// Parse and validate a configuration document held in memory.
    ///
    /// # Errors
    /// Same as [`SystemConfig::load`], minus the I/O failure
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(contents)?;

        Self::new(
            raw.default_roof_area
                .ok_or(ConfigError::MissingKey("default_roof_area"))?,
            raw.default_tank_capacity
                .ok_or(ConfigError::MissingKey("default_tank_capacity"))?,
            raw.runoff_coefficient
                .ok_or(ConfigError::MissingKey("runoff_coefficient"))?,
            raw.evaporation_loss_rate
                .ok_or(ConfigError::MissingKey("evaporation_loss_rate"))?,
            raw.critical_threshold_pct
                .unwrap_or(DEFAULT_CRITICAL_THRESHOLD_PCT),
        )
    }

    /// Check every value against its physical domain.
    ///
    /// # Errors
    /// Returns the first [`ConfigError::OutOfRange`] encountered
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("default_roof_area", *self.default_roof_area)?;
        check_positive("default_tank_capacity", *self.default_tank_capacity)?;
        check_unit_interval("runoff_coefficient", self.runoff_coefficient)?;
        check_unit_interval("evaporation_loss_rate", self.evaporation_loss_rate)?;
        if !self.critical_threshold_pct.is_valid() {
            return Err(ConfigError::OutOfRange {
                key: "critical_threshold_pct",
                value: *self.critical_threshold_pct,
                expected: "within [0, 100]",
            });
        }
        Ok(())
    }
}

fn check_positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            expected: "finite and positive",
        })
    }
}

fn check_unit_interval(key: &'static str, value: Fraction) -> Result<(), ConfigError> {
    if value.is_unit_interval() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value: *value,
            expected: "within [0, 1]",
        })
    }
}

/// Invalid per-instance parameter or simulation input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// Roof area or tank capacity is zero, negative or not finite.
    #[error("Parameter '{name}' must be finite and positive, got {value}")]
    NonPositive {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// A simulation input is outside its domain.
    #[error("Input '{name}' must be {expected}, got {value}")]
    OutOfRange {
        /// Input name
        name: &'static str,
        /// Rejected value
        value: f64,
        /// Human-readable domain
        expected: &'static str,
    },
}

/// Mutable per-engine overrides of the configured catchment and storage sizes.
///
/// Both values are kept strictly positive: the setters reject anything else, so
/// the fill-percentage division in the balance is always defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    roof_area: SquareMeters,
    tank_capacity: Liters,
}

impl EngineParameters {
    /// Create parameters, rejecting non-positive values.
    ///
    /// # Errors
    /// Returns [`ParameterError::NonPositive`] if either value is not finite and positive
    pub fn new(roof_area: f64, tank_capacity: f64) -> Result<Self, ParameterError> {
        Ok(Self {
            roof_area: SquareMeters::new(require_positive("roof_area", roof_area)?),
            tank_capacity: Liters::new(require_positive("tank_capacity", tank_capacity)?),
        })
    }

    /// Seed parameters from the configured defaults (already validated).
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            roof_area: config.default_roof_area,
            tank_capacity: config.default_tank_capacity,
        }
    }

    /// Catchment area
    pub fn roof_area(&self) -> SquareMeters {
        self.roof_area
    }

    /// Tank capacity
    pub fn tank_capacity(&self) -> Liters {
        self.tank_capacity
    }

    /// Override the catchment area.
    ///
    /// # Errors
    /// Returns [`ParameterError::NonPositive`] and leaves the value unchanged if `value <= 0`
    pub fn set_roof_area(&mut self, value: f64) -> Result<(), ParameterError> {
        self.roof_area = SquareMeters::new(require_positive("roof_area", value)?);
        Ok(())
    }

    /// Override the tank capacity.
    ///
    /// # Errors
    /// Returns [`ParameterError::NonPositive`] and leaves the value unchanged if `value <= 0`
    pub fn set_tank_capacity(&mut self, value: f64) -> Result<(), ParameterError> {
        self.tank_capacity = Liters::new(require_positive("tank_capacity", value)?);
        Ok(())
    }

    /// Re-check both values (used after deserializing a snapshot).
    ///
    /// # Errors
    /// Returns [`ParameterError::NonPositive`] for the first invalid value
    pub fn validate(&self) -> Result<(), ParameterError> {
        require_positive("roof_area", *self.roof_area)?;
        require_positive("tank_capacity", *self.tank_capacity)?;
        Ok(())
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::NonPositive { name, value })
    }
}
