//! Water-balance simulation engine
//!
//! `WaterTwinEngine` orchestrates one simulation cycle: it asks the usage predictor
//! for the day's consumption, runs the tank balance, and classifies the outcome.
//!
//! # Balance
//!
//! ```text
//! inflow     = rainfall * roof_area * runoff * (1 - evaporation)
//! start      = (initial_fill / 100) * capacity
//! potential  = start + inflow - usage
//! overflow   = max(0, potential - capacity)
//! final      = clamp(potential, 0, capacity)
//! final_fill = final / capacity * 100
//! ```
//!
//! A negative `potential` (usage exceeding available water) floors at an empty tank.
//! The shortfall is not part of the result record; it is logged as a warning and
//! exposed through [`WaterBalance::deficit`] for callers that need it.

mod persistence;
mod shared;
mod status;

pub use persistence::{EngineSnapshot, PersistenceError, DEFAULT_ENGINE_PATH};
pub use shared::{global_engine, EngineAvailability, EngineCell};
pub use status::{classify, TankStatus};

use crate::config::{EngineParameters, ParameterError, SystemConfig};
use crate::core_types::units::{Celsius, Liters, Millimeters, Percent};
use crate::error::EngineError;
use crate::forecast::{create_usage_predictor, UsagePredictor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Environmental inputs for one simulation cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Forecast rainfall depth
    pub rainfall: Millimeters,
    /// Current tank level as a percentage of capacity
    pub initial_fill: Percent,
    /// Ambient temperature (forecast feature only)
    pub temperature: Celsius,
}

impl SimulationInput {
    /// Create a validated input
    ///
    /// # Errors
    /// Returns [`ParameterError::OutOfRange`] if rainfall is negative or the fill
    /// level is outside `[0, 100]`
    pub fn new(
        rainfall_mm: f64,
        initial_fill_pct: f64,
        temperature_c: f64,
    ) -> Result<Self, ParameterError> {
        let rainfall_valid = rainfall_mm.is_finite() && rainfall_mm >= 0.0;
        if !rainfall_valid {
            return Err(ParameterError::OutOfRange {
                name: "rainfall_mm",
                value: rainfall_mm,
                expected: "finite and non-negative",
            });
        }
        if !Percent::new(initial_fill_pct).is_valid() {
            return Err(ParameterError::OutOfRange {
                name: "initial_fill_pct",
                value: initial_fill_pct,
                expected: "within [0, 100]",
            });
        }
        Ok(Self {
            rainfall: Millimeters::new(rainfall_mm),
            initial_fill: Percent::new(initial_fill_pct),
            temperature: Celsius::new(temperature_c),
        })
    }
}

/// Outcome of one simulation cycle
///
/// Field names on the wire are the ones the dashboard and advisory layers read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Usable inflow after runoff and evaporation losses, 2 decimals
    #[serde(rename = "inflow_L")]
    pub inflow_l: Liters,
    /// Forecast daily consumption, 2 decimals
    #[serde(rename = "predicted_usage_L")]
    pub predicted_usage_l: Liters,
    /// Volume lost over the tank rim, 2 decimals
    #[serde(rename = "overflow_L")]
    pub overflow_l: Liters,
    /// Resulting level as a percentage of capacity, 1 decimal
    #[serde(rename = "final_fill_rate")]
    pub final_fill_pct: Percent,
    /// Operating status
    pub status: TankStatus,
}

/// Unrounded intermediate terms of the balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterBalance {
    /// Usable inflow
    pub inflow: Liters,
    /// Water in the tank before the cycle
    pub start: Liters,
    /// Consumption drawn during the cycle
    pub usage: Liters,
    /// Level before boundary constraints (may be negative or exceed capacity)
    pub potential: Liters,
    /// Volume above capacity
    pub overflow: Liters,
    /// Level after clamping to `[0, capacity]`
    pub final_level: Liters,
    /// `final_level` as a percentage of capacity
    pub final_fill: Percent,
}

impl WaterBalance {
    /// Compute the balance for one cycle
    ///
    /// `parameters` guarantees a positive capacity, so the percentage is always defined.
    pub fn compute(
        config: &SystemConfig,
        parameters: &EngineParameters,
        input: &SimulationInput,
        usage: Liters,
    ) -> Self {
        let capacity = parameters.tank_capacity();

        let inflow = input.rainfall * parameters.roof_area()
            * config.runoff_coefficient
            * config.evaporation_loss_rate.complement();
        let start = input.initial_fill.of(capacity);
        let potential = start + inflow - usage;
        let overflow = (potential - capacity).max(Liters::ZERO);
        let final_level = potential.clamp_between(Liters::ZERO, capacity);

        Self {
            inflow,
            start,
            usage,
            potential,
            overflow,
            final_level,
            final_fill: final_level.percent_of(capacity),
        }
    }

    /// Water demanded beyond what the tank held, zero when the tank did not run dry
    pub fn deficit(&self) -> Liters {
        (Liters::ZERO - self.potential).max(Liters::ZERO)
    }
}

/// The digital-twin engine: validated configuration, per-instance parameters and a
/// usage predictor chosen at construction
#[derive(Debug)]
pub struct WaterTwinEngine {
    config: SystemConfig,
    parameters: EngineParameters,
    predictor: Box<dyn UsagePredictor>,
}

impl WaterTwinEngine {
    /// Create an engine with parameters seeded from the configured defaults
    pub fn new(config: SystemConfig, predictor: Box<dyn UsagePredictor>) -> Self {
        Self::with_parameters(config, EngineParameters::from_config(&config), predictor)
    }

    /// Create an engine with explicit parameters
    pub fn with_parameters(
        config: SystemConfig,
        parameters: EngineParameters,
        predictor: Box<dyn UsagePredictor>,
    ) -> Self {
        info!(
            "WaterTwin engine ready: roof={}, tank={}, forecast={}",
            parameters.roof_area(),
            parameters.tank_capacity(),
            predictor.backend_name()
        );
        Self {
            config,
            parameters,
            predictor,
        }
    }

    /// Build an engine from a configuration file and a forecasting artifact location
    ///
    /// The configuration is mandatory; the artifact is optional and falls back to the
    /// constant predictor.
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the configuration cannot be loaded
    pub fn from_paths<C: AsRef<Path>, A: AsRef<Path>>(
        config_path: C,
        artifact_path: A,
    ) -> Result<Self, EngineError> {
        let config = SystemConfig::load(config_path)?;
        let predictor = create_usage_predictor(artifact_path);
        Ok(Self::new(config, predictor))
    }

    /// Build an engine from files, then apply roof-area and tank-capacity overrides
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the configuration cannot be loaded and
    /// [`EngineError::Parameter`] if an override is rejected
    pub fn from_paths_with_overrides<C: AsRef<Path>, A: AsRef<Path>>(
        config_path: C,
        artifact_path: A,
        roof_area: Option<f64>,
        tank_capacity: Option<f64>,
    ) -> Result<Self, EngineError> {
        let mut engine = Self::from_paths(config_path, artifact_path)?;
        if let Some(area) = roof_area {
            engine.set_roof_area(area)?;
        }
        if let Some(capacity) = tank_capacity {
            engine.set_tank_capacity(capacity)?;
        }
        Ok(engine)
    }

    /// Build an engine from the default file locations
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the configuration cannot be loaded
    pub fn from_default_paths() -> Result<Self, EngineError> {
        Self::from_paths(
            crate::config::DEFAULT_CONFIG_PATH,
            crate::forecast::DEFAULT_ARTIFACT_PATH,
        )
    }

    /// Static configuration
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Current per-instance parameters
    pub fn parameters(&self) -> &EngineParameters {
        &self.parameters
    }

    /// Override the catchment area
    ///
    /// # Errors
    /// Returns [`ParameterError::NonPositive`] if `value <= 0`
    pub fn set_roof_area(&mut self, value: f64) -> Result<(), ParameterError> {
        self.parameters.set_roof_area(value)
    }

    /// Override the tank capacity
    ///
    /// # Errors
    /// Returns [`ParameterError::NonPositive`] if `value <= 0`
    pub fn set_tank_capacity(&mut self, value: f64) -> Result<(), ParameterError> {
        self.parameters.set_tank_capacity(value)
    }

    /// Name of the selected forecast backend
    pub fn forecast_backend(&self) -> &'static str {
        self.predictor.backend_name()
    }

    /// Predicted daily consumption at the given temperature
    pub fn predict_usage(&self, temperature: Celsius) -> Liters {
        self.predictor.predict_usage(temperature)
    }

    /// Run one cycle from raw values
    ///
    /// Inputs are taken as given; use [`SimulationInput::new`] and [`WaterTwinEngine::run`]
    /// to validate them first.
    pub fn run_simulation(
        &self,
        rainfall_mm: f64,
        initial_fill_pct: f64,
        temperature_c: f64,
    ) -> SimulationResult {
        self.run(&SimulationInput {
            rainfall: Millimeters::new(rainfall_mm),
            initial_fill: Percent::new(initial_fill_pct),
            temperature: Celsius::new(temperature_c),
        })
    }

    /// Run one cycle
    pub fn run(&self, input: &SimulationInput) -> SimulationResult {
        let usage = self.predict_usage(input.temperature);
        let balance = WaterBalance::compute(&self.config, &self.parameters, input, usage);

        debug!(
            "Balance: inflow={:.2}, start={:.2}, usage={:.2}, potential={:.2}, overflow={:.2}",
            *balance.inflow, *balance.start, *balance.usage, *balance.potential, *balance.overflow
        );

        let deficit = balance.deficit();
        if *deficit > 0.0 {
            warn!(
                "Water deficit: usage {} exceeds available water by {:.2} L; tank floored at empty",
                balance.usage, *deficit
            );
        }

        let overflow = balance.overflow.rounded(2);
        let final_fill = balance.final_fill.rounded(1);

        SimulationResult {
            inflow_l: balance.inflow.rounded(2),
            predicted_usage_l: usage,
            overflow_l: overflow,
            final_fill_pct: final_fill,
            status: TankStatus::from_levels(overflow, final_fill, self.config.critical_threshold_pct),
        }
    }
}
