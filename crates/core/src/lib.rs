//! Rainwater Harvesting Digital Twin Core Library
//!
//! A digital twin of a rooftop rainwater-harvesting system. Given forecast rainfall,
//! ambient temperature and the current tank level, the engine projects one day of
//! water balance (inflow, predicted consumption, overflow, resulting fill level) and
//! classifies the tank's operating status.
//!
//! ## Structure
//!
//! - [`config`]: validated static parameters loaded once from JSON
//! - [`forecast`]: temperature-driven consumption forecasting with a constant fallback
//! - [`simulation`]: the water-balance engine, status classification, snapshots and
//!   the process-wide engine cell
//! - [`advisory`]: interface to an external recommendation service
//!
//! ## Example
//!
//! ```
//! use watertwin_core::{ConstantPredictor, SystemConfig, TankStatus, WaterTwinEngine};
//!
//! let config = SystemConfig::new(100.0, 5000.0, 0.8, 0.1, 15.0).unwrap();
//! let engine = WaterTwinEngine::new(config, Box::new(ConstantPredictor::fallback()));
//!
//! let result = engine.run_simulation(25.0, 40.0, 25.0);
//! assert_eq!(*result.final_fill_pct, 70.0);
//! assert_eq!(result.status, TankStatus::Stable);
//! ```

// Core types and utilities
pub mod core_types;

pub mod advisory;
pub mod config;
pub mod error;
pub mod forecast;
pub mod simulation;

// Re-export core types
pub use core_types::{Celsius, Fraction, Liters, Millimeters, Percent, SquareMeters};

// Re-export engine types
pub use config::{ConfigError, EngineParameters, ParameterError, SystemConfig};
pub use error::EngineError;
pub use forecast::{
    create_usage_predictor, ArtifactPredictor, ConstantPredictor, ForecastArtifact,
    ForecastError, UsagePredictor,
};
pub use simulation::{
    classify, global_engine, EngineAvailability, EngineCell, EngineSnapshot, PersistenceError,
    SimulationInput, SimulationResult, TankStatus, WaterBalance, WaterTwinEngine,
};
