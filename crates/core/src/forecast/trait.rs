//! Usage predictor trait definition
//!
//! This module defines the `UsagePredictor` trait, the capability the water-balance
//! engine uses to estimate daily consumption. Implementations are selected once at
//! engine construction; the engine never probes the filesystem per call.

use super::artifact::ForecastArtifact;
use crate::core_types::units::{Celsius, Liters};
use std::fmt;

/// Backend-agnostic interface for daily consumption forecasting
///
/// Implementations must be total: any internal failure is absorbed and reported as
/// the fallback volume, never as an error or panic.
pub trait UsagePredictor: Send + Sync + fmt::Debug {
    /// Predict daily water consumption for the given ambient temperature
    ///
    /// # Returns
    ///
    /// Non-negative volume in liters, rounded to 2 decimal places
    fn predict_usage(&self, temperature: Celsius) -> Liters;

    /// Short backend name for logging
    fn backend_name(&self) -> &'static str;

    /// The artifact backing this predictor, if any
    ///
    /// Used when persisting an engine so the same forecast can be rebuilt on reload.
    fn artifact(&self) -> Option<&ForecastArtifact> {
        None
    }
}
