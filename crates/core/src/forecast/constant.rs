//! Constant-volume predictor
//!
//! The degraded backend used whenever no usable forecasting artifact exists.

use super::r#trait::UsagePredictor;
use super::FALLBACK_USAGE_LITERS;
use crate::core_types::units::{Celsius, Liters};

/// Predictor that ignores temperature and returns a fixed volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPredictor {
    usage: Liters,
}

impl ConstantPredictor {
    /// Create a predictor returning `usage` (rounded to 2 decimals, floored at zero)
    pub fn new(usage: Liters) -> Self {
        Self {
            usage: usage.max(Liters::ZERO).rounded(2),
        }
    }

    /// The safety default: exactly 300.0 L per day
    pub fn fallback() -> Self {
        Self::new(Liters::new(FALLBACK_USAGE_LITERS))
    }
}

impl Default for ConstantPredictor {
    fn default() -> Self {
        Self::fallback()
    }
}

impl UsagePredictor for ConstantPredictor {
    fn predict_usage(&self, _temperature: Celsius) -> Liters {
        self.usage
    }

    fn backend_name(&self) -> &'static str {
        "constant"
    }
}
