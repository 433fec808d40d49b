//! Tank operating status classification
//!
//! Maps the outcome of one balance cycle to one of three operating states. Overflow
//! and critical-low are not mutually exclusive in raw numbers (a tiny tank can
//! overflow and still report a low percentage after rounding), so the checks run in
//! a fixed order and the first match wins:
//!
//! 1. Any overflow → `OverflowRisk`
//! 2. Fill below the critical threshold → `CriticalLow`
//! 3. Otherwise → `Stable`

use super::SimulationResult;
use crate::core_types::units::{Liters, Percent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating status of the tank after a simulation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TankStatus {
    /// Level within normal bounds
    Stable,
    /// Level below the configured critical threshold
    CriticalLow,
    /// Inflow exceeds remaining capacity; water will be lost
    OverflowRisk,
}

impl TankStatus {
    /// Classify from the reported overflow volume and final fill level
    pub fn from_levels(overflow: Liters, final_fill: Percent, critical_threshold: Percent) -> Self {
        if *overflow > 0.0 {
            TankStatus::OverflowRisk
        } else if final_fill < critical_threshold {
            TankStatus::CriticalLow
        } else {
            TankStatus::Stable
        }
    }

    /// Dashboard label
    pub fn label(&self) -> &'static str {
        match self {
            TankStatus::Stable => "STABLE",
            TankStatus::CriticalLow => "CRITICAL LOW",
            TankStatus::OverflowRisk => "OVERFLOW RISK",
        }
    }

    /// Alert banner text for non-stable results, `None` when stable
    pub fn alert(result: &SimulationResult, critical_threshold: Percent) -> Option<String> {
        match result.status {
            TankStatus::Stable => None,
            TankStatus::CriticalLow => Some(format!(
                "SYSTEM ALERT: Tank level is below critical threshold ({}%). Strategic conservation required.",
                *critical_threshold
            )),
            TankStatus::OverflowRisk => Some(format!(
                "SYSTEM ALERT: High inflow detected. Predicted overflow of {} L.",
                *result.overflow_l
            )),
        }
    }
}

impl fmt::Display for TankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a simulation result against a critical threshold
///
/// Pure and total: only `overflow_l` and `final_fill_pct` are read, the stored
/// status is ignored.
pub fn classify(result: &SimulationResult, critical_threshold: Percent) -> TankStatus {
    TankStatus::from_levels(result.overflow_l, result.final_fill_pct, critical_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(overflow: f64, fill: f64) -> SimulationResult {
        SimulationResult {
            inflow_l: Liters::new(0.0),
            predicted_usage_l: Liters::new(300.0),
            overflow_l: Liters::new(overflow),
            final_fill_pct: Percent::new(fill),
            status: TankStatus::Stable,
        }
    }

    #[test]
    fn test_overflow_wins() {
        let threshold = Percent::new(15.0);
        assert_eq!(classify(&result(6400.0, 100.0), threshold), TankStatus::OverflowRisk);
        // Overflow takes precedence even when the fill is below threshold
        assert_eq!(classify(&result(0.5, 5.0), threshold), TankStatus::OverflowRisk);
    }

    #[test]
    fn test_critical_low_below_threshold() {
        let threshold = Percent::new(15.0);
        assert_eq!(classify(&result(0.0, 4.0), threshold), TankStatus::CriticalLow);
        assert_eq!(classify(&result(0.0, 14.9), threshold), TankStatus::CriticalLow);
    }

    #[test]
    fn test_threshold_boundary_is_stable() {
        let threshold = Percent::new(15.0);
        assert_eq!(classify(&result(0.0, 15.0), threshold), TankStatus::Stable);
        assert_eq!(classify(&result(0.0, 70.0), threshold), TankStatus::Stable);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let r = result(0.0, 25.0);
        assert_eq!(classify(&r, Percent::new(15.0)), TankStatus::Stable);
        assert_eq!(classify(&r, Percent::new(30.0)), TankStatus::CriticalLow);
        assert_eq!(classify(&result(0.0, 0.0), Percent::new(0.0)), TankStatus::Stable);
    }

    #[test]
    fn test_labels_and_serialization() {
        assert_eq!(TankStatus::CriticalLow.to_string(), "CRITICAL LOW");
        assert_eq!(TankStatus::OverflowRisk.label(), "OVERFLOW RISK");
        assert_eq!(
            serde_json::to_string(&TankStatus::CriticalLow).unwrap(),
            "\"CRITICAL_LOW\""
        );
        assert_eq!(
            serde_json::to_string(&TankStatus::OverflowRisk).unwrap(),
            "\"OVERFLOW_RISK\""
        );
    }

    #[test]
    fn test_alert_messages() {
        let threshold = Percent::new(15.0);

        let mut low = result(0.0, 4.0);
        low.status = TankStatus::CriticalLow;
        assert_eq!(
            TankStatus::alert(&low, threshold).unwrap(),
            "SYSTEM ALERT: Tank level is below critical threshold (15%). Strategic conservation required."
        );

        let mut over = result(6400.0, 100.0);
        over.status = TankStatus::OverflowRisk;
        assert_eq!(
            TankStatus::alert(&over, threshold).unwrap(),
            "SYSTEM ALERT: High inflow detected. Predicted overflow of 6400 L."
        );

        assert!(TankStatus::alert(&result(0.0, 70.0), threshold).is_none());
    }
}
