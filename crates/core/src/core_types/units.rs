//! Semantic unit types for type-safe physical quantity handling
//!
//! This module provides newtype wrappers for the quantities that flow through a
//! water-balance cycle, so that a rainfall depth can't be passed where a tank volume
//! is expected (or a fill percentage where a runoff fraction is expected).
//!
//! # Design Philosophy
//! - All quantities use f64: the balance is a handful of multiplications and the
//!   rounded outputs must be reproducible to the last decimal
//! - `Deref` to the raw value for arithmetic-heavy code
//! - Total ordering via `Ord` (NaN handled as greater than all values)
//! - Transparent serde, so records serialize as plain numbers
//!
//! # Usage
//! ```
//! use watertwin_core::core_types::units::{Liters, Percent};
//!
//! let capacity = Liters::new(5000.0);
//! let fill = Percent::new(40.0);
//! assert_eq!(fill.of(capacity), Liters::new(2000.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Mul, Sub};

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Round to a fixed number of decimal places (half away from zero)
#[inline]
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Shared boilerplate for f64 quantity newtypes: ordering, deref, construction, display.
macro_rules! quantity {
    ($name:ident, $suffix:literal) => {
        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                f64_total_cmp(self.0, other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl $name {
            /// Create a new value
            #[inline]
            #[must_use]
            pub const fn new(value: f64) -> Self {
                $name(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", self.0, $suffix)
            }
        }
    };
}

// ============================================================================
// VOLUME
// ============================================================================

/// Water volume in liters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Liters(f64);

quantity!(Liters, " L");

impl Liters {
    /// Empty tank
    pub const ZERO: Liters = Liters(0.0);

    /// Clamp into `[lo, hi]`
    #[inline]
    #[must_use]
    pub fn clamp_between(self, lo: Liters, hi: Liters) -> Liters {
        Liters(self.0.clamp(lo.0, hi.0))
    }

    /// Round to `decimals` places
    #[inline]
    #[must_use]
    pub fn rounded(self, decimals: i32) -> Liters {
        Liters(round_to(self.0, decimals))
    }

    /// Share of `capacity` this volume occupies
    #[inline]
    #[must_use]
    pub fn percent_of(self, capacity: Liters) -> Percent {
        Percent((self.0 / capacity.0) * 100.0)
    }
}

impl Add for Liters {
    type Output = Liters;
    fn add(self, rhs: Liters) -> Liters {
        Liters(self.0 + rhs.0)
    }
}

impl Sub for Liters {
    type Output = Liters;
    fn sub(self, rhs: Liters) -> Liters {
        Liters(self.0 - rhs.0)
    }
}

// ============================================================================
// DEPTH & AREA
// ============================================================================

/// Rainfall depth in millimeters
///
/// One millimeter of rain over one square meter is one liter of water.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Millimeters(f64);

quantity!(Millimeters, " mm");

/// Catchment (roof) area in square meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareMeters(f64);

quantity!(SquareMeters, " m²");

impl Mul<SquareMeters> for Millimeters {
    type Output = Liters;
    fn mul(self, area: SquareMeters) -> Liters {
        Liters(self.0 * area.0)
    }
}

// ============================================================================
// RATIOS
// ============================================================================

/// Dimensionless fraction (0-1)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Fraction(f64);

quantity!(Fraction, "");

impl Fraction {
    /// The complementary fraction (`1 - self`)
    #[inline]
    #[must_use]
    pub fn complement(self) -> Fraction {
        Fraction(1.0 - self.0)
    }

    /// Whether the value lies within `[0, 1]`
    #[inline]
    #[must_use]
    pub fn is_unit_interval(self) -> bool {
        (0.0..=1.0).contains(&self.0)
    }
}

impl Mul<Fraction> for Liters {
    type Output = Liters;
    fn mul(self, rhs: Fraction) -> Liters {
        Liters(self.0 * rhs.0)
    }
}

/// Percentage (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Percent(f64);

quantity!(Percent, "%");

impl Percent {
    /// This percentage of a volume
    #[inline]
    #[must_use]
    pub fn of(self, volume: Liters) -> Liters {
        Liters((self.0 / 100.0) * volume.0)
    }

    /// Round to `decimals` places
    #[inline]
    #[must_use]
    pub fn rounded(self, decimals: i32) -> Percent {
        Percent(round_to(self.0, decimals))
    }

    /// Whether the value lies within `[0, 100]`
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        (0.0..=100.0).contains(&self.0)
    }
}

// ============================================================================
// TEMPERATURE
// ============================================================================

/// Ambient air temperature in degrees Celsius
///
/// Only used as a forecasting feature, so there is no physical lower bound check.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Celsius(f64);

quantity!(Celsius, "°C");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1799.999_999, 2), 1800.0);
        assert_eq!(round_to(3.14159, 1), 3.1);
        assert_eq!(round_to(-0.004, 2), 0.0);
    }

    #[test]
    fn test_rain_over_roof_is_liters() {
        let volume = Millimeters::new(25.0) * SquareMeters::new(100.0);
        assert_eq!(volume, Liters::new(2500.0));
    }

    #[test]
    fn test_percent_conversions() {
        let capacity = Liters::new(5000.0);
        assert_eq!(Percent::new(40.0).of(capacity), Liters::new(2000.0));
        assert_eq!(Liters::new(3500.0).percent_of(capacity), Percent::new(70.0));
    }

    #[test]
    fn test_fraction_complement() {
        let evaporation = Fraction::new(0.1);
        assert!((*evaporation.complement() - 0.9).abs() < 1e-12);
        assert!(evaporation.is_unit_interval());
        assert!(!Fraction::new(1.5).is_unit_interval());
    }

    #[test]
    fn test_clamp_between() {
        let capacity = Liters::new(5000.0);
        assert_eq!(Liters::new(-200.0).clamp_between(Liters::ZERO, capacity), Liters::ZERO);
        assert_eq!(Liters::new(11400.0).clamp_between(Liters::ZERO, capacity), capacity);
    }

    #[test]
    fn test_total_ordering_with_nan() {
        let nan = Liters::new(f64::NAN);
        assert!(nan > Liters::new(f64::MAX));
        assert_eq!(Liters::new(1.0).max(Liters::new(2.0)), Liters::new(2.0));
    }

    #[test]
    fn test_display_suffix() {
        assert_eq!(Liters::new(300.0).to_string(), "300 L");
        assert_eq!(Percent::new(70.0).to_string(), "70%");
        assert_eq!(Celsius::new(25.5).to_string(), "25.5°C");
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Liters::new(1800.0)).unwrap();
        assert_eq!(json, "1800.0");
        let back: Percent = serde_json::from_str("70.0").unwrap();
        assert_eq!(back, Percent::new(70.0));
    }
}
