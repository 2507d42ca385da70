//! # Unit Types
//!
//! Type-safe wrappers for the few units the engine juggles. Profile
//! dimensions arrive in millimeters; areas and perimeters leave in
//! centimeter units because the coating tables and consumption figures
//! downstream are keyed that way.
//!
//! Scaling is a division: `/ 10` for length, `/ 100` for area.
//!
//! ## Example
//!
//! ```rust
//! use ptm_core::units::{Centimeters, Millimeters, SquareCentimeters, SquareMillimeters};
//!
//! let perimeter: Centimeters = Millimeters(789.6).into();
//! assert!((perimeter.0 - 78.96).abs() < 1e-9);
//!
//! let area: SquareCentimeters = SquareMillimeters(2637.0).into();
//! assert!((area.0 - 26.37).abs() < 1e-9);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

impl From<Millimeters> for Centimeters {
    fn from(mm: Millimeters) -> Self {
        Centimeters(mm.0 / 10.0)
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMillimeters(pub f64);

/// Area in square centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareCentimeters(pub f64);

impl From<SquareMillimeters> for SquareCentimeters {
    fn from(mm2: SquareMillimeters) -> Self {
        SquareCentimeters(mm2.0 / 100.0)
    }
}

impl Centimeters {
    /// Get the raw f64 value
    pub fn value(self) -> f64 {
        self.0
    }
}

impl SquareCentimeters {
    /// Get the raw f64 value
    pub fn value(self) -> f64 {
        self.0
    }
}

// ============================================================================
// Undefined quantities
// ============================================================================

/// Read an `f64` that may have been written as `null`.
///
/// serde_json writes `NaN` as `null`; this maps it back so results with
/// undefined quantities survive a JSON round trip.
pub(crate) fn f64_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
