//! Linear consumption model
//!
//! When the coating table has nothing for a section, the engineer enters a
//! thickness by hand and consumption is taken proportional to it.

use serde::{Deserialize, Serialize};

/// `consumption = rate · thickness`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearConsumptionModel {
    /// Material consumed per millimetre of dry film, per m² (kg/m²/mm)
    pub rate_kg_m2_per_mm: f64,
}

impl LinearConsumptionModel {
    /// Create a model from the consumption rate per millimetre
    pub fn new(rate_kg_m2_per_mm: f64) -> Self {
        LinearConsumptionModel { rate_kg_m2_per_mm }
    }

    /// Consumption (kg/m²) for a manual thickness, `NaN` unless both the
    /// rate and the thickness are finite and non-negative.
    pub fn consumption(&self, manual_thickness_mm: f64) -> f64 {
        let usable = |v: f64| v.is_finite() && v >= 0.0;
        if usable(self.rate_kg_m2_per_mm) && usable(manual_thickness_mm) {
            self.rate_kg_m2_per_mm * manual_thickness_mm
        } else {
            f64::NAN
        }
    }
}
