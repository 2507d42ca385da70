//! # Engine Settings
//!
//! Knobs a caller sets once per session: how finely circular outlines are
//! split, which coating material is used by default, the fallback
//! consumption rate and how results are rounded for display.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "circle_segments": 12,
//!   "default_material": "ograx",
//!   "rate_per_mm_kg_m2": 1.4,
//!   "precision": { "area": 2, "reduced_thickness": 2, "surface_per_meter": 4,
//!                  "surface_per_tonne": 2, "thickness": 2, "consumption": 3, "total": 2 }
//! }
//! ```
//!
//! Every field is optional; missing fields take the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{read_to_string, CalcError, CalcResult};
use crate::exposure::{DEFAULT_CIRCLE_SEGMENTS, MAX_SEGMENTS};
use crate::materials::LinearConsumptionModel;

/// Material used when a row does not name one
pub const DEFAULT_MATERIAL: &str = "ograx";

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Arcs a circular outline is split into for exposure selection
    pub circle_segments: usize,

    /// Coating material used when a row does not name one
    pub default_material: String,

    /// Fallback consumption per millimetre of coating (kg/m²/mm).
    /// `None` leaves fallback consumption undefined.
    pub rate_per_mm_kg_m2: Option<f64>,

    /// Display rounding
    pub precision: DisplayPrecision,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            default_material: DEFAULT_MATERIAL.to_string(),
            rate_per_mm_kg_m2: None,
            precision: DisplayPrecision::default(),
        }
    }
}

impl EngineSettings {
    /// Parse and validate settings
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        let settings: EngineSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load_from_json(path: impl AsRef<Path>) -> CalcResult<Self> {
        let text = read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Validate settings.
    pub fn validate(&self) -> CalcResult<()> {
        if self.circle_segments == 0 || self.circle_segments > MAX_SEGMENTS {
            return Err(CalcError::invalid_input(
                "circle_segments",
                self.circle_segments.to_string(),
                format!("Must be between 1 and {}", MAX_SEGMENTS),
            ));
        }
        if let Some(rate) = self.rate_per_mm_kg_m2 {
            if !rate.is_finite() || rate < 0.0 {
                return Err(CalcError::invalid_input(
                    "rate_per_mm_kg_m2",
                    rate.to_string(),
                    "Rate must be a non-negative number",
                ));
            }
        }
        if self.default_material.trim().is_empty() {
            return Err(CalcError::missing_field("default_material"));
        }
        Ok(())
    }

    /// Fallback model built from the configured rate
    pub fn fallback_model(&self) -> LinearConsumptionModel {
        LinearConsumptionModel::new(self.rate_per_mm_kg_m2.unwrap_or(f64::NAN))
    }
}

/// Decimal places per displayed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPrecision {
    pub area: u32,
    pub reduced_thickness: u32,
    pub surface_per_meter: u32,
    pub surface_per_tonne: u32,
    pub thickness: u32,
    pub consumption: u32,
    pub total: u32,
}

impl Default for DisplayPrecision {
    fn default() -> Self {
        DisplayPrecision {
            area: 2,
            reduced_thickness: 2,
            surface_per_meter: 4,
            surface_per_tonne: 2,
            thickness: 2,
            consumption: 3,
            total: 2,
        }
    }
}
