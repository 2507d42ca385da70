//! # Coating Estimate for One Row
//!
//! One row of a fire-protection estimate: a profile, how it is exposed, the
//! rating it must reach and how much of it there is. The calculation chains
//! the geometry engine, the reduced-thickness calculator and the coating
//! lookup, then turns consumption per m² into kilograms of material.
//!
//! ## Steps
//!
//! 1. Area and heated perimeter of the profile under its exposure
//! 2. A manual perimeter (> 0) overrides the computed one
//! 3. Reduced thickness X = 10·S/P
//! 4. Heated surface per metre and per tonne of steel
//! 5. Coating from the material's table when a rating is set and the table
//!    has a cell for it; otherwise manual thickness × fallback rate
//! 6. Total coating mass for the quantity, in metres or tonnes of steel
//!
//! Nothing is rounded here; use [`RowEstimate::rounded`] for display.
//!
//! ## Example
//!
//! ```rust
//! use ptm_core::calculations::row_estimate::{estimate_row, Quantity, RowInput};
//! use ptm_core::catalogue::{ProfileItem, Section};
//! use ptm_core::samples::builtin_sample_materials;
//! use ptm_core::settings::EngineSettings;
//!
//! let item = ProfileItem::new(
//!     "20",
//!     Section::IBeam { h_mm: 200.0, b_mm: 100.0, tw_mm: 5.2, tf_mm: 8.4 },
//! );
//! let input = RowInput::new("B-1", item)
//!     .with_rating("R45")
//!     .with_quantity(Quantity::meters(120.0));
//!
//! let result = estimate_row(&input, builtin_sample_materials(), &EngineSettings::default()).unwrap();
//! assert!((result.reduced_thickness_mm - 3.334).abs() < 1e-3);
//! assert!(result.total_kg > 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalogue::{ProfileItem, ShapeKind};
use crate::errors::{CalcError, CalcResult};
use crate::exposure::{Exposure, SupportShape};
use crate::geometry::{check_exposure, compute_geometry};
use crate::materials::{CoatingMatch, LookupMiss, MaterialDb};
use crate::reduced_thickness::{
    linear_mass_or_fallback, reduced_thickness, surface_per_meter_m2, surface_per_tonne_m2,
};
use crate::settings::{DisplayPrecision, EngineSettings};
use crate::units::f64_or_nan;

/// How the quantity of steel is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityUnit {
    /// Running metres of member
    #[serde(rename = "m")]
    Meters,
    /// Tonnes of steel
    #[serde(rename = "t")]
    Tonnes,
}

/// Amount of steel in a row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: QuantityUnit,
}

impl Quantity {
    /// Running metres
    pub fn meters(value: f64) -> Self {
        Quantity { value, unit: QuantityUnit::Meters }
    }

    /// Tonnes of steel
    pub fn tonnes(value: f64) -> Self {
        Quantity { value, unit: QuantityUnit::Tonnes }
    }
}

/// Input for one estimate row.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Beams level +3.600",
///   "item": { "name": "20", "kind": "i", "h": 200, "b": 100, "tw": 5.2, "tf": 8.4 },
///   "exposure": { "type": "Mask", "mask": { "bits": 4031, "segments": 12 } },
///   "rating": "R45",
///   "quantity": { "value": 120, "unit": "m" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowInput {
    /// User label for this row
    pub label: String,

    /// Profile from the catalogue
    pub item: ProfileItem,

    /// Heated outline segments
    #[serde(default)]
    pub exposure: Exposure,

    /// Hand-entered heated perimeter (cm); used when > 0
    #[serde(default)]
    pub manual_perimeter_cm: Option<f64>,

    /// Required fire-resistance rating label (e.g. "R60")
    #[serde(default)]
    pub rating: Option<String>,

    /// Coating material; the settings' default when absent
    #[serde(default)]
    pub material_id: Option<String>,

    /// Hand-entered coating thickness (mm) for the fallback model
    #[serde(default)]
    pub manual_thickness_mm: Option<f64>,

    /// Amount of steel
    #[serde(default)]
    pub quantity: Option<Quantity>,
}

impl RowInput {
    /// Fully exposed row without rating or quantity
    pub fn new(label: impl Into<String>, item: ProfileItem) -> Self {
        RowInput {
            label: label.into(),
            item,
            exposure: Exposure::Full,
            manual_perimeter_cm: None,
            rating: None,
            material_id: None,
            manual_thickness_mm: None,
            quantity: None,
        }
    }

    /// Set the heated segments and return self (builder pattern)
    pub fn with_exposure(mut self, exposure: impl Into<Exposure>) -> Self {
        self.exposure = exposure.into();
        self
    }

    /// Override the computed perimeter (cm) and return self (builder pattern)
    pub fn with_manual_perimeter(mut self, perimeter_cm: f64) -> Self {
        self.manual_perimeter_cm = Some(perimeter_cm);
        self
    }

    /// Set the required rating label and return self (builder pattern)
    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    /// Use a coating material other than the default and return self (builder pattern)
    pub fn with_material(mut self, material_id: impl Into<String>) -> Self {
        self.material_id = Some(material_id.into());
        self
    }

    /// Set the manual coating thickness (mm) and return self (builder pattern)
    pub fn with_manual_thickness(mut self, thickness_mm: f64) -> Self {
        self.manual_thickness_mm = Some(thickness_mm);
        self
    }

    /// Set the amount of steel and return self (builder pattern)
    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if let Some(q) = self.quantity {
            if !q.value.is_finite() || q.value < 0.0 {
                return Err(CalcError::invalid_input(
                    "quantity",
                    q.value.to_string(),
                    "Quantity must be a non-negative number",
                ));
            }
        }
        if let Some(p) = self.manual_perimeter_cm {
            if p.is_nan() || p.is_infinite() {
                return Err(CalcError::invalid_input(
                    "manual_perimeter_cm",
                    p.to_string(),
                    "Manual perimeter must be a finite number",
                ));
            }
        }
        Ok(())
    }
}

/// Where the coating thickness came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoatingSource {
    /// Material table cell
    Table,
    /// Manual thickness × fallback rate
    LinearFallback,
}

/// Result of one estimate row. `NaN` values are shown as dashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowEstimate {
    pub label: String,
    pub kind: ShapeKind,
    pub support_shape: SupportShape,

    /// Cross-sectional area (cm²)
    #[serde(deserialize_with = "f64_or_nan")]
    pub area_cm2: f64,

    /// Heated perimeter actually used (cm)
    #[serde(deserialize_with = "f64_or_nan")]
    pub perimeter_cm: f64,

    /// The perimeter was entered by hand
    pub perimeter_is_manual: bool,

    /// Reduced metal thickness X (mm)
    #[serde(deserialize_with = "f64_or_nan")]
    pub reduced_thickness_mm: f64,

    /// Linear mass, tabulated or derived (kg/m)
    #[serde(deserialize_with = "f64_or_nan")]
    pub linear_mass_kg_m: f64,

    /// Heated surface per metre (m²/m)
    #[serde(deserialize_with = "f64_or_nan")]
    pub surface_per_meter_m2: f64,

    /// Heated surface per tonne (m²/t)
    #[serde(deserialize_with = "f64_or_nan")]
    pub surface_per_tonne_m2: f64,

    /// Coating thickness (mm)
    #[serde(deserialize_with = "f64_or_nan")]
    pub thickness_mm: f64,

    /// Coating consumption (kg/m²)
    #[serde(deserialize_with = "f64_or_nan")]
    pub consumption_kg_m2: f64,

    pub coating_source: CoatingSource,

    /// The table cell used, when the table was used
    pub table_match: Option<CoatingMatch>,

    /// Why the table was not used, when a rating was requested
    pub lookup_miss: Option<LookupMiss>,

    /// Coating mass for the row's quantity (kg)
    #[serde(deserialize_with = "f64_or_nan")]
    pub total_kg: f64,
}

impl RowEstimate {
    /// Copy with every quantity rounded for display
    pub fn rounded(&self, precision: &DisplayPrecision) -> RowEstimate {
        RowEstimate {
            area_cm2: round_to(self.area_cm2, precision.area),
            perimeter_cm: round_to(self.perimeter_cm, 2),
            reduced_thickness_mm: round_to(self.reduced_thickness_mm, precision.reduced_thickness),
            linear_mass_kg_m: round_to(self.linear_mass_kg_m, 2),
            surface_per_meter_m2: round_to(self.surface_per_meter_m2, precision.surface_per_meter),
            surface_per_tonne_m2: round_to(self.surface_per_tonne_m2, precision.surface_per_tonne),
            thickness_mm: round_to(self.thickness_mm, precision.thickness),
            consumption_kg_m2: round_to(self.consumption_kg_m2, precision.consumption),
            total_kg: round_to(self.total_kg, precision.total),
            ..self.clone()
        }
    }

    /// Whether the coating came from the material table
    pub fn from_table(&self) -> bool {
        self.coating_source == CoatingSource::Table
    }
}

/// Round to `decimals` places. Non-finite values pass through.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let k = 10f64.powi(decimals as i32);
    (value * k).round() / k
}

/// Rounded value as text, or an em dash for `NaN`/infinite values
pub fn format_or_dash(value: f64, decimals: u32) -> String {
    if value.is_finite() {
        format!("{}", round_to(value, decimals))
    } else {
        "—".to_string()
    }
}

/// Run one estimate row.
///
/// Fails only on invalid input: a negative quantity, or a mask that does not
/// fit the profile's outline (circles are split into `settings.circle_segments`
/// arcs). Everything else degrades to `NaN` or to the fallback model.
pub fn estimate_row(
    input: &RowInput,
    materials: &MaterialDb,
    settings: &EngineSettings,
) -> CalcResult<RowEstimate> {
    input.validate()?;

    check_exposure(input.item.kind(), &input.exposure, settings.circle_segments)?;
    let geometry = compute_geometry(&input.item, &input.exposure)?;

    let (perimeter_cm, perimeter_is_manual) = match input.manual_perimeter_cm {
        Some(p) if p > 0.0 => (p, true),
        _ => (geometry.exposed_perimeter_cm, false),
    };

    let x = reduced_thickness(geometry.area_cm2, perimeter_cm);
    let per_meter = surface_per_meter_m2(perimeter_cm);
    let linear_mass = linear_mass_or_fallback(&input.item, geometry.area_cm2);
    let per_tonne = surface_per_tonne_m2(per_meter, linear_mass);

    let material_id = input
        .material_id
        .as_deref()
        .unwrap_or(settings.default_material.as_str());

    let lookup = input
        .rating
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|rating| materials.lookup(material_id, x, rating));

    let manual_thickness = input.manual_thickness_mm.unwrap_or(f64::NAN);
    let (thickness_mm, consumption_kg_m2, coating_source, table_match, lookup_miss) = match lookup {
        Some(Ok(hit)) => (
            hit.coating.thickness_mm,
            hit.coating.consumption_kg_m2,
            CoatingSource::Table,
            Some(hit),
            None,
        ),
        Some(Err(miss)) => {
            tracing::debug!(label = %input.label, reason = miss.code(), "falling back to linear consumption");
            (
                manual_thickness,
                settings.fallback_model().consumption(manual_thickness),
                CoatingSource::LinearFallback,
                None,
                Some(miss),
            )
        }
        None => (
            manual_thickness,
            settings.fallback_model().consumption(manual_thickness),
            CoatingSource::LinearFallback,
            None,
            None,
        ),
    };

    let total_kg = match input.quantity {
        Some(q) if consumption_kg_m2.is_finite() && q.value > 0.0 => match q.unit {
            QuantityUnit::Meters => consumption_kg_m2 * per_meter * q.value,
            QuantityUnit::Tonnes => consumption_kg_m2 * per_tonne * q.value,
        },
        _ => f64::NAN,
    };

    Ok(RowEstimate {
        label: input.label.clone(),
        kind: geometry.kind,
        support_shape: geometry.support_shape,
        area_cm2: geometry.area_cm2,
        perimeter_cm,
        perimeter_is_manual,
        reduced_thickness_mm: x,
        linear_mass_kg_m: linear_mass,
        surface_per_meter_m2: per_meter,
        surface_per_tonne_m2: per_tonne,
        thickness_mm,
        consumption_kg_m2,
        coating_source,
        table_match,
        lookup_miss,
        total_kg,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Section;
    use crate::exposure::ExposureMask;
    use crate::materials::{CoatingSpec, MaterialTable};

    fn ibeam() -> ProfileItem {
        ProfileItem::new(
            "20",
            Section::IBeam { h_mm: 200.0, b_mm: 100.0, tw_mm: 5.2, tf_mm: 8.4 },
        )
    }

    fn materials() -> MaterialDb {
        let mut table = MaterialTable::new();
        let cell = |t: f64, c: f64| Some(CoatingSpec { thickness_mm: t, consumption_kg_m2: c });
        table.insert(2.0, "R60", cell(3.0, 4.5)).unwrap();
        table.insert(3.0, "R60", cell(2.4, 3.6)).unwrap();
        table.insert(4.0, "R60", cell(2.0, 3.0)).unwrap();
        table.insert(3.0, "R30", None).unwrap();
        let mut db = MaterialDb::new();
        db.insert("ograx", table);
        db
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            rate_per_mm_kg_m2: Some(1.5),
            ..EngineSettings::default()
        }
    }

    #[test]
    fn test_table_path() {
        let input = RowInput::new("B-1", ibeam())
            .with_rating("R60")
            .with_quantity(Quantity::meters(10.0));
        let r = estimate_row(&input, &materials(), &settings()).unwrap();

        assert!((r.perimeter_cm - 78.96).abs() < 1e-9);
        assert!(!r.perimeter_is_manual);
        assert!((r.reduced_thickness_mm - 263.264 / 78.96).abs() < 1e-12);
        assert!(r.from_table());
        assert_eq!(r.table_match.as_ref().map(|m| m.breakpoint), Some(3.0));
        assert_eq!(r.thickness_mm, 2.4);
        assert_eq!(r.consumption_kg_m2, 3.6);
        assert!((r.total_kg - 3.6 * 0.7896 * 10.0).abs() < 1e-9);
        assert!(r.lookup_miss.is_none());
    }

    #[test]
    fn test_fallback_when_rating_missing() {
        let input = RowInput::new("B-2", ibeam())
            .with_rating("R30")
            .with_manual_thickness(1.2);
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert_eq!(r.coating_source, CoatingSource::LinearFallback);
        assert_eq!(r.thickness_mm, 1.2);
        assert!((r.consumption_kg_m2 - 1.8).abs() < 1e-12);
        assert_eq!(r.lookup_miss.as_ref().map(|m| m.code()), Some("RATING_MISSING"));
        // no quantity, no total
        assert!(r.total_kg.is_nan());
    }

    #[test]
    fn test_fallback_without_rating() {
        let input = RowInput::new("B-3", ibeam()).with_manual_thickness(2.0);
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert_eq!(r.coating_source, CoatingSource::LinearFallback);
        assert!(r.lookup_miss.is_none());
        assert!((r.consumption_kg_m2 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_fallback_without_rate_is_nan() {
        let input = RowInput::new("B-4", ibeam()).with_manual_thickness(2.0);
        let r = estimate_row(&input, &materials(), &EngineSettings::default()).unwrap();
        assert!(r.consumption_kg_m2.is_nan());
        assert!(r.total_kg.is_nan());
    }

    #[test]
    fn test_unknown_material_falls_back() {
        let input = RowInput::new("B-5", ibeam())
            .with_rating("R60")
            .with_material("frizol")
            .with_manual_thickness(1.0);
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert_eq!(r.lookup_miss.as_ref().map(|m| m.code()), Some("UNKNOWN_MATERIAL"));
        assert!((r.consumption_kg_m2 - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_manual_perimeter_override() {
        let input = RowInput::new("B-6", ibeam())
            .with_manual_perimeter(50.0)
            .with_rating("R60");
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert!(r.perimeter_is_manual);
        assert_eq!(r.perimeter_cm, 50.0);
        // X = 263.264 / 50 = 5.27 → breakpoint 4
        assert_eq!(r.table_match.map(|m| m.breakpoint), Some(4.0));

        // zero means "not entered"
        let input = RowInput::new("B-6", ibeam()).with_manual_perimeter(0.0);
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert!(!r.perimeter_is_manual);
    }

    #[test]
    fn test_per_tonne_total() {
        let item = ibeam().with_linear_mass(21.0);
        let input = RowInput::new("B-7", item)
            .with_rating("R60")
            .with_quantity(Quantity::tonnes(2.0));
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        let per_t = 0.7896 * 1000.0 / 21.0;
        assert!((r.surface_per_tonne_m2 - per_t).abs() < 1e-9);
        assert!((r.total_kg - 3.6 * per_t * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_profile_needs_manual_perimeter() {
        let item = ProfileItem::new("special", Section::Custom).with_area_cm2(30.0);
        let input = RowInput::new("C-1", item.clone()).with_rating("R60");
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert!(r.perimeter_cm.is_nan());
        assert!(r.reduced_thickness_mm.is_nan());
        assert_eq!(
            r.lookup_miss.as_ref().map(|m| m.code()),
            Some("INVALID_REDUCED_THICKNESS")
        );

        let input = RowInput::new("C-1", item).with_manual_perimeter(100.0).with_rating("R60");
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert_eq!(r.reduced_thickness_mm, 3.0);
        assert!(r.from_table());
    }

    #[test]
    fn test_exposure_changes_result() {
        let bottom_shielded = ExposureMask::all_exposed(12).unwrap().toggle(6);
        let input = RowInput::new("B-8", ibeam())
            .with_exposure(bottom_shielded)
            .with_rating("R60");
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert!((r.perimeter_cm - 68.96).abs() < 1e-9);
        assert!(r.reduced_thickness_mm > 3.8);
        assert_eq!(r.table_match.map(|m| m.breakpoint), Some(3.0));
    }

    #[test]
    fn test_invalid_inputs() {
        let input = RowInput::new("B-9", ibeam()).with_quantity(Quantity::meters(-1.0));
        let err = estimate_row(&input, &materials(), &settings()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let input = RowInput::new("B-9", ibeam())
            .with_exposure(ExposureMask::all_exposed(4).unwrap());
        assert!(estimate_row(&input, &materials(), &settings()).is_err());
    }

    #[test]
    fn test_circle_mask_must_match_session_arcs() {
        let pipe = ProfileItem::new("108x4", Section::Pipe { d_mm: 108.0, t_mm: 4.0 });
        let quarter = ExposureMask::from_bits(0b0001, 4).unwrap();
        let input = RowInput::new("P-1", pipe.clone()).with_exposure(quarter);
        let err = estimate_row(&input, &materials(), &settings()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let half = ExposureMask::from_fraction(0.5, 12).unwrap();
        let input = RowInput::new("P-1", pipe).with_exposure(half);
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert!((r.perimeter_cm - std::f64::consts::PI * 10.8 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_undefined_row_survives_json() {
        let item = ProfileItem::new("special", Section::Custom);
        let input = RowInput::new("C-2", item).with_rating("R60");
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert!(r.area_cm2.is_nan());

        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""area_cm2":null"#));
        let back: RowEstimate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label, "C-2");
        assert!(back.area_cm2.is_nan());
        assert!(back.perimeter_cm.is_nan());
        assert!(back.reduced_thickness_mm.is_nan());
        assert!(back.total_kg.is_nan());
        assert_eq!(back.coating_source, CoatingSource::LinearFallback);
        assert!(matches!(
            back.lookup_miss,
            Some(LookupMiss::InvalidReducedThickness { value }) if value.is_nan()
        ));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(3.33417, 2), 3.33);
        assert_eq!(round_to(0.78964, 4), 0.7896);
        assert!(round_to(f64::NAN, 2).is_nan());
        assert_eq!(format_or_dash(26.3264, 2), "26.33");
        assert_eq!(format_or_dash(3.0, 2), "3");
        assert_eq!(format_or_dash(f64::NAN, 2), "—");

        let input = RowInput::new("B-1", ibeam()).with_rating("R60");
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        let shown = r.rounded(&DisplayPrecision::default());
        assert_eq!(shown.area_cm2, 26.33);
        assert_eq!(shown.reduced_thickness_mm, 3.33);
        assert_eq!(shown.surface_per_meter_m2, 0.7896);
        assert_eq!(shown.label, "B-1");
    }

    #[test]
    fn test_input_json() {
        let json = r#"{
            "label": "Beams",
            "item": { "name": "20", "kind": "i", "h": 200, "b": 100, "tw": 5.2, "tf": 8.4 },
            "exposure": { "type": "Mask", "mask": { "bits": 4031, "segments": 12 } },
            "rating": "R60",
            "quantity": { "value": 120, "unit": "m" }
        }"#;
        let input: RowInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.exposure.mask().map(|m| m.exposed_count()), Some(11));
        assert_eq!(input.quantity.map(|q| q.unit), Some(QuantityUnit::Meters));
        let r = estimate_row(&input, &materials(), &settings()).unwrap();
        assert!((r.perimeter_cm - 68.96).abs() < 1e-9);
    }
}
