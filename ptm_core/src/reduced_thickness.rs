//! # Reduced Metal Thickness
//!
//! The reduced thickness (PTM, "X") of a section is its area divided by its
//! heated perimeter. Massive sections with little heated surface have a large
//! X and warm up slowly; the coating tables are indexed by it.
//!
//! ```text
//! X [mm] = 10 · S [cm²] / P [cm]
//! ```
//!
//! This module also carries the per-length and per-mass surface quantities
//! used to turn a consumption per m² into kilograms of coating.

use crate::catalogue::ProfileItem;

/// Density of steel expressed as kg/m per cm² of section (7.85 g/cm³)
pub const STEEL_KG_PER_M_PER_CM2: f64 = 0.785;

/// Reduced thickness X (mm), or `NaN` unless both inputs are finite and positive.
///
/// # Example
///
/// ```rust
/// use ptm_core::reduced_thickness::reduced_thickness;
///
/// assert_eq!(reduced_thickness(20.0, 40.0), 5.0);
/// assert!(reduced_thickness(20.0, 0.0).is_nan());
/// ```
pub fn reduced_thickness(area_cm2: f64, perimeter_cm: f64) -> f64 {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if usable(area_cm2) && usable(perimeter_cm) {
        (area_cm2 * 10.0) / perimeter_cm
    } else {
        f64::NAN
    }
}

/// Linear mass (kg/m): the tabulated value, else derived from the area.
pub fn linear_mass_or_fallback(item: &ProfileItem, area_cm2: f64) -> f64 {
    match item.linear_mass_kg_m {
        Some(mass) if mass > 0.0 => mass,
        _ => STEEL_KG_PER_M_PER_CM2 * area_cm2,
    }
}

/// Heated surface per metre of member (m²/m)
pub fn surface_per_meter_m2(perimeter_cm: f64) -> f64 {
    perimeter_cm * 0.01
}

/// Heated surface per tonne of steel (m²/t), `NaN` when the mass is not positive
pub fn surface_per_tonne_m2(surface_per_meter_m2: f64, linear_mass_kg_m: f64) -> f64 {
    if linear_mass_kg_m > 0.0 {
        surface_per_meter_m2 * (1000.0 / linear_mass_kg_m)
    } else {
        f64::NAN
    }
}
