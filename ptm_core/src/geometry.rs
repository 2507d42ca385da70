//! # Geometry Engine
//!
//! Cross-sectional area and heated perimeter of a profile.
//!
//! Inputs are millimeters; outputs are cm² and cm (`/ 100` and `/ 10`),
//! since coating consumption downstream is quoted per m² and the reduced
//! thickness tables are built on these units.
//!
//! ## Outline decomposition
//!
//! Polygonal and rectangular outlines are split into an ordered list of
//! straight segments. The order is part of the contract: exposure masks
//! index into it positionally and visualizers draw it in the same order.
//!
//! ```text
//! I-beam (12)                       Channel (8)            Angle (6)
//!  0: flange top, b                  0: b                   0: b2 (outer)
//!  1: flange edge, tf                1: tf                  1: t
//!  2: notch, (b-tw)/2                2: b-tw                2: b2-t
//!  3: web face, h-2tf                3: h-2tf               3: b1-t
//!  4: notch, (b-tw)/2                4: b-tw                4: t
//!  5: tf                             5: tf                  5: b1 (outer)
//!  6: flange bottom, b               6: b
//!  7: tf                             7: h (web back)
//!  8: (b-tw)/2
//!  9: h-2tf
//! 10: (b-tw)/2
//! 11: tf
//! ```
//!
//! Rectangles use top, right, bottom, left.
//!
//! ## Example
//!
//! ```rust
//! use ptm_core::catalogue::{ProfileItem, Section};
//! use ptm_core::exposure::Exposure;
//! use ptm_core::geometry::compute_geometry;
//!
//! let beam = ProfileItem::new(
//!     "20",
//!     Section::IBeam { h_mm: 200.0, b_mm: 100.0, tw_mm: 5.2, tf_mm: 8.4 },
//! );
//! let geom = compute_geometry(&beam, &Exposure::Full).unwrap();
//! assert!((geom.exposed_perimeter_cm - 78.96).abs() < 1e-9);
//! assert!((geom.area_cm2 - 26.3264).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::catalogue::{ProfileItem, Section, ShapeKind};
use crate::errors::{CalcError, CalcResult};
use crate::exposure::{segment_count, sum_selected_lengths, Exposure, ExposureMask, SupportShape};
use crate::units::{f64_or_nan, Centimeters, Millimeters, SquareCentimeters, SquareMillimeters};

/// Area and heated perimeter of one profile under one exposure.
///
/// `NaN` marks a value that cannot be computed (bad dimensions, manual entry).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionGeometry {
    /// Cross-sectional area (cm²)
    #[serde(deserialize_with = "f64_or_nan")]
    pub area_cm2: f64,

    /// Perimeter of the exposed segments (cm)
    #[serde(deserialize_with = "f64_or_nan")]
    pub exposed_perimeter_cm: f64,

    /// Perimeter of the whole outline (cm)
    #[serde(deserialize_with = "f64_or_nan")]
    pub full_perimeter_cm: f64,

    /// Shape family
    pub kind: ShapeKind,

    /// Outline type for visualizers
    pub support_shape: SupportShape,

    /// Segments in the outline, `None` for manual entry
    pub segment_count: Option<usize>,
}

impl SectionGeometry {
    /// Share of the outline that is heated
    pub fn exposed_share(&self) -> f64 {
        self.exposed_perimeter_cm / self.full_perimeter_cm
    }
}

// ============================================================================
// Outline segments
// ============================================================================

/// I-beam outline, 12 segments, symmetric about both axes.
pub fn segments_i(h: f64, b: f64, tw: f64, tf: f64) -> Vec<f64> {
    let step = (b - tw) / 2.0;
    let web = h - 2.0 * tf;
    vec![b, tf, step, web, step, tf, b, tf, step, web, step, tf]
}

/// Channel outline, 8 segments; the last one is the flat back of the web.
pub fn segments_u(h: f64, b: f64, tw: f64, tf: f64) -> Vec<f64> {
    vec![b, tf, b - tw, h - 2.0 * tf, b - tw, tf, b, h]
}

/// Angle outline, 6 segments.
pub fn segments_l(b1: f64, b2: f64, t: f64) -> Vec<f64> {
    vec![b2, t, b2 - t, b1 - t, t, b1]
}

/// Rectangle sides: top, right, bottom, left.
pub fn rect_sides(width: f64, height: f64) -> Vec<f64> {
    vec![width, height, width, height]
}

/// Ordered segment lengths (mm) of a section's outline.
///
/// `None` for circular outlines, which are split into equal arcs instead,
/// and for manual entry.
pub fn outline_segments(section: &Section) -> Option<Vec<f64>> {
    match *section {
        Section::IBeam { h_mm, b_mm, tw_mm, tf_mm } => Some(segments_i(h_mm, b_mm, tw_mm, tf_mm)),
        Section::Channel { h_mm, b_mm, tw_mm, tf_mm } => {
            Some(segments_u(h_mm, b_mm, tw_mm, tf_mm))
        }
        Section::Angle { b1_mm, b2_mm, t_mm } => Some(segments_l(b1_mm, b2_mm, t_mm)),
        Section::HollowRect { height_mm, width_mm, .. } => Some(rect_sides(width_mm, height_mm)),
        Section::Plate { width_mm, t_mm } => Some(rect_sides(width_mm, t_mm)),
        Section::Pipe { .. } | Section::RoundBar { .. } | Section::Custom => None,
    }
}

// ============================================================================
// Area formulas
// ============================================================================

/// Formula area (mm²) from nominal dimensions, ignoring fillets and rounding.
fn formula_area_mm2(section: &Section) -> f64 {
    match *section {
        Section::IBeam { h_mm: h, b_mm: b, tw_mm: tw, tf_mm: tf }
        | Section::Channel { h_mm: h, b_mm: b, tw_mm: tw, tf_mm: tf } => {
            2.0 * b * tf + (h - 2.0 * tf) * tw
        }
        Section::Angle { b1_mm, b2_mm, t_mm } => t_mm * (b1_mm + b2_mm - t_mm),
        Section::HollowRect { height_mm: h, width_mm: b, t_mm: t } => {
            h * b - (h - 2.0 * t) * (b - 2.0 * t)
        }
        Section::Pipe { d_mm, t_mm } => PI * (d_mm * t_mm - t_mm * t_mm),
        Section::RoundBar { d_mm } => PI * d_mm * d_mm / 4.0,
        Section::Plate { width_mm, t_mm } => width_mm * t_mm,
        Section::Custom => f64::NAN,
    }
}

/// Cross-sectional area (cm²). The tabulated area wins over the formula.
pub fn section_area_cm2(item: &ProfileItem) -> f64 {
    if let Some(area) = item.area_cm2 {
        return area;
    }
    if !item.section.has_valid_dimensions() {
        return f64::NAN;
    }
    SquareCentimeters::from(SquareMillimeters(formula_area_mm2(&item.section))).value()
}

// ============================================================================
// Engine entry point
// ============================================================================

/// Compute area and heated perimeter of `item` under `exposure`.
///
/// Returns `Err` only when a mask was built for a different outline (its
/// segment count does not match the family's). Geometry that cannot be
/// evaluated comes back as `NaN`.
pub fn compute_geometry(item: &ProfileItem, exposure: &Exposure) -> CalcResult<SectionGeometry> {
    let kind = item.kind();
    let support_shape = SupportShape::for_kind(kind);
    let area_cm2 = section_area_cm2(item);
    let valid = item.section.has_valid_dimensions();

    let (exposed_mm, full_mm, segment_count) = match item.section {
        Section::Pipe { d_mm, .. } | Section::RoundBar { d_mm } => {
            let fraction = exposure.mask().map(ExposureMask::exposed_fraction).unwrap_or(1.0);
            let full = PI * d_mm;
            let arcs = exposure
                .mask()
                .map(ExposureMask::segments)
                .unwrap_or(crate::exposure::DEFAULT_CIRCLE_SEGMENTS);
            (full * fraction, full, Some(arcs))
        }
        Section::Custom => (f64::NAN, f64::NAN, None),
        ref polygonal => {
            // Every remaining section has a segment decomposition.
            let lengths = outline_segments(polygonal).unwrap_or_default();
            let mask = exposure.mask();
            if let Some(mask) = mask {
                check_mask_fits(kind, mask, Some(lengths.len()))?;
            }
            (
                sum_selected_lengths(&lengths, mask),
                sum_selected_lengths(&lengths, None),
                Some(lengths.len()),
            )
        }
    };

    let to_cm = |mm: f64| {
        if valid {
            Centimeters::from(Millimeters(mm)).value()
        } else {
            f64::NAN
        }
    };

    Ok(SectionGeometry {
        area_cm2,
        exposed_perimeter_cm: to_cm(exposed_mm),
        full_perimeter_cm: to_cm(full_mm),
        kind,
        support_shape,
        segment_count,
    })
}

/// Check an exposure against the outline a family has under the session's
/// arc count for circles. Unlike [`compute_geometry`], which takes a circle
/// mask of any arc count, this rejects a circle mask built for a different
/// subdivision and any mask on a profile without an outline.
pub fn check_exposure(kind: ShapeKind, exposure: &Exposure, circle_segments: usize) -> CalcResult<()> {
    match exposure.mask() {
        Some(mask) => check_mask_fits(kind, mask, segment_count(kind, circle_segments)),
        None => Ok(()),
    }
}

fn check_mask_fits(kind: ShapeKind, mask: &ExposureMask, expected: Option<usize>) -> CalcResult<()> {
    match expected {
        Some(n) if mask.segments() == n => Ok(()),
        Some(n) => Err(CalcError::invalid_input(
            "exposure",
            format!("{} segments", mask.segments()),
            format!("'{}' outline has {} segments", kind.as_str(), n),
        )),
        None => Err(CalcError::invalid_input(
            "exposure",
            format!("{} segments", mask.segments()),
            format!("'{}' has no outline to expose", kind.as_str()),
        )),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::ExposureMask;

    fn ibeam() -> ProfileItem {
        ProfileItem::new(
            "20",
            Section::IBeam { h_mm: 200.0, b_mm: 100.0, tw_mm: 5.2, tf_mm: 8.4 },
        )
    }

    fn shs() -> ProfileItem {
        ProfileItem::new(
            "100x100x5",
            Section::HollowRect { height_mm: 100.0, width_mm: 100.0, t_mm: 5.0 },
        )
    }

    fn all_sections() -> Vec<ProfileItem> {
        vec![
            ibeam(),
            ProfileItem::new(
                "20П",
                Section::Channel { h_mm: 200.0, b_mm: 76.0, tw_mm: 5.2, tf_mm: 9.0 },
            ),
            ProfileItem::new("100x63x8", Section::Angle { b1_mm: 100.0, b2_mm: 63.0, t_mm: 8.0 }),
            shs(),
            ProfileItem::new("108x4", Section::Pipe { d_mm: 108.0, t_mm: 4.0 }),
            ProfileItem::new("40", Section::RoundBar { d_mm: 40.0 }),
            ProfileItem::new("200x10", Section::Plate { width_mm: 200.0, t_mm: 10.0 }),
        ]
    }

    fn assert_lengths(actual: Vec<f64>, expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_segment_orders() {
        assert_lengths(
            segments_i(200.0, 100.0, 5.2, 8.4),
            &[100.0, 8.4, 47.4, 183.2, 47.4, 8.4, 100.0, 8.4, 47.4, 183.2, 47.4, 8.4],
        );
        assert_lengths(
            segments_u(200.0, 76.0, 5.2, 9.0),
            &[76.0, 9.0, 70.8, 182.0, 70.8, 9.0, 76.0, 200.0],
        );
        assert_lengths(segments_l(100.0, 63.0, 8.0), &[63.0, 8.0, 55.0, 92.0, 8.0, 100.0]);
        assert_lengths(rect_sides(200.0, 10.0), &[200.0, 10.0, 200.0, 10.0]);
    }

    #[test]
    fn test_full_mask_gives_full_perimeter() {
        for item in all_sections() {
            let kind = item.kind();
            let exposure = Exposure::default_for(kind, 12).unwrap();
            let with_mask = compute_geometry(&item, &exposure).unwrap();
            let without = compute_geometry(&item, &Exposure::Full).unwrap();

            let expected_cm = match outline_segments(&item.section) {
                Some(lengths) => lengths.iter().sum::<f64>() / 10.0,
                None => match item.section {
                    Section::Pipe { d_mm, .. } | Section::RoundBar { d_mm } => PI * d_mm / 10.0,
                    _ => unreachable!(),
                },
            };
            assert!((with_mask.exposed_perimeter_cm - expected_cm).abs() < 1e-9, "{}", kind);
            assert!((without.exposed_perimeter_cm - expected_cm).abs() < 1e-9, "{}", kind);
            assert!((with_mask.full_perimeter_cm - expected_cm).abs() < 1e-9, "{}", kind);
        }
    }

    #[test]
    fn test_ibeam_full_exposure() {
        let geom = compute_geometry(&ibeam(), &Exposure::Full).unwrap();
        assert!((geom.exposed_perimeter_cm - 78.96).abs() < 1e-9);
        // (2*100*8.4 + 183.2*5.2) / 100
        assert!((geom.area_cm2 - 26.3264).abs() < 1e-9);
        assert_eq!(geom.kind, ShapeKind::I);
        assert_eq!(geom.support_shape, SupportShape::Poly);
        assert_eq!(geom.segment_count, Some(12));
    }

    #[test]
    fn test_ibeam_bottom_flange_shielded() {
        // Segment 6 is the outer face of the bottom flange (e.g. a beam resting on a slab)
        let mask = ExposureMask::all_exposed(12).unwrap().toggle(6);
        let geom = compute_geometry(&ibeam(), &mask.into()).unwrap();
        assert!((geom.exposed_perimeter_cm - 68.96).abs() < 1e-9);
        assert!((geom.exposed_share() - 68.96 / 78.96).abs() < 1e-12);
    }

    #[test]
    fn test_shs_top_only() {
        let mask = ExposureMask::from_bits(0b0001, 4).unwrap();
        let geom = compute_geometry(&shs(), &mask.into()).unwrap();
        assert!((geom.exposed_perimeter_cm - 10.0).abs() < 1e-12);
        // 100*100 - 90*90 = 1900 mm²
        assert!((geom.area_cm2 - 19.0).abs() < 1e-12);
        assert_eq!(geom.support_shape, SupportShape::Rect);
    }

    #[test]
    fn test_plate_sides() {
        let plate = ProfileItem::new("200x10", Section::Plate { width_mm: 200.0, t_mm: 10.0 });
        let mask = ExposureMask::from_bits(0b1011, 4).unwrap(); // top, right, left
        let geom = compute_geometry(&plate, &mask.into()).unwrap();
        assert!((geom.exposed_perimeter_cm - 22.0).abs() < 1e-12);
        assert!((geom.area_cm2 - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_pipe_half_exposed() {
        let pipe = ProfileItem::new("108x4", Section::Pipe { d_mm: 108.0, t_mm: 4.0 });
        let mask = ExposureMask::from_fraction(0.5, 12).unwrap();
        let geom = compute_geometry(&pipe, &mask.into()).unwrap();
        assert!((geom.exposed_perimeter_cm - PI * 108.0 * 0.5 / 10.0).abs() < 1e-9);
        assert!((geom.area_cm2 - PI * (108.0 * 4.0 - 16.0) / 100.0).abs() < 1e-9);
        assert_eq!(geom.segment_count, Some(12));
    }

    #[test]
    fn test_round_bar_area() {
        let bar = ProfileItem::new("40", Section::RoundBar { d_mm: 40.0 });
        let geom = compute_geometry(&bar, &Exposure::Full).unwrap();
        assert!((geom.area_cm2 - PI * 400.0 / 100.0).abs() < 1e-9);
        assert_eq!(geom.support_shape, SupportShape::Circle);
    }

    #[test]
    fn test_angle_and_channel_area() {
        let angle = ProfileItem::new("100x63x8", Section::Angle { b1_mm: 100.0, b2_mm: 63.0, t_mm: 8.0 });
        assert!((section_area_cm2(&angle) - 8.0 * 155.0 / 100.0).abs() < 1e-12);

        let channel = ProfileItem::new(
            "20П",
            Section::Channel { h_mm: 200.0, b_mm: 76.0, tw_mm: 5.2, tf_mm: 9.0 },
        );
        let expected = (2.0 * 76.0 * 9.0 + 182.0 * 5.2) / 100.0;
        assert!((section_area_cm2(&channel) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_precomputed_area_wins() {
        let item = ibeam().with_area_cm2(26.8);
        let geom = compute_geometry(&item, &Exposure::Full).unwrap();
        assert_eq!(geom.area_cm2, 26.8);
    }

    #[test]
    fn test_custom_is_manual() {
        let item = ProfileItem::new("special", Section::Custom).with_area_cm2(12.5);
        let geom = compute_geometry(&item, &Exposure::Full).unwrap();
        assert_eq!(geom.area_cm2, 12.5);
        assert!(geom.exposed_perimeter_cm.is_nan());
        assert_eq!(geom.support_shape, SupportShape::Manual);
        assert_eq!(geom.segment_count, None);

        let bare = ProfileItem::new("special", Section::Custom);
        assert!(section_area_cm2(&bare).is_nan());
    }

    #[test]
    fn test_invalid_dimensions_are_nan() {
        let item = ProfileItem::new("bad", Section::Pipe { d_mm: 108.0, t_mm: 0.0 });
        let geom = compute_geometry(&item, &Exposure::Full).unwrap();
        assert!(geom.area_cm2.is_nan());
        assert!(geom.exposed_perimeter_cm.is_nan());

        let item = ProfileItem::new("bad", Section::Angle { b1_mm: -1.0, b2_mm: 63.0, t_mm: 8.0 });
        let geom = compute_geometry(&item, &Exposure::Full).unwrap();
        assert!(geom.exposed_perimeter_cm.is_nan());
    }

    #[test]
    fn test_mask_for_wrong_outline_rejected() {
        let rect_mask = ExposureMask::all_exposed(4).unwrap();
        let err = compute_geometry(&ibeam(), &rect_mask.into()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let channel_mask = ExposureMask::all_exposed(8).unwrap();
        assert!(compute_geometry(&shs(), &channel_mask.into()).is_err());
    }

    #[test]
    fn test_circle_accepts_any_arc_count() {
        let pipe = ProfileItem::new("108x4", Section::Pipe { d_mm: 108.0, t_mm: 4.0 });
        let mask = ExposureMask::from_bits(0xFF, 16).unwrap();
        let geom = compute_geometry(&pipe, &mask.into()).unwrap();
        assert!((geom.exposed_perimeter_cm - PI * 108.0 / 20.0).abs() < 1e-9);
        assert_eq!(geom.segment_count, Some(16));
    }

    #[test]
    fn test_check_exposure_against_session_arcs() {
        let pipe = ProfileItem::new("108x4", Section::Pipe { d_mm: 108.0, t_mm: 4.0 });
        let quarter = Exposure::Mask(ExposureMask::from_bits(0b0001, 4).unwrap());
        let err = check_exposure(pipe.kind(), &quarter, 12).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(check_exposure(pipe.kind(), &quarter, 4).is_ok());

        let twelve = Exposure::Mask(ExposureMask::all_exposed(12).unwrap());
        assert!(check_exposure(ShapeKind::Round, &twelve, 12).is_ok());
        assert!(check_exposure(ShapeKind::I, &twelve, 24).is_ok());
        assert!(check_exposure(ShapeKind::Rhs, &twelve, 12).is_err());
        assert!(check_exposure(ShapeKind::Custom, &twelve, 12).is_err());
        assert!(check_exposure(ShapeKind::Custom, &Exposure::Full, 12).is_ok());
    }

    #[test]
    fn test_idempotent() {
        let mask = ExposureMask::all_exposed(12).unwrap().toggle(3);
        let a = compute_geometry(&ibeam(), &mask.into()).unwrap();
        let b = compute_geometry(&ibeam(), &mask.into()).unwrap();
        assert_eq!(a, b);
    }
}
