//! # Exposure Masks
//!
//! Which parts of a section's outline are heated by the fire. Every outline
//! is split into segments and a mask holds one bit per segment:
//!
//! | outline | segments | bit order |
//! |---|---|---|
//! | rect (`rhs`, `plate`) | 4 | top, right, bottom, left |
//! | circle (`pipe`, `round`) | N equal arcs (default 12) | clockwise from 12 o'clock |
//! | poly (`i`, `u`, `l`) | 12 / 8 / 6 | see [`crate::geometry::outline_segments`] |
//!
//! A mask is never empty: a section always exposes at least one segment.
//! Masks are values. Transitions return a new mask and the caller threads it
//! through; a mask built for one family is rejected by another family whose
//! outline has a different segment count.
//!
//! ## Example
//!
//! ```rust
//! use ptm_core::exposure::ExposureMask;
//!
//! let mask = ExposureMask::all_exposed(4).unwrap();
//! let only_top = mask.toggle(1).toggle(2).toggle(3);
//! assert_eq!(only_top.bits(), 0b0001);
//!
//! // The last exposed side cannot be switched off
//! assert_eq!(only_top.toggle(0), only_top);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalogue::ShapeKind;
use crate::errors::{CalcError, CalcResult};

/// Largest segment count a mask can hold
pub const MAX_SEGMENTS: usize = 32;

/// Default number of arcs a circular outline is split into
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 12;

/// Sides of a rectangular outline
pub const RECT_SIDES: usize = 4;

/// Bit per segment selection. Always has at least one bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MaskRepr", into = "MaskRepr")]
pub struct ExposureMask {
    bits: u32,
    segments: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MaskRepr {
    bits: u32,
    segments: usize,
}

impl TryFrom<MaskRepr> for ExposureMask {
    type Error = CalcError;

    fn try_from(repr: MaskRepr) -> CalcResult<Self> {
        ExposureMask::from_bits(repr.bits, repr.segments)
    }
}

impl From<ExposureMask> for MaskRepr {
    fn from(mask: ExposureMask) -> Self {
        MaskRepr {
            bits: mask.bits,
            segments: mask.segments(),
        }
    }
}

fn full_bits(segments: usize) -> u32 {
    if segments >= 32 {
        u32::MAX
    } else {
        (1u32 << segments) - 1
    }
}

fn check_segments(segments: usize) -> CalcResult<()> {
    if segments == 0 || segments > MAX_SEGMENTS {
        return Err(CalcError::invalid_input(
            "segments",
            segments.to_string(),
            format!("Segment count must be between 1 and {}", MAX_SEGMENTS),
        ));
    }
    Ok(())
}

impl ExposureMask {
    /// Mask with every one of `segments` segments exposed.
    pub fn all_exposed(segments: usize) -> CalcResult<Self> {
        check_segments(segments)?;
        Ok(ExposureMask {
            bits: full_bits(segments),
            segments: segments as u8,
        })
    }

    /// Mask from a raw bit pattern.
    ///
    /// Bits above `segments` are dropped; an empty pattern becomes segment 0.
    pub fn from_bits(bits: u32, segments: usize) -> CalcResult<Self> {
        check_segments(segments)?;
        let bits = bits & full_bits(segments);
        Ok(ExposureMask {
            bits: if bits == 0 { 1 } else { bits },
            segments: segments as u8,
        })
    }

    /// Rebuild a circular selection from a stored exposed fraction.
    ///
    /// The lowest `round(fraction * segments)` arcs are exposed, at least one.
    pub fn from_fraction(fraction: f64, segments: usize) -> CalcResult<Self> {
        check_segments(segments)?;
        if !fraction.is_finite() {
            return Err(CalcError::invalid_input(
                "fraction",
                fraction.to_string(),
                "Exposed fraction must be a finite number",
            ));
        }
        let count = (fraction.clamp(0.0, 1.0) * segments as f64).round() as usize;
        Self::from_bits(full_bits(count.max(1)), segments)
    }

    /// Flip one segment. Switching off the last exposed segment is a no-op.
    /// Indices outside the outline leave the mask unchanged.
    pub fn toggle(self, index: usize) -> Self {
        if index >= self.segments() {
            return self;
        }
        let bit = 1u32 << index;
        let bits = self.bits ^ bit;
        ExposureMask {
            bits: if bits == 0 { bit } else { bits },
            segments: self.segments,
        }
    }

    /// Whether segment `index` is exposed
    pub fn is_exposed(&self, index: usize) -> bool {
        index < self.segments() && self.bits & (1u32 << index) != 0
    }

    /// Number of exposed segments
    pub fn exposed_count(&self) -> u32 {
        self.bits.count_ones()
    }

    /// Number of segments in the outline
    pub fn segments(&self) -> usize {
        self.segments as usize
    }

    /// Raw bit pattern
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Exposed share of an outline made of equal segments (circles)
    pub fn exposed_fraction(&self) -> f64 {
        self.exposed_count() as f64 / self.segments() as f64
    }
}

/// Sum the lengths of the selected segments.
///
/// `None` selects the whole outline. A selection that covers none of the
/// given segments falls back to segment 0. An empty list gives `NaN`.
pub fn sum_selected_lengths(lengths: &[f64], mask: Option<&ExposureMask>) -> f64 {
    if lengths.is_empty() {
        return f64::NAN;
    }
    let usable = full_bits(lengths.len().min(MAX_SEGMENTS));
    let mut bits = mask.map(|m| m.bits()).unwrap_or(usable) & usable;
    if bits == 0 {
        bits = 1;
    }
    lengths
        .iter()
        .take(MAX_SEGMENTS)
        .enumerate()
        .filter(|(i, _)| bits & (1u32 << i) != 0)
        .map(|(_, len)| len)
        .sum()
}

/// Outline type of a shape family, used to pick the exposure editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportShape {
    /// Four sides: top, right, bottom, left
    Rect,
    /// Equal arcs
    Circle,
    /// Polygon segments
    Poly,
    /// No outline; perimeter entered by hand
    Manual,
}

impl SupportShape {
    /// Outline type for a shape family
    pub fn for_kind(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Rhs | ShapeKind::Plate => SupportShape::Rect,
            ShapeKind::Pipe | ShapeKind::Round => SupportShape::Circle,
            ShapeKind::I | ShapeKind::U | ShapeKind::L => SupportShape::Poly,
            ShapeKind::Custom => SupportShape::Manual,
        }
    }

    /// Tag used by visualizers
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportShape::Rect => "rect",
            SupportShape::Circle => "circle",
            SupportShape::Poly => "poly",
            SupportShape::Manual => "manual",
        }
    }
}

/// Number of mask segments for a shape family (`None` for manual entry)
pub fn segment_count(kind: ShapeKind, circle_segments: usize) -> Option<usize> {
    match kind {
        ShapeKind::Rhs | ShapeKind::Plate => Some(RECT_SIDES),
        ShapeKind::Pipe | ShapeKind::Round => Some(circle_segments),
        ShapeKind::I => Some(12),
        ShapeKind::U => Some(8),
        ShapeKind::L => Some(6),
        ShapeKind::Custom => None,
    }
}

/// Exposure handed to the geometry engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "mask")]
pub enum Exposure {
    /// Whole outline heated
    #[default]
    Full,
    /// Selected segments only
    Mask(ExposureMask),
}

impl Exposure {
    /// Fully exposed mask for a family, as created when the family changes
    pub fn default_for(kind: ShapeKind, circle_segments: usize) -> CalcResult<Self> {
        match segment_count(kind, circle_segments) {
            Some(n) => Ok(Exposure::Mask(ExposureMask::all_exposed(n)?)),
            None => Ok(Exposure::Full),
        }
    }

    /// The mask, if any
    pub fn mask(&self) -> Option<&ExposureMask> {
        match self {
            Exposure::Full => None,
            Exposure::Mask(mask) => Some(mask),
        }
    }
}

impl From<ExposureMask> for Exposure {
    fn from(mask: ExposureMask) -> Self {
        Exposure::Mask(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exposed() {
        assert_eq!(ExposureMask::all_exposed(4).unwrap().bits(), 0b1111);
        assert_eq!(ExposureMask::all_exposed(12).unwrap().bits(), 0xFFF);
        assert_eq!(ExposureMask::all_exposed(32).unwrap().bits(), u32::MAX);
        assert!(ExposureMask::all_exposed(0).is_err());
        assert!(ExposureMask::all_exposed(33).is_err());
    }

    #[test]
    fn test_toggle_never_empties() {
        let mask = ExposureMask::from_bits(0b0100, 4).unwrap();
        let again = mask.toggle(2);
        assert_eq!(again.bits(), 0b0100);

        // Walk every segment off in turn; the last one sticks
        let mut mask = ExposureMask::all_exposed(6).unwrap();
        for i in 0..6 {
            mask = mask.toggle(i);
            assert_ne!(mask.bits(), 0);
        }
        assert_eq!(mask.bits(), 1 << 5);
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mask = ExposureMask::all_exposed(4).unwrap();
        assert_eq!(mask.toggle(4), mask);
        assert!(!mask.is_exposed(7));
    }

    #[test]
    fn test_from_bits() {
        let mask = ExposureMask::from_bits(0b1_0010, 4).unwrap();
        assert_eq!(mask.bits(), 0b0010);
        assert_eq!(ExposureMask::from_bits(0, 8).unwrap().bits(), 1);
        assert_eq!(ExposureMask::from_bits(0b1_0000, 4).unwrap().bits(), 1);
    }

    #[test]
    fn test_exposed_fraction() {
        let mut mask = ExposureMask::all_exposed(12).unwrap();
        assert_eq!(mask.exposed_fraction(), 1.0);
        for i in 0..3 {
            mask = mask.toggle(i);
        }
        assert!((mask.exposed_fraction() - 0.75).abs() < 1e-12);
        assert_eq!(mask.exposed_count(), 9);
    }

    #[test]
    fn test_from_fraction() {
        let mask = ExposureMask::from_fraction(0.5, 12).unwrap();
        assert_eq!(mask.bits(), 0b0000_0011_1111);
        assert_eq!(ExposureMask::from_fraction(0.0, 12).unwrap().exposed_count(), 1);
        assert_eq!(ExposureMask::from_fraction(1.7, 12).unwrap().exposed_count(), 12);
        assert!(ExposureMask::from_fraction(f64::NAN, 12).is_err());
    }

    #[test]
    fn test_sum_selected_lengths() {
        let lens = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(sum_selected_lengths(&lens, None), 100.0);

        let mask = ExposureMask::from_bits(0b0101, 4).unwrap();
        assert_eq!(sum_selected_lengths(&lens, Some(&mask)), 40.0);

        assert!(sum_selected_lengths(&[], None).is_nan());
    }

    #[test]
    fn test_sum_selected_floor_to_first_segment() {
        // Selection only covers segments the list does not have
        let lens = [10.0, 20.0];
        let mask = ExposureMask::from_bits(0b1000, 4).unwrap();
        assert_eq!(sum_selected_lengths(&lens, Some(&mask)), 10.0);
    }

    #[test]
    fn test_sum_selected_monotonic() {
        let lens = [100.0, 8.4, 47.4, 183.2, 47.4, 8.4, 100.0, 8.4, 47.4, 183.2, 47.4, 8.4];
        let mut mask = ExposureMask::from_bits(1, 12).unwrap();
        let mut last = sum_selected_lengths(&lens, Some(&mask));
        for i in 1..12 {
            mask = mask.toggle(i);
            let now = sum_selected_lengths(&lens, Some(&mask));
            assert!(now >= last);
            last = now;
        }
        assert!((last - 789.6).abs() < 1e-9);
    }

    #[test]
    fn test_support_shapes() {
        assert_eq!(SupportShape::for_kind(ShapeKind::Plate), SupportShape::Rect);
        assert_eq!(SupportShape::for_kind(ShapeKind::Round), SupportShape::Circle);
        assert_eq!(SupportShape::for_kind(ShapeKind::L), SupportShape::Poly);
        assert_eq!(SupportShape::for_kind(ShapeKind::Custom).as_str(), "manual");
        assert_eq!(serde_json::to_string(&SupportShape::Poly).unwrap(), "\"poly\"");
    }

    #[test]
    fn test_default_exposure() {
        let exp = Exposure::default_for(ShapeKind::I, DEFAULT_CIRCLE_SEGMENTS).unwrap();
        assert_eq!(exp.mask().map(|m| m.segments()), Some(12));
        let exp = Exposure::default_for(ShapeKind::Pipe, 16).unwrap();
        assert_eq!(exp.mask().map(|m| m.bits()), Some(0xFFFF));
        assert_eq!(Exposure::default_for(ShapeKind::Custom, 12).unwrap(), Exposure::Full);
        assert!(Exposure::default_for(ShapeKind::Round, 0).is_err());
    }

    #[test]
    fn test_mask_serialization_validates() {
        let mask = ExposureMask::from_bits(0b1010, 4).unwrap();
        let json = serde_json::to_string(&mask).unwrap();
        assert_eq!(json, r#"{"bits":10,"segments":4}"#);
        let back: ExposureMask = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mask);

        assert!(serde_json::from_str::<ExposureMask>(r#"{"bits":1,"segments":40}"#).is_err());
    }
}
