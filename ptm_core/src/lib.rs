//! # ptm_core - Fire-Protection Coating Calculation Engine
//!
//! `ptm_core` computes how much intumescent coating a steel member needs.
//! From a catalogue profile and the set of outline segments exposed to fire
//! it derives the cross-sectional area, the heated perimeter and the reduced
//! metal thickness, then reads the manufacturer's table for the coating
//! thickness and consumption at a required fire-resistance rating.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions over plain values; tables are read-only
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **No panics on bad data**: undefined quantities are `NaN`, missing table
//!   entries are a [`LookupMiss`], contract violations are a [`CalcError`]
//!
//! ## Quick Start
//!
//! ```rust
//! use ptm_core::exposure::{Exposure, ExposureMask};
//! use ptm_core::geometry::compute_geometry;
//! use ptm_core::reduced_thickness::reduced_thickness;
//! use ptm_core::samples::{builtin_sample_catalogue, builtin_sample_materials};
//!
//! let beam = builtin_sample_catalogue().find("I-beam", "GOST 8239-89", "20").unwrap();
//!
//! // Bottom flange shielded by a slab
//! let mask = ExposureMask::all_exposed(12).unwrap().toggle(6);
//! let geom = compute_geometry(beam, &Exposure::Mask(mask)).unwrap();
//! let x = reduced_thickness(geom.area_cm2, geom.exposed_perimeter_cm);
//!
//! let hit = builtin_sample_materials().lookup("ograx", x, "R60").unwrap();
//! assert_eq!(hit.breakpoint, 3.4);
//! ```
//!
//! ## Modules
//!
//! - [`catalogue`] - Profile catalogue and section dimensions
//! - [`exposure`] - Fire-exposure masks over outline segments
//! - [`geometry`] - Area and heated perimeter
//! - [`reduced_thickness`] - Reduced metal thickness and heated surface
//! - [`materials`] - Coating tables and rating normalization
//! - [`calculations`] - Row estimates built from the engines
//! - [`settings`] - Engine settings and display precision
//! - [`samples`] - Built-in sample catalogue and coating table
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod catalogue;
pub mod errors;
pub mod exposure;
pub mod geometry;
pub mod materials;
pub mod reduced_thickness;
pub mod samples;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{estimate_row, RowEstimate, RowInput};
pub use catalogue::{ProfileItem, Section, ShapeCatalogue, ShapeKind};
pub use errors::{CalcError, CalcResult};
pub use exposure::{Exposure, ExposureMask};
pub use geometry::{compute_geometry, SectionGeometry};
pub use materials::{LookupMiss, MaterialDb};
pub use settings::EngineSettings;
