//! # Coating Materials
//!
//! Fire-protection coating tables and the rules for reading them.
//!
//! - [`coating_table`] - per-material tables and the nearest-lower lookup
//! - [`fire_rating`] - normalization of rating labels to table keys
//! - [`fallback`] - linear consumption model for manual thickness
//!
//! ## Example
//!
//! ```rust
//! use ptm_core::materials::{CoatingSpec, MaterialDb, MaterialTable};
//!
//! let mut table = MaterialTable::new();
//! table.insert(3.0, "R45", Some(CoatingSpec { thickness_mm: 1.1, consumption_kg_m2: 1.6 })).unwrap();
//!
//! let mut db = MaterialDb::new();
//! db.insert("ograx", table);
//!
//! let hit = db.lookup("ograx", 3.33, "R45").unwrap();
//! assert_eq!(hit.coating.thickness_mm, 1.1);
//! ```

pub mod coating_table;
pub mod fallback;
pub mod fire_rating;

pub use coating_table::{CoatingMatch, CoatingSpec, LookupMiss, MaterialDb, MaterialTable};
pub use fallback::LinearConsumptionModel;
pub use fire_rating::FireRating;
