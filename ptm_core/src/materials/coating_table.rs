//! Coating Tables
//!
//! A coating table tells, for one fire-protection material, how thick the
//! coating must be and how much of it goes on a square metre, given the
//! reduced thickness of the steel and the required fire-resistance rating.
//!
//! ## JSON Format
//!
//! Breakpoint keys are reduced thicknesses written as text; rating keys are
//! rating labels (normalized on load, see [`FireRating`]):
//!
//! ```json
//! {
//!   "2.4": { "15": { "thickness": 0.7, "consumption": 1.05 }, "30": { "thickness": 1.5, "consumption": 2.25 } },
//!   "3":   { "15": { "thickness": 0.5, "consumption": 0.75 }, "90k": null }
//! }
//! ```
//!
//! The `{ "data": { ... } }` envelope of exported tables is accepted too.
//!
//! ## Lookup rule
//!
//! The largest breakpoint not exceeding the section's reduced thickness is
//! used. A thinner section (smaller X) heats faster and must never borrow
//! the recipe of a more massive one, so there is no rounding, no
//! interpolation and no upward extrapolation.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::fire_rating::FireRating;
use crate::errors::{read_to_string, CalcError, CalcResult};
use crate::units::f64_or_nan;

/// Required coating for one (breakpoint, rating) cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoatingSpec {
    /// Dry film thickness (mm)
    #[serde(rename = "thickness")]
    pub thickness_mm: f64,

    /// Material consumption (kg/m²), `NaN` when the table leaves it out
    #[serde(rename = "consumption", deserialize_with = "f64_or_nan")]
    pub consumption_kg_m2: f64,
}

/// Successful lookup: the cell used and where it was found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoatingMatch {
    /// Breakpoint that was selected (mm)
    pub breakpoint: f64,

    /// Breakpoint key as written in the table
    pub breakpoint_key: String,

    /// Normalized rating key
    pub rating_key: String,

    /// Thickness and consumption
    pub coating: CoatingSpec,
}

/// Why a lookup found nothing. The caller falls back to manual thickness.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum LookupMiss {
    /// No table for this material id
    #[error("no coating table for material '{material_id}'")]
    UnknownMaterial { material_id: String },

    /// Reduced thickness is NaN, infinite or not positive
    #[error("reduced thickness {value} cannot be looked up")]
    InvalidReducedThickness {
        #[serde(deserialize_with = "f64_or_nan")]
        value: f64,
    },

    /// Rating label is blank
    #[error("rating '{label}' is not a fire-resistance rating")]
    UnknownRating { label: String },

    /// Reduced thickness is below every breakpoint (or the table is empty)
    #[error("reduced thickness {value} is below the smallest breakpoint {smallest:?}")]
    BelowSmallestBreakpoint { value: f64, smallest: Option<f64> },

    /// The selected breakpoint has no entry for the rating
    #[error("breakpoint {breakpoint} has no entry for rating '{rating}'")]
    RatingMissing { breakpoint: f64, rating: String },
}

impl LookupMiss {
    /// Short code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            LookupMiss::UnknownMaterial { .. } => "UNKNOWN_MATERIAL",
            LookupMiss::InvalidReducedThickness { .. } => "INVALID_REDUCED_THICKNESS",
            LookupMiss::UnknownRating { .. } => "UNKNOWN_RATING",
            LookupMiss::BelowSmallestBreakpoint { .. } => "BELOW_SMALLEST_BREAKPOINT",
            LookupMiss::RatingMissing { .. } => "RATING_MISSING",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Breakpoint {
    value: f64,
    key: String,
    /// `None` marks a rating that is explicitly not achievable at this breakpoint
    ratings: BTreeMap<String, Option<CoatingSpec>>,
}

/// Coating table for one material, breakpoints kept in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableDocument", into = "RawTable")]
pub struct MaterialTable {
    breakpoints: Vec<Breakpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCoating {
    #[serde(default)]
    thickness: Option<f64>,
    #[serde(default)]
    consumption: Option<f64>,
}

type RawTable = BTreeMap<String, BTreeMap<String, Option<RawCoating>>>;

/// A table, bare or wrapped in the `{ "data": ... }` export envelope
struct TableDocument(RawTable);

impl<'de> Deserialize<'de> for TableDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut doc = serde_json::Value::deserialize(deserializer)?;
        let body = match doc.as_object_mut().and_then(|obj| obj.remove("data")) {
            Some(data) => data,
            None => doc,
        };
        RawTable::deserialize(body)
            .map(TableDocument)
            .map_err(de::Error::custom)
    }
}

impl TryFrom<TableDocument> for MaterialTable {
    type Error = CalcError;

    fn try_from(TableDocument(raw): TableDocument) -> CalcResult<Self> {
        let mut breakpoints = Vec::with_capacity(raw.len());
        for (key, cells) in raw {
            let value: f64 = key.trim().replace(',', ".").parse().map_err(|_| {
                CalcError::invalid_input("breakpoint", key.clone(), "Breakpoint key must be a number")
            })?;
            if !value.is_finite() {
                return Err(CalcError::invalid_input(
                    "breakpoint",
                    key,
                    "Breakpoint key must be finite",
                ));
            }

            let mut ratings = BTreeMap::new();
            for (label, cell) in cells {
                let Some(rating) = FireRating::parse(&label) else {
                    tracing::warn!(breakpoint = %key, "skipping blank rating key");
                    continue;
                };
                let spec = cell.and_then(|c| match c.thickness {
                    Some(t) if t.is_finite() && t > 0.0 => Some(CoatingSpec {
                        thickness_mm: t,
                        consumption_kg_m2: c.consumption.unwrap_or(f64::NAN),
                    }),
                    _ => None,
                });
                ratings.insert(rating.key().to_string(), spec);
            }

            breakpoints.push(Breakpoint { value, key, ratings });
        }

        breakpoints.sort_by(|a, b| a.value.total_cmp(&b.value));
        if let Some(pair) = breakpoints.windows(2).find(|w| w[0].value == w[1].value) {
            return Err(CalcError::invalid_input(
                "breakpoint",
                pair[1].key.clone(),
                format!("Duplicates breakpoint '{}'", pair[0].key),
            ));
        }
        Ok(MaterialTable { breakpoints })
    }
}

impl From<MaterialTable> for RawTable {
    fn from(table: MaterialTable) -> Self {
        table
            .breakpoints
            .into_iter()
            .map(|bp| {
                let cells = bp
                    .ratings
                    .into_iter()
                    .map(|(rating, spec)| {
                        let raw = spec.map(|s| RawCoating {
                            thickness: Some(s.thickness_mm),
                            consumption: Some(s.consumption_kg_m2).filter(|c| c.is_finite()),
                        });
                        (rating, raw)
                    })
                    .collect();
                (bp.key, cells)
            })
            .collect()
    }
}

impl MaterialTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table (bare or in a `{ "data": … }` envelope)
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set one cell. `None` marks the rating as not achievable at this breakpoint.
    pub fn insert(&mut self, breakpoint: f64, rating: &str, spec: Option<CoatingSpec>) -> CalcResult<()> {
        if !breakpoint.is_finite() {
            return Err(CalcError::invalid_input(
                "breakpoint",
                breakpoint.to_string(),
                "Breakpoint must be finite",
            ));
        }
        let rating = FireRating::parse(rating)
            .ok_or_else(|| CalcError::invalid_input("rating", rating, "Rating label is blank"))?;

        let idx = match self.breakpoints.iter().position(|bp| bp.value == breakpoint) {
            Some(idx) => idx,
            None => {
                let at = self.breakpoints.partition_point(|bp| bp.value < breakpoint);
                self.breakpoints.insert(
                    at,
                    Breakpoint {
                        value: breakpoint,
                        key: breakpoint.to_string(),
                        ratings: BTreeMap::new(),
                    },
                );
                at
            }
        };
        self.breakpoints[idx]
            .ratings
            .insert(rating.key().to_string(), spec);
        Ok(())
    }

    /// Breakpoints in ascending order
    pub fn breakpoints(&self) -> Vec<f64> {
        self.breakpoints.iter().map(|bp| bp.value).collect()
    }

    /// Every rating defined anywhere in the table, by duration,
    /// each plain rating before its construction variant
    pub fn ratings(&self) -> Vec<FireRating> {
        let mut ratings: Vec<FireRating> = self
            .breakpoints
            .iter()
            .flat_map(|bp| bp.ratings.keys())
            .filter_map(|key| FireRating::parse(key))
            .collect();
        ratings.sort();
        ratings.dedup();
        ratings
    }

    /// Check if the table has no breakpoints
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Coating for a section of reduced thickness `x_mm` and a rating label.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ptm_core::materials::MaterialTable;
    ///
    /// let table = MaterialTable::from_json_str(r#"{
    ///     "2": { "60": { "thickness": 3.0, "consumption": 4.5 } },
    ///     "4": { "60": { "thickness": 2.0, "consumption": 3.0 } },
    ///     "6": { "60": { "thickness": 1.5, "consumption": 2.2 } }
    /// }"#).unwrap();
    ///
    /// let hit = table.lookup(4.9, "R60").unwrap();
    /// assert_eq!(hit.breakpoint, 4.0);
    /// assert!(table.lookup(1.0, "R60").is_err());
    /// ```
    pub fn lookup(&self, x_mm: f64, rating: &str) -> Result<CoatingMatch, LookupMiss> {
        if !x_mm.is_finite() || x_mm <= 0.0 {
            return Err(LookupMiss::InvalidReducedThickness { value: x_mm });
        }
        let rating = FireRating::parse(rating).ok_or_else(|| LookupMiss::UnknownRating {
            label: rating.to_string(),
        })?;

        let Some(bp) = self.breakpoints.iter().rev().find(|bp| bp.value <= x_mm) else {
            let smallest = self.breakpoints.first().map(|bp| bp.value);
            tracing::debug!(x_mm, ?smallest, "reduced thickness below table");
            return Err(LookupMiss::BelowSmallestBreakpoint { value: x_mm, smallest });
        };

        match bp.ratings.get(rating.key()) {
            Some(Some(coating)) => {
                tracing::debug!(x_mm, breakpoint = bp.value, rating = rating.key(), "coating found");
                Ok(CoatingMatch {
                    breakpoint: bp.value,
                    breakpoint_key: bp.key.clone(),
                    rating_key: rating.key().to_string(),
                    coating: *coating,
                })
            }
            _ => {
                tracing::debug!(x_mm, breakpoint = bp.value, rating = rating.key(), "rating missing");
                Err(LookupMiss::RatingMissing {
                    breakpoint: bp.value,
                    rating: rating.key().to_string(),
                })
            }
        }
    }
}

/// Coating tables keyed by material id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialDb {
    materials: BTreeMap<String, MaterialTable>,
}

impl MaterialDb {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "materialId": table, … }`
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        let db: MaterialDb = serde_json::from_str(json)?;
        tracing::info!(materials = db.materials.len(), "coating tables loaded");
        Ok(db)
    }

    /// Load `{ "materialId": table, … }` from a JSON file
    pub fn load_from_json(path: impl AsRef<Path>) -> CalcResult<Self> {
        let path = path.as_ref();
        let text = read_to_string(path)?;
        Self::from_json_str(&text).map_err(|e| match e {
            CalcError::SerializationError { reason } => {
                CalcError::file_error("parse", path.display().to_string(), reason)
            }
            other => other,
        })
    }

    /// Add or replace a material's table
    pub fn insert(&mut self, material_id: impl Into<String>, table: MaterialTable) {
        self.materials.insert(material_id.into(), table);
    }

    /// A material's table
    pub fn get(&self, material_id: &str) -> CalcResult<&MaterialTable> {
        self.materials
            .get(material_id)
            .ok_or_else(|| CalcError::material_not_found(material_id))
    }

    /// All material ids
    pub fn material_ids(&self) -> Vec<&str> {
        self.materials.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Look up a coating for `material_id`, see [`MaterialTable::lookup`]
    pub fn lookup(&self, material_id: &str, x_mm: f64, rating: &str) -> Result<CoatingMatch, LookupMiss> {
        self.materials
            .get(material_id)
            .ok_or_else(|| LookupMiss::UnknownMaterial {
                material_id: material_id.to_string(),
            })?
            .lookup(x_mm, rating)
    }
}
