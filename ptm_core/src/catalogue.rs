//! Shape Catalogue
//!
//! Rolled and welded steel profiles grouped by family and standard, e.g.
//! `"Двутавр" → "ГОСТ 8239-89" → [10, 12, 14, …]`. The catalogue is produced
//! by an external conversion step and is read-only from the engine's point
//! of view.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "I-beam": {
//!     "GOST 8239-89": [
//!       { "name": "20", "kind": "i", "h": 200, "b": 100, "tw": 5.2, "tf": 8.4,
//!         "S_cm2": 26.8, "mass_kgm": 21.0 }
//!     ]
//!   }
//! }
//! ```
//!
//! Items without a `kind` (or with an unknown one) are treated as `custom`:
//! the perimeter has to be entered manually. A precomputed area or mass of
//! `0` means "unknown", which is what the converter writes for blank cells.
//!
//! ## Example
//!
//! ```rust
//! use ptm_core::catalogue::ShapeCatalogue;
//!
//! let json = r#"{ "Plate": { "Flat": [ { "name": "200x10", "kind": "plate", "B": 200, "t": 10 } ] } }"#;
//! let catalogue = ShapeCatalogue::from_json_str(json).unwrap();
//! assert_eq!(catalogue.items_for("Plate", "Flat").len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserializer, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use crate::errors::{read_to_string, CalcError, CalcResult};

/// Shape family tag, as stored in the catalogue's `kind` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// I-beam
    I,
    /// Channel
    U,
    /// Angle (equal or unequal legs)
    L,
    /// Rectangular or square hollow section
    Rhs,
    /// Circular hollow section
    Pipe,
    /// Solid round bar
    Round,
    /// Flat plate
    Plate,
    /// No formula; perimeter and area are entered manually
    Custom,
}

impl ShapeKind {
    /// All shape kinds for iteration
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::I,
        ShapeKind::U,
        ShapeKind::L,
        ShapeKind::Rhs,
        ShapeKind::Pipe,
        ShapeKind::Round,
        ShapeKind::Plate,
        ShapeKind::Custom,
    ];

    /// Parse from the catalogue tag. Unknown tags fall back to `Custom`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "i" => ShapeKind::I,
            "u" => ShapeKind::U,
            "l" => ShapeKind::L,
            "rhs" => ShapeKind::Rhs,
            "pipe" => ShapeKind::Pipe,
            "round" => ShapeKind::Round,
            "plate" => ShapeKind::Plate,
            _ => ShapeKind::Custom,
        }
    }

    /// Catalogue tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::I => "i",
            ShapeKind::U => "u",
            ShapeKind::L => "l",
            ShapeKind::Rhs => "rhs",
            ShapeKind::Pipe => "pipe",
            ShapeKind::Round => "round",
            ShapeKind::Plate => "plate",
            ShapeKind::Custom => "custom",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ShapeKind::I => "I-beam",
            ShapeKind::U => "Channel",
            ShapeKind::L => "Angle",
            ShapeKind::Rhs => "Rectangular hollow section",
            ShapeKind::Pipe => "Circular hollow section",
            ShapeKind::Round => "Round bar",
            ShapeKind::Plate => "Plate",
            ShapeKind::Custom => "Custom (manual)",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Nominal dimensions of a cross-section, in millimeters.
///
/// The variant fixes which dimensions exist, so an I-beam can never carry a
/// diameter and a pipe can never lack one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section {
    /// I-beam: depth, flange width, web thickness, flange thickness
    IBeam {
        h_mm: f64,
        b_mm: f64,
        tw_mm: f64,
        tf_mm: f64,
    },
    /// Channel: depth, flange width, web thickness, flange thickness
    Channel {
        h_mm: f64,
        b_mm: f64,
        tw_mm: f64,
        tf_mm: f64,
    },
    /// Angle: two leg lengths and a uniform thickness
    Angle { b1_mm: f64, b2_mm: f64, t_mm: f64 },
    /// Rectangular hollow section: outer height, outer width, wall thickness
    HollowRect {
        height_mm: f64,
        width_mm: f64,
        t_mm: f64,
    },
    /// Circular hollow section: outer diameter, wall thickness
    Pipe { d_mm: f64, t_mm: f64 },
    /// Solid round bar
    RoundBar { d_mm: f64 },
    /// Flat plate: width, thickness
    Plate { width_mm: f64, t_mm: f64 },
    /// Manual entry
    Custom,
}

impl Section {
    /// Shape family of this section
    pub fn kind(&self) -> ShapeKind {
        match self {
            Section::IBeam { .. } => ShapeKind::I,
            Section::Channel { .. } => ShapeKind::U,
            Section::Angle { .. } => ShapeKind::L,
            Section::HollowRect { .. } => ShapeKind::Rhs,
            Section::Pipe { .. } => ShapeKind::Pipe,
            Section::RoundBar { .. } => ShapeKind::Round,
            Section::Plate { .. } => ShapeKind::Plate,
            Section::Custom => ShapeKind::Custom,
        }
    }

    /// The dimensions this section carries, in declaration order
    pub fn dimensions(&self) -> Vec<f64> {
        match *self {
            Section::IBeam { h_mm, b_mm, tw_mm, tf_mm }
            | Section::Channel { h_mm, b_mm, tw_mm, tf_mm } => vec![h_mm, b_mm, tw_mm, tf_mm],
            Section::Angle { b1_mm, b2_mm, t_mm } => vec![b1_mm, b2_mm, t_mm],
            Section::HollowRect { height_mm, width_mm, t_mm } => vec![height_mm, width_mm, t_mm],
            Section::Pipe { d_mm, t_mm } => vec![d_mm, t_mm],
            Section::RoundBar { d_mm } => vec![d_mm],
            Section::Plate { width_mm, t_mm } => vec![width_mm, t_mm],
            Section::Custom => Vec::new(),
        }
    }

    /// True when every dimension is finite and strictly positive
    pub fn has_valid_dimensions(&self) -> bool {
        self.dimensions().iter().all(|d| d.is_finite() && *d > 0.0)
    }
}

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProfileItem", into = "RawProfileItem")]
pub struct ProfileItem {
    /// Catalogue label (e.g., "20Б1", "100x100x5")
    pub name: String,

    /// Shape family and its nominal dimensions
    pub section: Section,

    /// Precomputed cross-sectional area from the standard (cm²)
    pub area_cm2: Option<f64>,

    /// Linear mass from the standard (kg/m)
    pub linear_mass_kg_m: Option<f64>,
}

impl ProfileItem {
    /// Create an item without precomputed properties
    pub fn new(name: impl Into<String>, section: Section) -> Self {
        ProfileItem {
            name: name.into(),
            section,
            area_cm2: None,
            linear_mass_kg_m: None,
        }
    }

    /// Attach the tabulated area (cm²)
    pub fn with_area_cm2(mut self, area_cm2: f64) -> Self {
        self.area_cm2 = positive(Some(area_cm2));
        self
    }

    /// Attach the tabulated linear mass (kg/m)
    pub fn with_linear_mass(mut self, kg_m: f64) -> Self {
        self.linear_mass_kg_m = positive(Some(kg_m));
        self
    }

    /// Shape family
    pub fn kind(&self) -> ShapeKind {
        self.section.kind()
    }
}

impl std::fmt::Display for ProfileItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind().as_str())
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Flat wire form of [`ProfileItem`], matching the converter's JSON keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawProfileItem {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    b: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    b1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    b2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    t: Option<f64>,
    #[serde(rename = "H", default, skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
    #[serde(rename = "D", default, skip_serializing_if = "Option::is_none")]
    diameter: Option<f64>,
    #[serde(rename = "S_cm2", default, skip_serializing_if = "Option::is_none")]
    area_cm2: Option<f64>,
    #[serde(rename = "mass_kgm", default, skip_serializing_if = "Option::is_none")]
    mass_kg_m: Option<f64>,
}

impl From<RawProfileItem> for ProfileItem {
    fn from(raw: RawProfileItem) -> Self {
        // Absent dimensions become NaN and surface as NaN geometry, not as a load failure.
        let dim = |v: Option<f64>| v.unwrap_or(f64::NAN);
        let kind = raw
            .kind
            .as_deref()
            .map(ShapeKind::from_tag)
            .unwrap_or(ShapeKind::Custom);

        let section = match kind {
            ShapeKind::I => Section::IBeam {
                h_mm: dim(raw.h),
                b_mm: dim(raw.b),
                tw_mm: dim(raw.tw),
                tf_mm: dim(raw.tf),
            },
            ShapeKind::U => Section::Channel {
                h_mm: dim(raw.h),
                b_mm: dim(raw.b),
                tw_mm: dim(raw.tw),
                tf_mm: dim(raw.tf),
            },
            ShapeKind::L => Section::Angle {
                b1_mm: dim(raw.b1),
                b2_mm: dim(raw.b2),
                t_mm: dim(raw.t),
            },
            ShapeKind::Rhs => Section::HollowRect {
                height_mm: dim(raw.height),
                width_mm: dim(raw.width),
                t_mm: dim(raw.t),
            },
            ShapeKind::Pipe => Section::Pipe {
                d_mm: dim(raw.diameter),
                t_mm: dim(raw.t),
            },
            ShapeKind::Round => Section::RoundBar {
                d_mm: dim(raw.diameter),
            },
            ShapeKind::Plate => Section::Plate {
                width_mm: dim(raw.width),
                t_mm: dim(raw.t),
            },
            ShapeKind::Custom => Section::Custom,
        };

        ProfileItem {
            name: raw.name,
            section,
            area_cm2: positive(raw.area_cm2),
            linear_mass_kg_m: positive(raw.mass_kg_m),
        }
    }
}

impl From<ProfileItem> for RawProfileItem {
    fn from(item: ProfileItem) -> Self {
        let finite = |v: f64| Some(v).filter(|v| v.is_finite());
        let mut raw = RawProfileItem {
            name: item.name,
            kind: Some(item.section.kind().as_str().to_string()),
            area_cm2: item.area_cm2,
            mass_kg_m: item.linear_mass_kg_m,
            ..RawProfileItem::default()
        };

        match item.section {
            Section::IBeam { h_mm, b_mm, tw_mm, tf_mm }
            | Section::Channel { h_mm, b_mm, tw_mm, tf_mm } => {
                raw.h = finite(h_mm);
                raw.b = finite(b_mm);
                raw.tw = finite(tw_mm);
                raw.tf = finite(tf_mm);
            }
            Section::Angle { b1_mm, b2_mm, t_mm } => {
                raw.b1 = finite(b1_mm);
                raw.b2 = finite(b2_mm);
                raw.t = finite(t_mm);
            }
            Section::HollowRect { height_mm, width_mm, t_mm } => {
                raw.height = finite(height_mm);
                raw.width = finite(width_mm);
                raw.t = finite(t_mm);
            }
            Section::Pipe { d_mm, t_mm } => {
                raw.diameter = finite(d_mm);
                raw.t = finite(t_mm);
            }
            Section::RoundBar { d_mm } => raw.diameter = finite(d_mm),
            Section::Plate { width_mm, t_mm } => {
                raw.width = finite(width_mm);
                raw.t = finite(t_mm);
            }
            Section::Custom => {}
        }
        raw
    }
}

// ============================================================================
// Named groups in file order
// ============================================================================

/// JSON object kept in document order. Families and standards are listed
/// the way the converter wrote them, not alphabetically.
#[derive(Debug, Clone, PartialEq)]
struct Groups<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for Groups<V> {
    fn default() -> Self {
        Groups { entries: Vec::new() }
    }
}

impl<V> Groups<V> {
    fn get(&self, name: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// A repeated name replaces the earlier value in its original position
    fn insert(&mut self, name: String, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    fn entry_or_default(&mut self, name: String) -> &mut V
    where
        V: Default,
    {
        let index = match self.entries.iter().position(|(k, _)| *k == name) {
            Some(i) => i,
            None => {
                self.entries.push((name, V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<V: Serialize> Serialize for Groups<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Groups<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for GroupsVisitor<V> {
            type Value = Groups<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of named groups")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut groups = Groups::default();
                while let Some((name, value)) = map.next_entry::<String, V>()? {
                    groups.insert(name, value);
                }
                Ok(groups)
            }
        }

        deserializer.deserialize_map(GroupsVisitor(PhantomData))
    }
}

/// Profile catalogue: family → standard → ordered profile list, all in
/// file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeCatalogue {
    families: Groups<Groups<Vec<ProfileItem>>>,
}

impl ShapeCatalogue {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalogue from its JSON text
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        let catalogue: ShapeCatalogue = serde_json::from_str(json)?;
        tracing::info!(
            families = catalogue.families.len(),
            profiles = catalogue.len(),
            "shape catalogue loaded"
        );
        Ok(catalogue)
    }

    /// Load a catalogue from a JSON file
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

    /// Append a profile under the given family and standard
    pub fn insert(
        &mut self,
        family: impl Into<String>,
        standard: impl Into<String>,
        item: ProfileItem,
    ) {
        self.families
            .entry_or_default(family.into())
            .entry_or_default(standard.into())
            .push(item);
    }

    /// All family names in catalogue order
    pub fn families(&self) -> Vec<&str> {
        self.families.keys().collect()
    }

    /// Standards available for a family (empty when the family is unknown)
    pub fn standards_for(&self, family: &str) -> Vec<&str> {
        self.families
            .get(family)
            .map(|stds| stds.keys().collect())
            .unwrap_or_default()
    }

    /// Profiles of a family/standard in catalogue order (empty when unknown)
    pub fn items_for(&self, family: &str, standard: &str) -> &[ProfileItem] {
        self.families
            .get(family)
            .and_then(|stds| stds.get(standard))
            .map(|items| items.as_slice())
            .unwrap_or(&[])
    }

    /// Look up a single profile by name
    pub fn find(&self, family: &str, standard: &str, name: &str) -> CalcResult<&ProfileItem> {
        self.items_for(family, standard)
            .iter()
            .find(|item| item.name == name)
            .ok_or_else(|| CalcError::profile_not_found(family, standard, name))
    }

    /// Case-insensitive substring search on profile names
    pub fn search(&self, family: &str, standard: &str, pattern: &str) -> Vec<&ProfileItem> {
        let needle = pattern.trim().to_lowercase();
        self.items_for(family, standard)
            .iter()
            .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Total number of profiles
    pub fn len(&self) -> usize {
        self.families
            .values()
            .flat_map(|stds| stds.values())
            .map(|items| items.len())
            .sum()
    }

    /// Check if the catalogue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
