//! Built-in sample data
//!
//! A handful of common Russian profiles and one coating table, for demos and
//! tests without any JSON files. Real projects load the full catalogue and
//! the manufacturer's tables instead.

use once_cell::sync::Lazy;

use crate::catalogue::{ProfileItem, Section, ShapeCatalogue};
use crate::calculations::row_estimate::round_to;
use crate::materials::{CoatingSpec, MaterialDb, MaterialTable};
use crate::settings::DEFAULT_MATERIAL;

/// Sample catalogue, built on first use
pub fn builtin_sample_catalogue() -> &'static ShapeCatalogue {
    static CATALOGUE: Lazy<ShapeCatalogue> = Lazy::new(build_catalogue);
    &CATALOGUE
}

/// Sample coating tables, built on first use
pub fn builtin_sample_materials() -> &'static MaterialDb {
    static MATERIALS: Lazy<MaterialDb> = Lazy::new(build_materials);
    &MATERIALS
}

// ============================================================================
// Profiles
// ============================================================================

fn build_catalogue() -> ShapeCatalogue {
    let mut cat = ShapeCatalogue::new();

    // I-beams: areas are left to the formula, masses are tabulated
    let i_beams = [
        ("10", 100.0, 55.0, 4.5, 7.2, 9.46),
        ("12", 120.0, 64.0, 4.8, 7.3, 11.5),
        ("14", 140.0, 73.0, 4.9, 7.5, 13.7),
        ("16", 160.0, 81.0, 5.0, 7.8, 15.9),
        ("20", 200.0, 100.0, 5.2, 8.4, 21.0),
    ];
    for (name, h, b, tw, tf, mass) in i_beams {
        let section = Section::IBeam { h_mm: h, b_mm: b, tw_mm: tw, tf_mm: tf };
        cat.insert("I-beam", "GOST 8239-89", ProfileItem::new(name, section).with_linear_mass(mass));
    }

    let channels = [
        ("10U", 100.0, 46.0, 4.5, 7.6, 10.9, 8.59),
        ("12U", 120.0, 52.0, 4.8, 7.8, 13.3, 10.4),
        ("16U", 160.0, 64.0, 5.0, 8.4, 18.1, 14.2),
        ("20U", 200.0, 76.0, 5.2, 9.0, 23.4, 18.4),
    ];
    for (name, h, b, tw, tf, area, mass) in channels {
        let section = Section::Channel { h_mm: h, b_mm: b, tw_mm: tw, tf_mm: tf };
        cat.insert(
            "Channel",
            "GOST 8240-97",
            ProfileItem::new(name, section).with_area_cm2(area).with_linear_mass(mass),
        );
    }

    let angles = [
        ("50x5", 50.0, 5.0, 3.77),
        ("63x6", 63.0, 6.0, 5.72),
        ("75x6", 75.0, 6.0, 6.89),
        ("100x8", 100.0, 8.0, 12.25),
    ];
    for (name, b, t, mass) in angles {
        let section = Section::Angle { b1_mm: b, b2_mm: b, t_mm: t };
        cat.insert("Angle", "GOST 8509-93", ProfileItem::new(name, section).with_linear_mass(mass));
    }

    for (name, side, t) in [("80x4", 80.0, 4.0), ("100x5", 100.0, 5.0), ("120x6", 120.0, 6.0)] {
        let section = Section::HollowRect { height_mm: side, width_mm: side, t_mm: t };
        cat.insert("Square hollow", "GOST 30245-2003", ProfileItem::new(name, section));
    }

    for (name, d, t) in [("108x4", 108.0, 4.0), ("159x6", 159.0, 6.0), ("219x8", 219.0, 8.0)] {
        cat.insert("Pipe", "GOST 10704-91", ProfileItem::new(name, Section::Pipe { d_mm: d, t_mm: t }));
    }

    for d in [20.0, 30.0, 40.0] {
        cat.insert(
            "Round bar",
            "GOST 2590-2006",
            ProfileItem::new(format!("{}", d), Section::RoundBar { d_mm: d }),
        );
    }

    for (name, width, t) in [("200x10", 200.0, 10.0), ("300x12", 300.0, 12.0)] {
        cat.insert(
            "Plate",
            "GOST 19903-2015",
            ProfileItem::new(name, Section::Plate { width_mm: width, t_mm: t }),
        );
    }

    cat
}

// ============================================================================
// Coating tables
// ============================================================================

/// Wet consumption per millimetre of dry film (kg/m²/mm)
const CONSUMPTION_PER_MM: f64 = 1.38;

const RATINGS: [&str; 6] = ["R15", "R30", "R45", "R60", "R90", "R120"];

/// Dry film thickness (mm) per breakpoint; 0.0 marks an empty cell
const THICKNESS_ROWS: [(f64, [f64; 6]); 9] = [
    (2.4, [0.52, 0.94, 1.52, 2.30, 0.0, 0.0]),
    (3.0, [0.44, 0.78, 1.24, 1.86, 3.40, 0.0]),
    (3.4, [0.40, 0.70, 1.10, 1.64, 2.98, 0.0]),
    (4.0, [0.36, 0.62, 0.96, 1.42, 2.56, 4.10]),
    (5.0, [0.32, 0.52, 0.80, 1.18, 2.10, 3.36]),
    (6.0, [0.28, 0.46, 0.68, 1.00, 1.78, 2.84]),
    (7.0, [0.26, 0.40, 0.60, 0.88, 1.54, 2.46]),
    (8.0, [0.24, 0.36, 0.54, 0.78, 1.36, 2.16]),
    (10.0, [0.22, 0.30, 0.44, 0.64, 1.10, 1.74]),
];

fn build_materials() -> MaterialDb {
    let mut table = MaterialTable::new();
    for (breakpoint, row) in THICKNESS_ROWS {
        for (rating, thickness) in RATINGS.iter().zip(row) {
            let spec = (thickness > 0.0).then(|| CoatingSpec {
                thickness_mm: thickness,
                consumption_kg_m2: round_to(thickness * CONSUMPTION_PER_MM, 3),
            });
            // Breakpoints are distinct and ratings non-blank
            if let Err(e) = table.insert(breakpoint, rating, spec) {
                tracing::warn!(error = %e, "sample coating cell rejected");
            }
        }
    }

    let mut db = MaterialDb::new();
    db.insert(DEFAULT_MATERIAL, table);
    db
}
