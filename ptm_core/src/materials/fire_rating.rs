//! Fire-resistance rating labels
//!
//! Ratings reach the engine as display labels ("R60", "R 90", "R120 к",
//! "REI 45") and must be matched against the keys of a coating table, which
//! are usually bare minute counts ("60") with a `k` suffix for the
//! "constructive" variant of a rating ("90k").

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A rating label reduced to its table key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FireRating {
    key: String,
}

impl FireRating {
    /// Normalize a label.
    ///
    /// Strips the leading rating-family letters (`R`, `REI`, ...), keeps the
    /// duration and appends `k` for construction markers (`k`, `к`,
    /// "construction", "конструктивная"). Returns `None` for a blank label.
    ///
    /// ```rust
    /// use ptm_core::materials::FireRating;
    ///
    /// assert_eq!(FireRating::parse("R60").unwrap().key(), "60");
    /// assert_eq!(FireRating::parse("R 90 К").unwrap().key(), "90k");
    /// assert_eq!(FireRating::parse("REI 120 (construction)").unwrap().key(), "120k");
    /// assert!(FireRating::parse("  ").is_none());
    /// ```
    pub fn parse(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        let body = lower.trim_start_matches(|c: char| c.is_alphabetic() || c.is_whitespace());

        let digits_end = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
            .unwrap_or(body.len());
        let number = canonical_number(&body[..digits_end]);
        let rest = body[digits_end..].trim();

        let construction = rest.starts_with('k')
            || rest.starts_with('к')
            || lower.contains("construct")
            || lower.contains("конструктив");

        let key = if number.is_empty() {
            // No duration at all: keep the label text as its own key
            lower.clone()
        } else if construction {
            format!("{}k", number)
        } else {
            number
        };

        if key.is_empty() {
            None
        } else {
            Some(FireRating { key })
        }
    }

    /// Internal table key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Duration in minutes, when the key carries one
    pub fn minutes(&self) -> Option<f64> {
        if !self.key.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        self.key.trim_end_matches('k').parse().ok()
    }

    /// Whether this is the construction variant of a rating
    pub fn is_construction(&self) -> bool {
        self.minutes().is_some() && self.key.ends_with('k')
    }

    /// Display label, e.g. `R90` or `R90k`
    pub fn label(&self) -> String {
        if self.minutes().is_some() {
            format!("R{}", self.key)
        } else {
            self.key.clone()
        }
    }
}

/// "60" and "60.0" both become "60"; text that is not a number is kept.
fn canonical_number(text: &str) -> String {
    let text = text.replace(',', ".");
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => format!("{}", n),
        _ => text,
    }
}

/// By duration, each plain rating before its construction variant, ratings
/// without a duration last.
impl Ord for FireRating {
    fn cmp(&self, other: &Self) -> Ordering {
        let minutes = |r: &FireRating| r.minutes().unwrap_or(f64::INFINITY);
        minutes(self)
            .total_cmp(&minutes(other))
            .then_with(|| self.is_construction().cmp(&other.is_construction()))
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for FireRating {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for FireRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
