//! Points of interest (cafés) and their normalized attributes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Name shown for cafés whose `name` tag is missing.
pub const UNNAMED: &str = "Unnamed Cafe";

/// Stable identity of a POI within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoiId(pub String);

impl fmt::Display for PoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A café with its position and raw tag mapping.
///
/// Tags are kept verbatim so cached collections can be re-filtered without a
/// refetch; typed access goes through [`PointOfInterest::amenity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: PoiId,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl PointOfInterest {
    /// Build a POI whose id is derived from its coordinate and name.
    pub fn new(coordinate: Coordinate, tags: BTreeMap<String, String>) -> Self {
        let name = tags.get("name").map(String::as_str).unwrap_or(UNNAMED);
        let id = PoiId(format!("{:.7},{:.7}:{}", coordinate.lat, coordinate.lon, name));
        Self {
            id,
            coordinate,
            tags,
        }
    }

    /// Replace the derived id with an upstream one (e.g. `node/123`).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = PoiId(id.into());
        self
    }

    /// Raw tag value; empty strings count as absent.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.tag("name")
    }

    /// Name for display, falling back to [`UNNAMED`].
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(UNNAMED)
    }

    pub fn opening_hours(&self) -> Option<&str> {
        self.tag("opening_hours")
    }

    /// Normalized value of a yes/no amenity tag.
    pub fn amenity(&self, amenity: Amenity) -> TagValue<'_> {
        let raw = amenity.tag_keys().iter().find_map(|k| self.tag(k));
        TagValue::parse(raw)
    }
}

/// Yes/no style amenities exposed on cards and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    PaymentCards,
    Wheelchair,
    OutdoorSeating,
    Smoking,
    Toilets,
}

impl Amenity {
    /// Card row order.
    pub const ALL: [Amenity; 5] = [
        Amenity::PaymentCards,
        Amenity::Wheelchair,
        Amenity::OutdoorSeating,
        Amenity::Smoking,
        Amenity::Toilets,
    ];

    /// OSM tag keys consulted, first non-empty wins.
    pub fn tag_keys(&self) -> &'static [&'static str] {
        match self {
            // `payment:cards` is the OSM key; `payment_cards` shows up in older data.
            Self::PaymentCards => &["payment:cards", "payment_cards"],
            Self::Wheelchair => &["wheelchair"],
            Self::OutdoorSeating => &["outdoor_seating"],
            Self::Smoking => &["smoking"],
            Self::Toilets => &["toilets"],
        }
    }

    /// Label used on list cards.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PaymentCards => "Accepts Cards",
            Self::Wheelchair => "Wheelchair",
            Self::OutdoorSeating => "Outdoor Seating",
            Self::Smoking => "Smoking Area",
            Self::Toilets => "Toilet",
        }
    }
}

/// Normalized tag value. Absent and `"unknown"` collapse to [`TagValue::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagValue<'a> {
    Yes,
    No,
    Limited,
    Unknown,
    Other(&'a str),
}

impl<'a> TagValue<'a> {
    pub fn parse(raw: Option<&'a str>) -> Self {
        match raw {
            None | Some("") | Some("unknown") => Self::Unknown,
            Some("yes") => Self::Yes,
            Some("no") => Self::No,
            Some("limited") => Self::Limited,
            Some(other) => Self::Other(other),
        }
    }

    /// Only the literal `yes` counts as positive.
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }

    pub fn display(&self) -> &'a str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Limited => "Limited",
            Self::Unknown => "N/A",
            Self::Other(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cafe(tags: &[(&str, &str)]) -> PointOfInterest {
        let tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PointOfInterest::new(Coordinate::new(14.6, 121.0), tags)
    }

    #[test]
    fn missing_name_falls_back() {
        assert_eq!(cafe(&[]).display_name(), UNNAMED);
        assert_eq!(cafe(&[("name", "")]).display_name(), UNNAMED);
        assert_eq!(cafe(&[("name", "Brew Co")]).display_name(), "Brew Co");
    }

    #[test]
    fn derived_id_depends_on_name_and_position() {
        let a = cafe(&[("name", "A")]);
        let b = cafe(&[("name", "B")]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id, cafe(&[("name", "A")]).id);
        assert_eq!(a.clone().with_id("node/1").id.0, "node/1");
    }

    #[test]
    fn amenity_values_normalize() {
        let poi = cafe(&[
            ("wheelchair", "yes"),
            ("smoking", "outside"),
            ("toilets", "unknown"),
            ("outdoor_seating", "no"),
        ]);
        assert_eq!(poi.amenity(Amenity::Wheelchair), TagValue::Yes);
        assert_eq!(poi.amenity(Amenity::Smoking), TagValue::Other("outside"));
        assert_eq!(poi.amenity(Amenity::Toilets), TagValue::Unknown);
        assert_eq!(poi.amenity(Amenity::OutdoorSeating).display(), "No");
        assert_eq!(poi.amenity(Amenity::PaymentCards).display(), "N/A");
    }

    #[test]
    fn payment_cards_reads_both_keys() {
        assert!(cafe(&[("payment:cards", "yes")])
            .amenity(Amenity::PaymentCards)
            .is_yes());
        assert!(cafe(&[("payment_cards", "yes")])
            .amenity(Amenity::PaymentCards)
            .is_yes());
    }
}
