//! Overpass API data types.
//!
//! Lightweight serde models for `[out:json]` responses, covering what café
//! discovery needs: element identity, node coordinates, way centres and tags.

use std::collections::BTreeMap;

use cafemap_core::{Coordinate, PointOfInterest};
use serde::{Deserialize, Serialize};

/// Top-level `[out:json]` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,

    /// Set when the server gave up (timeout, memory), possibly with partial data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// A node (own coordinates) or way (`center` from `out center`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,

    pub id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLon>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl OverpassElement {
    /// Own coordinates first, then the way centre.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => Some(Coordinate::new(lat, lon)),
            (_, _, Some(c)) => Some(Coordinate::new(c.lat, c.lon)),
            _ => None,
        }
    }

    /// `None` for elements without any usable position.
    pub fn into_poi(self) -> Option<PointOfInterest> {
        let coordinate = self.coordinate()?;
        let id = format!("{}/{}", self.kind, self.id);
        Some(PointOfInterest::new(coordinate, self.tags).with_id(id))
    }
}

impl OverpassResponse {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Convert to cafés in server order, dropping elements without a position.
    pub fn into_pois(self) -> Vec<PointOfInterest> {
        self.elements
            .into_iter()
            .filter_map(OverpassElement::into_poi)
            .collect()
    }
}
