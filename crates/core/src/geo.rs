//! Geographic primitives: coordinates, quantized cache cells and geocoded places.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Manila city centre, used whenever no device fix is available.
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 14.5995,
    lon: 120.9842,
};

/// Tolerance (degrees) under which two coordinates name the same café.
pub const MATCH_TOLERANCE: f64 = 0.0001;

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both axes differ by less than [`MATCH_TOLERANCE`].
    pub fn same_place(&self, other: &Coordinate) -> bool {
        (self.lat - other.lat).abs() < MATCH_TOLERANCE
            && (self.lon - other.lon).abs() < MATCH_TOLERANCE
    }

    /// Quantize to `precision` decimal places on each axis.
    pub fn cell(&self, precision: usize) -> CellKey {
        CellKey::new(self, precision)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Parses `"lat,lon"`.
impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidParameter {
            name: "coordinate",
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| invalid("expected \"lat,lon\""))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| invalid("latitude is not a number"))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| invalid("longitude is not a number"))?;

        if !lat.is_finite() || !lon.is_finite() {
            return Err(invalid("coordinates must be finite"));
        }
        Ok(Self { lat, lon })
    }
}

/// A coordinate rounded to a fixed number of decimals, used as a cache key.
///
/// Three decimals is a ~111 m grid; the rendered key is
/// `cafes_<lat>_<lon>` with each axis printed at that precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    lat: String,
    lon: String,
}

impl CellKey {
    pub fn new(coord: &Coordinate, precision: usize) -> Self {
        Self {
            lat: format!("{:.*}", precision, coord.lat),
            lon: format!("{:.*}", precision, coord.lon),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cafes_{}_{}", self.lat, self.lon)
    }
}

/// A geocoder hit: where it is and what the service called it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub coordinate: Coordinate,
    pub label: String,
}
