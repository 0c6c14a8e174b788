//! Nominatim free-text place search.

use cafemap_core::{Coordinate, Place};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::http::{build_client, read_json};
use crate::options::{Endpoint, ServiceOptions};

/// One `/search?format=json` hit. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
}

impl NominatimPlace {
    pub fn to_place(&self) -> Result<Place> {
        let parse = |field: &str, raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|e| ServiceError::Malformed {
                    service: "nominatim",
                    reason: format!("{field} {raw:?}: {e}"),
                })
        };
        Ok(Place {
            coordinate: Coordinate::new(parse("lat", &self.lat)?, parse("lon", &self.lon)?),
            label: self.display_name.clone(),
        })
    }
}

pub struct NominatimClient {
    endpoint: Endpoint,
    client: reqwest::Client,
}

impl NominatimClient {
    pub fn new(options: &ServiceOptions) -> Result<Self> {
        Ok(Self {
            endpoint: options.nominatim.clone(),
            client: build_client(options)?,
        })
    }

    /// Places matching `query`, best first. An empty list means no match.
    pub async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let url = format!("{}/search", self.endpoint.base_url());
        debug!("nominatim search \"{}\"", query);

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await?;

        let hits: Vec<NominatimPlace> = read_json("nominatim", resp).await?;
        hits.iter().map(NominatimPlace::to_place).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_json;

    #[test]
    fn string_coordinates_are_parsed() {
        let hits: Vec<NominatimPlace> = parse_json(
            "nominatim",
            r#"[{"place_id": 1, "lat": "14.5896", "lon": "120.9747",
                 "display_name": "Intramuros, Manila", "importance": 0.6}]"#,
        )
        .unwrap();
        let place = hits[0].to_place().unwrap();
        assert_eq!(place.coordinate, Coordinate::new(14.5896, 120.9747));
        assert_eq!(place.label, "Intramuros, Manila");
    }

    #[test]
    fn garbage_coordinates_are_malformed() {
        let hit = NominatimPlace {
            lat: "north".into(),
            lon: "1".into(),
            display_name: String::new(),
        };
        assert!(matches!(
            hit.to_place(),
            Err(ServiceError::Malformed { service: "nominatim", .. })
        ));
    }
}
