//! Async Overpass client for café discovery.

use cafemap_core::{Coordinate, PointOfInterest};
use tracing::{debug, warn};

use crate::error::Result;
use crate::http::{build_client, read_json};
use crate::options::{Endpoint, ServiceOptions};
use crate::overpass_models::OverpassResponse;

/// Query for `amenity=cafe` nodes and ways within `radius_m` of `at`.
///
/// Ways are returned with their centre so every element has one position.
pub fn cafe_query(at: Coordinate, radius_m: u32) -> String {
    format!(
        "[out:json];\n(\n  node[\"amenity\"=\"cafe\"](around:{r},{lat},{lon});\n  \
         way[\"amenity\"=\"cafe\"](around:{r},{lat},{lon});\n);\nout center tags;",
        r = radius_m,
        lat = at.lat,
        lon = at.lon,
    )
}

/// Async client for the Overpass interpreter endpoint.
pub struct OverpassClient {
    endpoint: Endpoint,
    client: reqwest::Client,
}

impl OverpassClient {
    pub fn new(options: &ServiceOptions) -> Result<Self> {
        Ok(Self {
            endpoint: options.overpass.clone(),
            client: build_client(options)?,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Raw response for the café query around `at`.
    pub async fn query(&self, at: Coordinate, radius_m: u32) -> Result<OverpassResponse> {
        let url = self.endpoint.base_url();
        let body = cafe_query(at, radius_m);
        debug!("overpass query around {} ({} m)", at, radius_m);

        let resp = self.client.post(&url).body(body).send().await?;
        let parsed: OverpassResponse = read_json("overpass", resp).await?;
        if let Some(remark) = &parsed.remark {
            warn!("overpass remark: {}", remark);
        }
        Ok(parsed)
    }

    /// Cafés around `at`, normalized and in server order.
    pub async fn cafes_near(&self, at: Coordinate, radius_m: u32) -> Result<Vec<PointOfInterest>> {
        let resp = self.query(at, radius_m).await?;
        let total = resp.len();
        let pois = resp.into_pois();
        if pois.len() < total {
            debug!("skipped {} elements without a position", total - pois.len());
        }
        Ok(pois)
    }
}
