//! OSRM route service client.
//!
//! Requests full GeoJSON geometry and steps so the result carries both the
//! drawable path and turn-by-turn directions.

use cafemap_core::{Coordinate, Instruction, Route, TravelMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::http::{build_client, excerpt, parse_json};
use crate::options::{Endpoint, ServiceOptions};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsrmResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsrmRoute {
    pub distance: f64,
    pub duration: f64,
    pub geometry: LineString,
    #[serde(default)]
    pub legs: Vec<OsrmLeg>,
}

/// GeoJSON `LineString`; positions are `[lon, lat]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineString {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsrmLeg {
    #[serde(default)]
    pub steps: Vec<OsrmStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsrmStep {
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub name: String,
    pub maneuver: Maneuver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maneuver {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(default)]
    pub exit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

impl Maneuver {
    /// Short English instruction, e.g. `"Turn left onto Taft Avenue"`.
    pub fn describe(&self, road: &str) -> String {
        let modifier = self.modifier.as_deref().unwrap_or("");
        let onto = |base: String| {
            if road.is_empty() {
                base
            } else {
                format!("{base} onto {road}")
            }
        };
        match self.kind.as_str() {
            "depart" => {
                if road.is_empty() {
                    "Head out".to_string()
                } else {
                    format!("Head out on {road}")
                }
            }
            "arrive" => "You have arrived at your destination".to_string(),
            "roundabout" | "rotary" => match self.exit {
                Some(n) => format!("At the roundabout, take exit {n}"),
                None => "Enter the roundabout".to_string(),
            },
            "continue" | "new name" => onto("Continue".to_string()),
            "merge" => onto(join("Merge", modifier)),
            "on ramp" | "off ramp" => join("Take the ramp", modifier),
            "fork" => onto(join("Keep", modifier)),
            "end of road" | "turn" => onto(join("Turn", modifier)),
            other => onto(join(&capitalize(other), modifier)),
        }
    }
}

fn join(verb: &str, modifier: &str) -> String {
    if modifier.is_empty() {
        verb.to_string()
    } else {
        format!("{verb} {modifier}")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl OsrmResponse {
    /// First route, or the service's refusal as [`ServiceError::Routing`].
    pub fn into_route(self) -> Result<Route> {
        if self.code != "Ok" {
            return Err(ServiceError::Routing {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        let route = self.routes.into_iter().next().ok_or_else(|| ServiceError::Routing {
            code: "NoRoute".to_string(),
            message: "no routes returned".to_string(),
        })?;

        let path = route
            .geometry
            .coordinates
            .iter()
            .map(|[lon, lat]| Coordinate::new(*lat, *lon))
            .collect();
        let instructions = route
            .legs
            .iter()
            .flat_map(|leg| leg.steps.iter())
            .map(|step| Instruction {
                text: step.maneuver.describe(&step.name),
                distance_m: step.distance,
                duration_s: step.duration,
            })
            .collect();

        Ok(Route {
            path,
            distance_m: route.distance,
            duration_s: route.duration,
            instructions,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OsrmClient {
    endpoint: Endpoint,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(options: &ServiceOptions) -> Result<Self> {
        Ok(Self {
            endpoint: options.osrm.clone(),
            client: build_client(options)?,
        })
    }

    pub fn route_url(&self, origin: Coordinate, destination: Coordinate, mode: TravelMode) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.endpoint.base_url(),
            mode.profile(),
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat,
        )
    }

    /// Raw service answer. Refusals (NoRoute, TooBig, ...) come back as a
    /// parsed response with a non-`Ok` code.
    pub async fn query(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<OsrmResponse> {
        let url = self.route_url(origin, destination, mode);
        debug!("osrm {} -> {} ({})", origin, destination, mode);

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // OSRM explains refusals in a 4xx JSON body.
        match parse_json::<OsrmResponse>("osrm", &body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ServiceError::Status {
                service: "osrm",
                status: status.as_u16(),
                body: excerpt(&body),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route> {
        self.query(origin, destination, mode).await?.into_route()
    }
}
