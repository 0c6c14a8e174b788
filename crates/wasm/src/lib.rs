//! WebAssembly bindings for the cafemap café finder.
//!
//! [`CafeMap`] wraps the core state machine for a browser map widget. The
//! page forwards user and device events to it, then drains the queued effects
//! with `take_effects()` (a JSON array) and carries them out: geolocation,
//! HTTP requests, map moves and alerts. Service answers are fed back with the
//! token found on the effect. `view()` returns the JSON view model to draw.
//!
//! Discovery results are cached in `localStorage` when persistence is on, so
//! a `discover` effect only reaches the page on a cache miss.

use std::collections::HashMap;
use std::fmt::Display;

use wasm_bindgen::prelude::*;

use cafemap_core::cache::{BlobStore, MemoryStore};
use cafemap_core::location::geolocation_error;
use cafemap_core::{
    App, AppConfig, Coordinate, Effect, Error, Filter, Place, PoiCache, Token, TravelMode,
};
use cafemap_services::http::parse_json;
use cafemap_services::nominatim::NominatimPlace;
use cafemap_services::osrm::OsrmResponse;
use cafemap_services::{OsrmClient, OverpassClient, OverpassResponse, ServiceOptions};

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ===========================================================================
// localStorage blob store
// ===========================================================================

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = localStorage, js_name = getItem)]
    fn storage_get(key: &str) -> Option<String>;

    #[wasm_bindgen(catch, js_namespace = localStorage, js_name = setItem)]
    fn storage_set(key: &str, value: &str) -> Result<(), JsValue>;
}

struct LocalStorage;

impl BlobStore for LocalStorage {
    fn load(&self, key: &str) -> Option<String> {
        storage_get(key)
    }

    fn save(&mut self, key: &str, blob: String) -> cafemap_core::Result<()> {
        storage_set(key, &blob)
            .map_err(|e| Error::Store(e.as_string().unwrap_or_else(|| "quota exceeded".into())))
    }
}

// ===========================================================================
// State machine handle
// ===========================================================================

/// Browser-side handle on the café finder state.
#[wasm_bindgen]
pub struct CafeMap {
    app: App,
    cache: PoiCache<Box<dyn BlobStore>>,
    /// Where each outstanding discovery was issued, for caching its answer.
    discoveries: HashMap<Token, Coordinate>,
}

#[wasm_bindgen]
impl CafeMap {
    /// `config_json`: optional app settings. `persist`: cache cafés in
    /// `localStorage` instead of memory.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, persist: bool) -> Result<CafeMap, JsValue> {
        let config = match config_json {
            Some(json) => AppConfig::from_json(&json).map_err(js_err)?,
            None => AppConfig::default(),
        };
        Ok(Self::with_config(config, persist))
    }

    /// Queue the startup view and fix request.
    pub fn start(&mut self) {
        self.app.start();
    }

    /// Effects queued since the last call, as a JSON array.
    ///
    /// Discoveries answered from the cache are applied here and never
    /// returned.
    pub fn take_effects(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.drain()).map_err(js_err)
    }

    /// Current view model as JSON.
    pub fn view(&self) -> Result<String, JsValue> {
        serde_json::to_string(&cafemap_core::render(&self.app)).map_err(js_err)
    }

    // ── Device ──────────────────────────────────────────────────────

    pub fn initial_fix(&mut self, lat: f64, lon: f64) {
        self.app.initial_fix(Ok(Coordinate::new(lat, lon)));
    }

    /// `code`: GeolocationPositionError code (1 denied, 2 unavailable, 3 timeout).
    pub fn initial_fix_failed(&mut self, code: u16) {
        self.app.initial_fix(Err(geolocation_error(code)));
    }

    pub fn watch_fix(&mut self, lat: f64, lon: f64) {
        self.app.watch_fix(Ok(Coordinate::new(lat, lon)));
    }

    pub fn watch_fix_failed(&mut self, code: u16) {
        self.app.watch_fix(Err(geolocation_error(code)));
    }

    pub fn locate_fix(&mut self, lat: f64, lon: f64) {
        self.app.locate_fix(Ok(Coordinate::new(lat, lon)));
    }

    pub fn locate_fix_failed(&mut self, code: u16) {
        self.app.locate_fix(Err(geolocation_error(code)));
    }

    // ── User actions ────────────────────────────────────────────────

    pub fn locate(&mut self) {
        self.app.locate();
    }

    pub fn map_clicked(&mut self, lat: f64, lon: f64) {
        self.app.pin(Coordinate::new(lat, lon));
    }

    pub fn search(&mut self, query: &str) {
        self.app.search(query);
    }

    /// Returns the filter's new state.
    pub fn toggle_filter(&mut self, name: &str) -> Result<bool, JsValue> {
        let filter: Filter = name.parse().map_err(js_err)?;
        Ok(self.app.toggle_filter(filter))
    }

    pub fn card_clicked(&mut self, lat: f64, lon: f64) {
        self.app.select_cafe(Coordinate::new(lat, lon));
    }

    /// "Get Route" in a marker popup.
    pub fn marker_route(&mut self, lat: f64, lon: f64) {
        self.app.route_from_marker(Coordinate::new(lat, lon));
    }

    pub fn unroute(&mut self) {
        self.app.unroute();
    }

    pub fn set_travel_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode: TravelMode = mode.parse().map_err(js_err)?;
        self.app.set_travel_mode(mode);
        Ok(())
    }

    /// The map finished the last requested move (`moveend`).
    pub fn view_settled(&mut self) {
        self.app.view_settled();
    }

    pub fn toggle_directions(&mut self) -> bool {
        self.app.toggle_directions_panel()
    }

    pub fn toggle_list(&mut self) -> bool {
        self.app.toggle_list_panel()
    }

    pub fn viewport_resized(&mut self, width_px: u32) {
        self.app.viewport_resized(width_px);
    }

    pub fn drag_started(&mut self) {
        self.app.handle(cafemap_core::Event::DragStarted);
    }

    pub fn drag_ended(&mut self) {
        self.app.handle(cafemap_core::Event::DragEnded);
    }

    // ── Service answers ─────────────────────────────────────────────

    /// Raw Overpass `[out:json]` body for a `discover` effect.
    pub fn cafes_loaded(&mut self, token: u32, overpass_json: &str) {
        let token = Token(u64::from(token));
        let result = parse_json::<OverpassResponse>("overpass", overpass_json)
            .map(OverpassResponse::into_pois)
            .map_err(Error::from);
        if let (Ok(pois), Some(at)) = (&result, self.discoveries.remove(&token)) {
            if let Err(e) = self.cache.put(&at, pois) {
                tracing::warn!("could not cache cafes: {}", e);
            }
        }
        self.app.cafes_loaded(token, result);
    }

    pub fn cafes_failed(&mut self, token: u32, message: &str) {
        let token = Token(u64::from(token));
        self.discoveries.remove(&token);
        self.app
            .cafes_loaded(token, Err(Error::Network(message.to_string())));
    }

    /// Raw Nominatim `/search?format=json` body for a `geocode` effect.
    pub fn geocode_loaded(&mut self, token: u32, nominatim_json: &str) {
        let result = parse_json::<Vec<NominatimPlace>>("nominatim", nominatim_json)
            .and_then(|hits| hits.iter().map(NominatimPlace::to_place).collect::<Result<Vec<Place>, _>>())
            .map_err(Error::from);
        self.app.geocode_finished(Token(u64::from(token)), result);
    }

    pub fn geocode_failed(&mut self, token: u32, message: &str) {
        self.app.geocode_finished(
            Token(u64::from(token)),
            Err(Error::Network(message.to_string())),
        );
    }

    /// Raw OSRM route response for a `compute_route` effect.
    pub fn route_loaded(&mut self, token: u32, osrm_json: &str) {
        let result = parse_json::<OsrmResponse>("osrm", osrm_json)
            .and_then(OsrmResponse::into_route)
            .map_err(Error::from);
        self.app.route_finished(Token(u64::from(token)), result);
    }

    pub fn route_failed(&mut self, token: u32, message: &str) {
        self.app.route_finished(
            Token(u64::from(token)),
            Err(Error::RouteUnreachable(message.to_string())),
        );
    }
}

impl CafeMap {
    fn with_config(config: AppConfig, persist: bool) -> Self {
        let store: Box<dyn BlobStore> = if persist {
            Box::new(LocalStorage)
        } else {
            Box::new(MemoryStore::new())
        };
        Self {
            cache: PoiCache::with_precision(store, config.cache_precision),
            app: App::new(config),
            discoveries: HashMap::new(),
        }
    }

    fn drain(&mut self) -> Vec<Effect> {
        let mut out: Vec<Effect> = Vec::new();
        loop {
            let effects = self.app.drain_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                match effect {
                    Effect::Discover { token, at, .. } => {
                        // Only the latest discovery can still be applied.
                        self.discoveries.retain(|issued, _| *issued > token);
                        match self.cache.get(&at) {
                            Some(pois) => self.app.cafes_loaded(token, Ok(pois)),
                            None => {
                                self.discoveries.insert(token, at);
                                out.push(effect);
                            }
                        }
                    }
                    Effect::Render if out.contains(&Effect::Render) => {}
                    other => out.push(other),
                }
            }
        }
        out
    }
}

// ===========================================================================
// Standalone helpers
// ===========================================================================

/// Normalize a raw Overpass response into the café JSON the list uses.
#[wasm_bindgen]
pub fn normalize_overpass(overpass_json: &str) -> Result<String, JsValue> {
    let resp: OverpassResponse = parse_json("overpass", overpass_json).map_err(js_err)?;
    serde_json::to_string(&resp.into_pois()).map_err(js_err)
}

/// Fetch cafés around a position from the public Overpass server.
///
/// Resolves to the raw Overpass JSON, ready for `CafeMap.cafes_loaded`.
#[wasm_bindgen]
pub async fn fetch_cafes(lat: f64, lon: f64, radius_m: u32) -> Result<String, JsValue> {
    let client = OverpassClient::new(&ServiceOptions::default()).map_err(js_err)?;
    let resp = client
        .query(Coordinate::new(lat, lon), radius_m)
        .await
        .map_err(js_err)?;
    serde_json::to_string(&resp).map_err(js_err)
}

/// Ask the public OSRM server for a route.
///
/// Resolves to the raw OSRM JSON, ready for `CafeMap.route_loaded`. A refusal
/// such as `NoRoute` resolves too; `route_loaded` turns it into an alert.
#[wasm_bindgen]
pub async fn fetch_route(
    from_lat: f64,
    from_lon: f64,
    to_lat: f64,
    to_lon: f64,
    mode: String,
) -> Result<String, JsValue> {
    let mode: TravelMode = mode.parse().map_err(js_err)?;
    let client = OsrmClient::new(&ServiceOptions::default()).map_err(js_err)?;
    let resp = client
        .query(
            Coordinate::new(from_lat, from_lon),
            Coordinate::new(to_lat, to_lon),
            mode,
        )
        .await
        .map_err(js_err)?;
    serde_json::to_string(&resp).map_err(js_err)
}
