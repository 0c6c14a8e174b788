//! Application configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_PRECISION;
use crate::error::{Error, Result};
use crate::geo::{Coordinate, DEFAULT_CENTER};
use crate::location::FixOptions;
use crate::route::TravelMode;

/// Tunables for [`crate::App`]. Missing fields in a config file take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Used when geolocation fails and as route origin before any fix.
    pub fallback_center: Coordinate,
    /// Café search radius around the current position (default 3000 m).
    pub search_radius_m: u32,
    /// Decimal places of the cache cell (default 3).
    pub cache_precision: usize,
    /// Zoom of the startup view.
    pub initial_zoom: u8,
    /// Zoom applied when focusing a new position.
    pub focus_zoom: u8,
    pub initial_fix: FixOptions,
    pub watch: FixOptions,
    pub locate: FixOptions,
    /// Hosts without a "view settled" signal wait this long before re-routing.
    pub view_settle_fallback_ms: u64,
    /// Viewports narrower than this get mutually exclusive panels.
    pub compact_breakpoint_px: u32,
    pub travel_mode: TravelMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fallback_center: DEFAULT_CENTER,
            search_radius_m: 3000,
            cache_precision: DEFAULT_PRECISION,
            initial_zoom: 14,
            focus_zoom: 20,
            initial_fix: FixOptions::initial(),
            watch: FixOptions::watch(),
            locate: FixOptions::locate(),
            view_settle_fallback_ms: 500,
            compact_breakpoint_px: 768,
            travel_mode: TravelMode::Driving,
        }
    }
}

impl AppConfig {
    /// Parse a JSON config, rejecting values the app cannot work with.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::InvalidParameter {
            name: "config",
            value: json.chars().take(80).collect(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search_radius_m == 0 {
            return Err(Error::InvalidParameter {
                name: "search_radius_m",
                value: self.search_radius_m.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.cache_precision > 7 {
            return Err(Error::InvalidParameter {
                name: "cache_precision",
                value: self.cache_precision.to_string(),
                reason: "more than 7 decimals is below GPS resolution".to_string(),
            });
        }
        Ok(())
    }

    pub fn view_settle_fallback(&self) -> Duration {
        Duration::from_millis(self.view_settle_fallback_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{"search_radius_m": 1500, "travel_mode": "walking"}"#)
            .unwrap();
        assert_eq!(config.search_radius_m, 1500);
        assert_eq!(config.travel_mode, TravelMode::Walking);
        assert_eq!(config.fallback_center, DEFAULT_CENTER);
        assert_eq!(config.watch, FixOptions::watch());
        assert_eq!(config.view_settle_fallback(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_zero_radius() {
        assert!(AppConfig::from_json(r#"{"search_radius_m": 0}"#).is_err());
        assert!(AppConfig::from_json("{").is_err());
    }
}
