//! Current-position state: device tracking versus manual pins.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Continuous tracking never polls faster than this.
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Options passed to the host geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOptions {
    pub high_accuracy: bool,
    /// `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
    /// Oldest cached position the host may return.
    pub maximum_age_ms: u64,
}

impl FixOptions {
    /// Startup fix: host defaults.
    pub const fn initial() -> Self {
        Self {
            high_accuracy: false,
            timeout_ms: None,
            maximum_age_ms: 0,
        }
    }

    /// Background tracking: relaxed accuracy to spare the battery.
    pub const fn watch() -> Self {
        Self {
            high_accuracy: false,
            timeout_ms: Some(10_000),
            maximum_age_ms: 5_000,
        }
    }

    /// Explicit "use my location".
    pub const fn locate() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: Some(5_000),
            maximum_age_ms: 0,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Polling period for hosts that emulate a watch by repeated fixes.
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms).max(MIN_WATCH_INTERVAL)
    }
}

/// Why a fix was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixPurpose {
    Initial,
    Locate,
}

/// Where the current coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Tracked,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LocationState {
    Uninitialized,
    /// Following the device. `fallback` marks the default centre standing in
    /// for a failed fix.
    Tracked { current: Coordinate, fallback: bool },
    /// Pinned by a map click or search; device fixes are ignored.
    Manual { current: Coordinate },
}

/// Owns the current position and arbitrates device fixes against pins.
#[derive(Debug, Clone)]
pub struct LocationManager {
    state: LocationState,
    tracking_active: bool,
    locate_pending: bool,
    fallback: Coordinate,
}

impl LocationManager {
    pub fn new(fallback: Coordinate) -> Self {
        Self {
            state: LocationState::Uninitialized,
            tracking_active: false,
            locate_pending: false,
            fallback,
        }
    }

    pub fn state(&self) -> LocationState {
        self.state
    }

    pub fn current(&self) -> Option<Coordinate> {
        match self.state {
            LocationState::Uninitialized => None,
            LocationState::Tracked { current, .. } | LocationState::Manual { current } => {
                Some(current)
            }
        }
    }

    /// Current coordinate, or the fallback centre before the first fix.
    pub fn current_or_fallback(&self) -> Coordinate {
        self.current().unwrap_or(self.fallback)
    }

    pub fn source(&self) -> Option<Source> {
        match self.state {
            LocationState::Uninitialized => None,
            LocationState::Tracked { .. } => Some(Source::Tracked),
            LocationState::Manual { .. } => Some(Source::Manual),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.state, LocationState::Manual { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.state, LocationState::Tracked { fallback: true, .. })
    }

    pub fn tracking_active(&self) -> bool {
        self.tracking_active
    }

    pub fn locate_pending(&self) -> bool {
        self.locate_pending
    }

    /// Apply the startup fix.
    ///
    /// Success starts tracking; failure installs the fallback centre. Returns
    /// the new current coordinate, or `None` if a pin already took over.
    pub fn initial_fix(&mut self, fix: Result<Coordinate>) -> Option<Coordinate> {
        let (current, fallback) = match fix {
            Ok(at) => {
                self.tracking_active = true;
                (at, false)
            }
            Err(e) => {
                warn!("initial fix failed ({}), using fallback centre", e);
                (self.fallback, true)
            }
        };

        if self.is_manual() {
            debug!("initial fix arrived after a manual pin, not applied");
            return None;
        }

        info!("location initialised at {}", current);
        self.state = LocationState::Tracked { current, fallback };
        Some(current)
    }

    /// Apply a background tracking fix.
    ///
    /// Errors are swallowed. Fixes are discarded while pinned or when the
    /// position did not change. Returns the coordinate when it was applied.
    pub fn watch_fix(&mut self, fix: Result<Coordinate>) -> Option<Coordinate> {
        let at = match fix {
            Ok(at) => at,
            Err(e) => {
                debug!("watch fix failed: {}", e);
                return None;
            }
        };

        if !self.tracking_active {
            return None;
        }

        match self.state {
            LocationState::Manual { .. } => {
                debug!("watch fix {} discarded while pinned", at);
                None
            }
            LocationState::Tracked { current, .. } if current == at => None,
            _ => {
                self.state = LocationState::Tracked {
                    current: at,
                    fallback: false,
                };
                Some(at)
            }
        }
    }

    /// Pin the current position manually.
    pub fn pin(&mut self, at: Coordinate) -> Coordinate {
        info!("location pinned at {}", at);
        self.state = LocationState::Manual { current: at };
        self.locate_pending = false;
        at
    }

    /// Leave manual mode and wait for a fresh device fix.
    pub fn request_locate(&mut self) {
        if let LocationState::Manual { current } = self.state {
            self.state = LocationState::Tracked {
                current,
                fallback: false,
            };
        }
        self.locate_pending = true;
    }

    /// Apply the answer to [`LocationManager::request_locate`].
    ///
    /// `Ok(None)` means nothing was waiting for this fix (a pin intervened).
    pub fn locate_fix(&mut self, fix: Result<Coordinate>) -> Result<Option<Coordinate>> {
        if !self.locate_pending {
            return Ok(None);
        }
        self.locate_pending = false;

        let at = fix?;
        info!("location located at {}", at);
        self.state = LocationState::Tracked {
            current: at,
            fallback: false,
        };
        self.tracking_active = true;
        Ok(Some(at))
    }
}

/// Maps a denied/timeout/unavailable code from a host API.
pub fn geolocation_error(code: u16) -> Error {
    match code {
        1 => Error::GeolocationDenied,
        3 => Error::GeolocationTimeout,
        _ => Error::GeolocationUnavailable,
    }
}
