//! Route session lifecycle: at most one destination, one computation in flight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::token::{Sequencer, Token};

/// How the user travels to the café.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
}

impl TravelMode {
    /// OSRM profile name.
    pub fn profile(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "foot",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driving => f.write_str("driving"),
            Self::Walking => f.write_str("walking"),
        }
    }
}

impl FromStr for TravelMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drive" | "driving" | "car" => Ok(Self::Driving),
            "walk" | "walking" | "foot" => Ok(Self::Walking),
            _ => Err(Error::InvalidParameter {
                name: "mode",
                value: s.to_string(),
                reason: "expected driving or walking".to_string(),
            }),
        }
    }
}

/// A path computation the host must run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub token: Token,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
}

/// One turn-by-turn step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub text: String,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// A computed path from the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutePhase {
    /// Destination kept, no computation running (waiting for the view to settle).
    Detached,
    Pending(Token),
    Ready(Route),
}

/// The single active origin → destination session.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSession {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
    pub phase: RoutePhase,
}

impl RouteSession {
    pub fn route(&self) -> Option<&Route> {
        match &self.phase {
            RoutePhase::Ready(route) => Some(route),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, RoutePhase::Pending(_))
    }

    /// Whether something is drawn or being drawn for this session.
    pub fn is_displayed(&self) -> bool {
        !matches!(self.phase, RoutePhase::Detached)
    }
}

/// What applying a router response did.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Superseded by a newer request or an unroute; dropped.
    Stale,
    Ready,
    /// The session was cleared.
    Failed(Error),
}

#[derive(Debug, Clone, Default)]
pub struct RouteManager {
    session: Option<RouteSession>,
    tokens: Sequencer,
    mode: TravelMode,
}

impl RouteManager {
    pub fn new(mode: TravelMode) -> Self {
        Self {
            session: None,
            tokens: Sequencer::new(),
            mode,
        }
    }

    pub fn session(&self) -> Option<&RouteSession> {
        self.session.as_ref()
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.session.as_ref().map(|s| s.destination)
    }

    pub fn route(&self) -> Option<&Route> {
        self.session.as_ref().and_then(RouteSession::route)
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    /// Whether the active destination is (within tolerance) `at`.
    pub fn is_routed_to(&self, at: &Coordinate) -> bool {
        self.destination().is_some_and(|d| d.same_place(at))
    }

    /// Start a new session, discarding whatever was there.
    pub fn route_to(&mut self, origin: Coordinate, destination: Coordinate) -> RouteRequest {
        let token = self.tokens.issue();
        info!("routing {} -> {} ({}) {}", origin, destination, self.mode, token);
        self.session = Some(RouteSession {
            origin,
            destination,
            mode: self.mode,
            phase: RoutePhase::Pending(token),
        });
        RouteRequest {
            token,
            origin,
            destination,
            mode: self.mode,
        }
    }

    /// Drop the session entirely.
    pub fn unroute(&mut self) -> Option<RouteSession> {
        let previous = self.session.take();
        if let Some(s) = &previous {
            info!("unrouted from {}", s.destination);
        }
        previous
    }

    /// Discard the drawn route and any computation in flight, keeping the
    /// destination for a later [`RouteManager::reissue`].
    ///
    /// Returns whether anything was displayed.
    pub fn detach(&mut self) -> bool {
        match self.session.as_mut() {
            Some(s) => {
                let displayed = s.is_displayed();
                s.phase = RoutePhase::Detached;
                displayed
            }
            None => false,
        }
    }

    /// Recompute the active session from a new origin.
    pub fn reissue(&mut self, origin: Coordinate) -> Option<RouteRequest> {
        let destination = self.destination()?;
        Some(self.route_to(origin, destination))
    }

    /// Change the travel mode. Returns whether it changed.
    pub fn set_mode(&mut self, mode: TravelMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Apply a router response.
    pub fn finish(&mut self, token: Token, result: Result<Route>) -> RouteOutcome {
        let current = matches!(
            self.session.as_ref().map(|s| &s.phase),
            Some(RoutePhase::Pending(t)) if *t == token
        );
        if !current {
            debug!("dropping stale route response {}", token);
            return RouteOutcome::Stale;
        }

        match result {
            Ok(route) => {
                if let Some(s) = self.session.as_mut() {
                    info!(
                        "route ready: {:.0} m, {:.0} s, {} points",
                        route.distance_m,
                        route.duration_s,
                        route.path.len()
                    );
                    s.phase = RoutePhase::Ready(route);
                }
                RouteOutcome::Ready
            }
            Err(e) => {
                warn!("route {} failed: {}", token, e);
                self.session = None;
                RouteOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(distance_m: f64) -> Route {
        Route {
            path: vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)],
            distance_m,
            duration_s: 60.0,
            instructions: vec![],
        }
    }

    const HOME: Coordinate = Coordinate::new(14.5995, 120.9842);
    const A: Coordinate = Coordinate::new(14.60, 120.98);
    const B: Coordinate = Coordinate::new(14.61, 120.99);

    #[test]
    fn new_destination_replaces_session() {
        let mut routes = RouteManager::default();
        let first = routes.route_to(HOME, A);
        let second = routes.route_to(HOME, B);

        assert_eq!(routes.destination(), Some(B));
        assert!(!routes.is_routed_to(&A));
        // the response for A arrives late and is dropped
        assert_eq!(routes.finish(first.token, Ok(route(1.0))), RouteOutcome::Stale);
        assert!(routes.route().is_none());
        assert_eq!(routes.finish(second.token, Ok(route(2.0))), RouteOutcome::Ready);
        assert_eq!(routes.route().map(|r| r.distance_m), Some(2.0));
    }

    #[test]
    fn unroute_clears_and_invalidates() {
        let mut routes = RouteManager::default();
        let req = routes.route_to(HOME, A);
        assert!(routes.unroute().is_some());
        assert_eq!(routes.destination(), None);
        assert_eq!(routes.finish(req.token, Ok(route(1.0))), RouteOutcome::Stale);
        assert!(routes.session().is_none());
    }

    #[test]
    fn failure_reverts_to_no_destination() {
        let mut routes = RouteManager::default();
        let req = routes.route_to(HOME, A);
        let err = Error::RouteUnreachable("too far".into());
        assert_eq!(
            routes.finish(req.token, Err(err.clone())),
            RouteOutcome::Failed(err)
        );
        assert_eq!(routes.destination(), None);
    }

    #[test]
    fn detach_then_reissue_keeps_destination() {
        let mut routes = RouteManager::new(TravelMode::Walking);
        let req = routes.route_to(HOME, A);
        routes.finish(req.token, Ok(route(1.0)));

        assert!(routes.detach());
        assert!(routes.route().is_none());
        assert!(!routes.detach());

        let moved = Coordinate::new(14.59, 120.97);
        let again = routes.reissue(moved).unwrap();
        assert_eq!(again.origin, moved);
        assert_eq!(again.destination, A);
        assert_eq!(again.mode, TravelMode::Walking);
        assert!(again.token > req.token);
    }

    #[test]
    fn reissue_without_session_is_none() {
        let mut routes = RouteManager::default();
        assert!(routes.reissue(HOME).is_none());
    }

    #[test]
    fn travel_mode_parsing() {
        assert_eq!("walk".parse::<TravelMode>().unwrap(), TravelMode::Walking);
        assert_eq!("Driving".parse::<TravelMode>().unwrap().profile(), "driving");
        assert!("bike".parse::<TravelMode>().is_err());
    }
}
