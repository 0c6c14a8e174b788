//! Declarative projection of [`App`] state into what the map and list show.
//!
//! [`render`] rebuilds the whole model on every call; hosts diff nothing and
//! simply redraw. Every marker and card carries its coordinate so a click can
//! be mapped back to the café.

use serde::Serialize;

use crate::app::{App, Interaction, ListStatus};
use crate::filter::{apply, Filter};
use crate::geo::Coordinate;
use crate::location::Source;
use crate::panels::Panels;
use crate::poi::{Amenity, PointOfInterest, PoiId};
use crate::route::{Instruction, TravelMode};

pub const LOCATION_LABEL: &str = "Current Location";
pub const LOADING_MESSAGE: &str = "Loading cafes...";
pub const NO_MATCH_MESSAGE: &str = "No cafes match your filters. Try adjusting them.";
pub const NONE_FOUND_MESSAGE: &str = "No cafes found in this area.";
pub const HOURS_UNAVAILABLE: &str = "Business hours not available.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub loading_screen: bool,
    pub location: Option<LocationMarker>,
    pub markers: Vec<CafeMarker>,
    pub list: ListView,
    pub filters: Vec<FilterToggle>,
    pub route: Option<RouteView>,
    pub directions: DirectionsView,
    pub panels: Panels,
    pub interaction: Interaction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMarker {
    pub coordinate: Coordinate,
    pub label: &'static str,
    pub manual: bool,
    pub fallback: bool,
}

/// Café marker with its popup content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CafeMarker {
    pub id: PoiId,
    pub coordinate: Coordinate,
    pub name: String,
    pub hours: String,
    /// The popup's "Get Route" button is highlighted.
    pub routed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CafeCard {
    pub id: PoiId,
    pub coordinate: Coordinate,
    pub name: String,
    pub rows: Vec<CardRow>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    pub cards: Vec<CafeCard>,
    /// Shown instead of (or while waiting for) cards.
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterToggle {
    pub filter: Filter,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteView {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
    pub pending: bool,
    pub path: Vec<Coordinate>,
    /// e.g. `"2.4 km, 12 min"` once computed.
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsView {
    pub open: bool,
    pub steps: Vec<Instruction>,
}

/// Build the full view model.
pub fn render(app: &App) -> ViewModel {
    let selected = app.selected();
    let visible: Vec<&PointOfInterest> = apply(app.pois(), app.filters()).collect();

    let markers = visible
        .iter()
        .map(|poi| CafeMarker {
            id: poi.id.clone(),
            coordinate: poi.coordinate,
            name: poi.display_name().to_string(),
            hours: poi.opening_hours().unwrap_or(HOURS_UNAVAILABLE).to_string(),
            routed: is_selected(selected, &poi.coordinate),
        })
        .collect();

    let cards: Vec<CafeCard> = visible
        .iter()
        .map(|poi| card(poi, is_selected(selected, &poi.coordinate)))
        .collect();

    let message = match app.list_status() {
        ListStatus::Idle => None,
        ListStatus::Loading => Some(LOADING_MESSAGE.to_string()),
        ListStatus::Failed(message) => Some(message.clone()),
        ListStatus::Ready if cards.is_empty() => Some(
            if app.filters().any_enabled() {
                NO_MATCH_MESSAGE
            } else {
                NONE_FOUND_MESSAGE
            }
            .to_string(),
        ),
        ListStatus::Ready => None,
    };

    let filters = Filter::ALL
        .iter()
        .map(|&filter| FilterToggle {
            filter,
            label: filter.label(),
            active: app.filters().is_enabled(filter),
        })
        .collect();

    let location = app.location().current().map(|coordinate| LocationMarker {
        coordinate,
        label: LOCATION_LABEL,
        manual: app.location().source() == Some(Source::Manual),
        fallback: app.location().is_fallback(),
    });

    let session = app.routes().session();
    let route = session.map(|s| {
        let computed = s.route();
        RouteView {
            origin: s.origin,
            destination: s.destination,
            mode: s.mode,
            pending: s.is_pending(),
            path: computed.map(|r| r.path.clone()).unwrap_or_default(),
            summary: computed.map(|r| {
                format!(
                    "{}, {}",
                    format_distance(r.distance_m),
                    format_duration(r.duration_s)
                )
            }),
        }
    });

    let directions = DirectionsView {
        open: app.panels().directions_open(),
        steps: session
            .and_then(|s| s.route())
            .map(|r| r.instructions.clone())
            .unwrap_or_default(),
    };

    ViewModel {
        loading_screen: app.loading_screen(),
        location,
        markers,
        list: ListView { cards, message },
        filters,
        route,
        directions,
        panels: *app.panels(),
        interaction: app.interaction(),
    }
}

fn is_selected(selected: Option<Coordinate>, at: &Coordinate) -> bool {
    selected.is_some_and(|s| s.same_place(at))
}

fn card(poi: &PointOfInterest, active: bool) -> CafeCard {
    let mut rows = Vec::with_capacity(Amenity::ALL.len() + 1);
    rows.push(CardRow {
        label: "Business Hours",
        value: poi.opening_hours().unwrap_or("N/A").to_string(),
    });
    rows.extend(Amenity::ALL.iter().map(|&amenity| CardRow {
        label: amenity.label(),
        value: poi.amenity(amenity).display().to_string(),
    }));

    CafeCard {
        id: poi.id.clone(),
        coordinate: poi.coordinate,
        name: poi.display_name().to_string(),
        rows,
        active,
    }
}

/// `"850 m"` below a kilometre, `"2.4 km"` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// `"12 min"`, or `"1 h 5 min"` past the hour. Never below one minute.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round().max(1.0) as u64;
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{} h {} min", minutes / 60, minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Effect;
    use crate::error::Error;
    use crate::geo::DEFAULT_CENTER;
    use crate::route::Route;
    use std::collections::BTreeMap;

    fn cafe(lat: f64, lon: f64, tags: &[(&str, &str)]) -> PointOfInterest {
        let tags: BTreeMap<String, String> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PointOfInterest::new(Coordinate::new(lat, lon), tags)
    }

    fn loaded(pois: Vec<PointOfInterest>) -> App {
        let mut app = App::default();
        app.initial_fix(Err(Error::GeolocationDenied));
        let token = app
            .drain_effects()
            .into_iter()
            .find_map(|e| match e {
                Effect::Discover { token, .. } => Some(token),
                _ => None,
            })
            .unwrap();
        app.cafes_loaded(token, Ok(pois));
        app.drain_effects();
        app
    }

    #[test]
    fn fallback_location_marker() {
        let view = render(&loaded(vec![]));
        let marker = view.location.unwrap();
        assert_eq!(marker.coordinate, DEFAULT_CENTER);
        assert_eq!(marker.label, "Current Location");
        assert!(marker.fallback);
        assert!(!marker.manual);
        assert!(!view.loading_screen);
        assert!(view.panels.list_open());
    }

    #[test]
    fn loading_message_before_results() {
        let mut app = App::default();
        assert!(render(&app).loading_screen);
        app.initial_fix(Ok(DEFAULT_CENTER));
        assert_eq!(render(&app).list.message.as_deref(), Some(LOADING_MESSAGE));
    }

    #[test]
    fn cards_follow_filters() {
        let mut app = loaded(vec![
            cafe(14.60, 120.98, &[("name", "Brew Co"), ("wheelchair", "yes")]),
            cafe(14.61, 120.98, &[("name", "X")]),
        ]);
        assert_eq!(render(&app).list.cards.len(), 2);

        app.toggle_filter(Filter::Wheelchair);
        let view = render(&app);
        let names: Vec<_> = view.list.cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Brew Co"]);
        assert_eq!(view.markers.len(), 1);
        assert!(view.filters.iter().any(|f| f.filter == Filter::Wheelchair && f.active));
    }

    #[test]
    fn empty_messages() {
        let mut app = loaded(vec![cafe(14.60, 120.98, &[("name", "X")])]);
        app.toggle_filter(Filter::Smoking);
        assert_eq!(render(&app).list.message.as_deref(), Some(NO_MATCH_MESSAGE));

        let app = loaded(vec![]);
        assert_eq!(render(&app).list.message.as_deref(), Some(NONE_FOUND_MESSAGE));
    }

    #[test]
    fn card_rows_are_formatted() {
        let app = loaded(vec![cafe(
            14.60,
            120.98,
            &[
                ("wheelchair", "limited"),
                ("payment:cards", "yes"),
                ("smoking", "outside"),
            ],
        )]);
        let view = render(&app);
        let card = &view.list.cards[0];
        assert_eq!(card.name, "Unnamed Cafe");
        let rows: Vec<(&str, &str)> = card
            .rows
            .iter()
            .map(|r| (r.label, r.value.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Business Hours", "N/A"),
                ("Accepts Cards", "Yes"),
                ("Wheelchair", "Limited"),
                ("Outdoor Seating", "N/A"),
                ("Smoking Area", "outside"),
                ("Toilet", "N/A"),
            ]
        );
        assert_eq!(view.markers[0].hours, HOURS_UNAVAILABLE);
    }

    #[test]
    fn selection_marks_card_and_marker() {
        let mut app = loaded(vec![
            cafe(14.60, 120.98, &[("name", "A")]),
            cafe(14.61, 120.98, &[("name", "B")]),
        ]);
        app.select_cafe(Coordinate::new(14.61, 120.98));
        let view = render(&app);
        assert_eq!(
            view.list.cards.iter().map(|c| c.active).collect::<Vec<_>>(),
            vec![false, true]
        );
        assert!(view.markers[1].routed);
        assert!(view.route.as_ref().unwrap().pending);

        app.unroute();
        let view = render(&app);
        assert!(view.list.cards.iter().all(|c| !c.active));
        assert!(view.markers.iter().all(|m| !m.routed));
        assert!(view.route.is_none());
    }

    #[test]
    fn computed_route_fills_summary_and_directions() {
        let mut app = loaded(vec![cafe(14.60, 120.98, &[("name", "A")])]);
        app.select_cafe(Coordinate::new(14.60, 120.98));
        let token = app
            .drain_effects()
            .into_iter()
            .find_map(|e| match e {
                Effect::ComputeRoute { request } => Some(request.token),
                _ => None,
            })
            .unwrap();
        app.route_finished(
            token,
            Ok(Route {
                path: vec![DEFAULT_CENTER, Coordinate::new(14.60, 120.98)],
                distance_m: 2400.0,
                duration_s: 720.0,
                instructions: vec![Instruction {
                    text: "Head north".into(),
                    distance_m: 2400.0,
                    duration_s: 720.0,
                }],
            }),
        );
        app.toggle_directions_panel();

        let view = render(&app);
        let route = view.route.unwrap();
        assert!(!route.pending);
        assert_eq!(route.path.len(), 2);
        assert_eq!(route.summary.as_deref(), Some("2.4 km, 12 min"));
        assert!(view.directions.open);
        assert_eq!(view.directions.steps.len(), 1);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_distance(850.0), "850 m");
        assert_eq!(format_distance(12_345.0), "12.3 km");
        assert_eq!(format_duration(20.0), "1 min");
        assert_eq!(format_duration(3900.0), "1 h 5 min");
    }
}
