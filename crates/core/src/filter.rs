//! Attribute filters over discovered cafés.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::poi::{Amenity, PointOfInterest};

/// One of the six user-facing filter toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Wheelchair,
    OpeningHours,
    OutdoorSeating,
    Smoking,
    Toilet,
    Card,
}

/// What a filter demands of a café.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The amenity tag must be literally `yes`.
    Yes(Amenity),
    /// The tag must be present, any value.
    Present(&'static str),
}

impl Filter {
    /// Toolbar order.
    pub const ALL: [Filter; 6] = [
        Filter::Wheelchair,
        Filter::OpeningHours,
        Filter::OutdoorSeating,
        Filter::Smoking,
        Filter::Toilet,
        Filter::Card,
    ];

    pub fn requirement(&self) -> Requirement {
        match self {
            Self::Wheelchair => Requirement::Yes(Amenity::Wheelchair),
            Self::OpeningHours => Requirement::Present("opening_hours"),
            Self::OutdoorSeating => Requirement::Yes(Amenity::OutdoorSeating),
            Self::Smoking => Requirement::Yes(Amenity::Smoking),
            Self::Toilet => Requirement::Yes(Amenity::Toilets),
            Self::Card => Requirement::Yes(Amenity::PaymentCards),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wheelchair => "Wheelchair",
            Self::OpeningHours => "Open Hours",
            Self::OutdoorSeating => "Outdoor Seating",
            Self::Smoking => "Smoking",
            Self::Toilet => "Toilet",
            Self::Card => "Card",
        }
    }

    /// Whether `poi` satisfies this single filter.
    pub fn admits(&self, poi: &PointOfInterest) -> bool {
        match self.requirement() {
            Requirement::Yes(amenity) => poi.amenity(amenity).is_yes(),
            Requirement::Present(key) => poi.tag(key).is_some(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "wheelchair" => Ok(Self::Wheelchair),
            "open_hours" | "opening_hours" | "openhours" => Ok(Self::OpeningHours),
            "outdoor_seating" | "outdoorseating" | "outdoor" => Ok(Self::OutdoorSeating),
            "smoking" => Ok(Self::Smoking),
            "toilet" | "toilets" => Ok(Self::Toilet),
            "card" | "cards" | "payment_cards" => Ok(Self::Card),
            _ => Err(Error::InvalidParameter {
                name: "filter",
                value: s.to_string(),
                reason: "expected one of wheelchair, open-hours, outdoor-seating, smoking, toilet, card"
                    .to_string(),
            }),
        }
    }
}

/// Which filters are switched on. Everything starts off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    enabled: BTreeSet<Filter>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a filter, returning its new state.
    pub fn toggle(&mut self, filter: Filter) -> bool {
        if !self.enabled.remove(&filter) {
            self.enabled.insert(filter);
            true
        } else {
            false
        }
    }

    pub fn set(&mut self, filter: Filter, on: bool) {
        if on {
            self.enabled.insert(filter);
        } else {
            self.enabled.remove(&filter);
        }
    }

    pub fn is_enabled(&self, filter: Filter) -> bool {
        self.enabled.contains(&filter)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled.is_empty()
    }

    pub fn enabled(&self) -> impl Iterator<Item = Filter> + '_ {
        self.enabled.iter().copied()
    }
}

/// A café passes when every enabled filter admits it.
pub fn matches(poi: &PointOfInterest, state: &FilterState) -> bool {
    state.enabled().all(|f| f.admits(poi))
}

/// Cafés passing `state`, in their original order.
pub fn apply<'a>(
    pois: &'a [PointOfInterest],
    state: &'a FilterState,
) -> impl Iterator<Item = &'a PointOfInterest> + 'a {
    pois.iter().filter(move |p| matches(p, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use std::collections::BTreeMap;

    fn cafe(tags: &[(&str, &str)]) -> PointOfInterest {
        let tags: BTreeMap<String, String> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PointOfInterest::new(Coordinate::new(14.6, 121.0), tags)
    }

    fn sample() -> Vec<PointOfInterest> {
        vec![
            cafe(&[("name", "Brew Co"), ("wheelchair", "yes")]),
            cafe(&[("name", "X")]),
            cafe(&[
                ("name", "Full House"),
                ("wheelchair", "yes"),
                ("opening_hours", "Mo-Su 07:00-22:00"),
                ("outdoor_seating", "yes"),
                ("smoking", "yes"),
                ("toilets", "yes"),
                ("payment:cards", "yes"),
            ]),
            cafe(&[("name", "Limited"), ("wheelchair", "limited"), ("smoking", "no")]),
            cafe(&[("name", "Hours only"), ("opening_hours", "24/7")]),
        ]
    }

    #[test]
    fn no_filters_pass_everything() {
        let state = FilterState::new();
        for poi in sample() {
            assert!(matches(&poi, &state));
        }
    }

    #[test]
    fn wheelchair_requires_literal_yes() {
        let mut state = FilterState::new();
        state.toggle(Filter::Wheelchair);
        let cafes = sample();
        let names: Vec<_> = apply(&cafes, &state).map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["Brew Co", "Full House"]);
    }

    #[test]
    fn opening_hours_checks_presence_only() {
        let mut state = FilterState::new();
        state.toggle(Filter::OpeningHours);
        let cafes = sample();
        let names: Vec<_> = apply(&cafes, &state).map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["Full House", "Hours only"]);
    }

    #[test]
    fn single_filter_never_grows_result() {
        let cafes = sample();
        let baseline = apply(&cafes, &FilterState::new()).count();
        for filter in Filter::ALL {
            let mut state = FilterState::new();
            state.set(filter, true);
            let narrowed: Vec<_> = apply(&cafes, &state).collect();
            assert!(narrowed.len() <= baseline, "{filter} widened the set");
            assert!(narrowed.iter().all(|p| filter.admits(p)));
        }
    }

    #[test]
    fn all_filters_leave_full_house() {
        let mut state = FilterState::new();
        for filter in Filter::ALL {
            state.toggle(filter);
        }
        let cafes = sample();
        let names: Vec<_> = apply(&cafes, &state).map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["Full House"]);
    }

    #[test]
    fn toggle_flips() {
        let mut state = FilterState::new();
        assert!(state.toggle(Filter::Card));
        assert!(state.any_enabled());
        assert!(!state.toggle(Filter::Card));
        assert!(!state.any_enabled());
    }

    #[test]
    fn parse_filter_names() {
        assert_eq!("open-hours".parse::<Filter>().unwrap(), Filter::OpeningHours);
        assert_eq!("Outdoor Seating".parse::<Filter>().unwrap(), Filter::OutdoorSeating);
        assert_eq!("toilets".parse::<Filter>().unwrap(), Filter::Toilet);
        assert!("wifi".parse::<Filter>().is_err());
    }
}
