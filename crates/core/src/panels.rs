//! Café list and directions panel visibility.

use serde::Serialize;

/// On compact viewports only one of the two panels may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Panels {
    list_open: bool,
    directions_open: bool,
    compact: bool,
}

impl Panels {
    pub fn list_open(&self) -> bool {
        self.list_open
    }

    pub fn directions_open(&self) -> bool {
        self.directions_open
    }

    pub fn compact(&self) -> bool {
        self.compact
    }

    pub fn open_list(&mut self) {
        self.list_open = true;
        if self.compact {
            self.directions_open = false;
        }
    }

    pub fn toggle_list(&mut self) -> bool {
        if self.list_open {
            self.list_open = false;
        } else {
            self.open_list();
        }
        self.list_open
    }

    pub fn toggle_directions(&mut self) -> bool {
        self.directions_open = !self.directions_open;
        if self.directions_open && self.compact {
            self.list_open = false;
        }
        self.directions_open
    }

    /// Switching to a compact viewport with both panels open keeps the list.
    pub fn set_compact(&mut self, compact: bool) {
        self.compact = compact;
        if compact && self.list_open && self.directions_open {
            self.directions_open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_hidden_by_default() {
        let panels = Panels::default();
        assert!(!panels.directions_open());
        assert!(!panels.list_open());
    }

    #[test]
    fn wide_viewport_allows_both() {
        let mut panels = Panels::default();
        panels.open_list();
        assert!(panels.toggle_directions());
        assert!(panels.list_open());
    }

    #[test]
    fn compact_viewport_is_exclusive() {
        let mut panels = Panels::default();
        panels.set_compact(true);
        panels.open_list();
        assert!(panels.toggle_directions());
        assert!(!panels.list_open());
        assert!(panels.toggle_list());
        assert!(!panels.directions_open());
    }

    #[test]
    fn shrinking_closes_directions() {
        let mut panels = Panels::default();
        panels.open_list();
        panels.toggle_directions();
        panels.set_compact(true);
        assert!(panels.list_open());
        assert!(!panels.directions_open());
    }
}
