//! Persisted viewer preferences. Storage itself lives outside the core.

use serde::{Deserialize, Serialize};

use crate::navigation::View;

/// Key-value storage for the handful of settings that survive restarts.
/// Writes are independent scalar or list replacements.
pub trait PreferenceStore {
    fn selected_groups(&self) -> Option<Vec<String>>;
    fn set_selected_groups(&mut self, groups: &[String]);

    fn view(&self) -> Option<View>;
    fn set_view(&mut self, view: View);

    fn sidebar_collapsed(&self) -> bool;
    fn set_sidebar_collapsed(&mut self, collapsed: bool);

    /// Whether the first-visit instructions were dismissed.
    fn visited(&self) -> bool;
    fn set_visited(&mut self, visited: bool);
}

/// The stored values themselves, also the on-disk shape of file stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub selected_groups: Option<Vec<String>>,
    #[serde(rename = "calendarView")]
    pub view: Option<View>,
    pub sidebar_collapsed: bool,
    #[serde(rename = "calendarVisited")]
    pub visited: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore(pub Preferences);

impl PreferenceStore for MemoryStore {
    fn selected_groups(&self) -> Option<Vec<String>> {
        self.0.selected_groups.clone()
    }

    fn set_selected_groups(&mut self, groups: &[String]) {
        self.0.selected_groups = Some(groups.to_vec());
    }

    fn view(&self) -> Option<View> {
        self.0.view
    }

    fn set_view(&mut self, view: View) {
        self.0.view = Some(view);
    }

    fn sidebar_collapsed(&self) -> bool {
        self.0.sidebar_collapsed
    }

    fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.0.sidebar_collapsed = collapsed;
    }

    fn visited(&self) -> bool {
        self.0.visited
    }

    fn set_visited(&mut self, visited: bool) {
        self.0.visited = visited;
    }
}
