use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{error, warn};
use schedule_core::{PreferenceStore, Preferences, View};

/// Preferences kept in a JSON file and rewritten on every change. Without
/// a path they only live as long as the process.
#[derive(Debug, Default)]
pub struct FileStore {
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl FileStore {
    pub fn open(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let prefs = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!("ignoring unreadable preferences in {}: {err}", path.display());
                Preferences::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Preferences::default(),
            Err(err) => {
                warn!("could not read preferences from {}: {err}", path.display());
                Preferences::default()
            }
        };

        Self {
            path: Some(path),
            prefs,
        }
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_vec_pretty(&self.prefs)
            .map_err(|err| err.to_string())
            .and_then(|bytes| fs::write(path, bytes).map_err(|err| err.to_string()));
        if let Err(err) = result {
            error!("could not write preferences to {}: {err}", path.display());
        }
    }
}

impl PreferenceStore for FileStore {
    fn selected_groups(&self) -> Option<Vec<String>> {
        self.prefs.selected_groups.clone()
    }

    fn set_selected_groups(&mut self, groups: &[String]) {
        self.prefs.selected_groups = Some(groups.to_vec());
        self.save();
    }

    fn view(&self) -> Option<View> {
        self.prefs.view
    }

    fn set_view(&mut self, view: View) {
        self.prefs.view = Some(view);
        self.save();
    }

    fn sidebar_collapsed(&self) -> bool {
        self.prefs.sidebar_collapsed
    }

    fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.prefs.sidebar_collapsed = collapsed;
        self.save();
    }

    fn visited(&self) -> bool {
        self.prefs.visited
    }

    fn set_visited(&mut self, visited: bool) {
        self.prefs.visited = visited;
        self.save();
    }
}
