//! The one stateful object: dataset, group selection and colors, navigation
//! and freshness, driven from a single thread.

use chrono::{NaiveDate, Timelike, Utc};
use log::{debug, error, info};
use serde::Serialize;

use crate::color::{group_color, sort_groups};
use crate::date::Clock;
use crate::decoder::{decode, Payload};
use crate::error::LoadError;
use crate::freshness::{Freshness, FreshnessMonitor};
use crate::layout::{layout_day, HourMark, Placement, Timeline};
use crate::navigation::{NavigationState, Navigator, View};
use crate::prefs::PreferenceStore;
use crate::structs::{Dataset, Event};
use crate::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub color: String,
}

/// One day column of the current window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayColumn<'a> {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<Placement<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_indicator: Option<f64>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation<'a> {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<&'a str>,
    pub navigation: NavigationState,
    pub groups: &'a [Group],
    pub selected_groups: &'a [String],
    pub timeline: Timeline,
    pub hour_marks: Vec<HourMark>,
    pub days: Vec<DayColumn<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freshness: Option<&'a Freshness>,
    pub sidebar_collapsed: bool,
    pub show_instructions: bool,
}

/// Outcome of one periodic tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub freshness: Option<Freshness>,
    /// Date and pixel offset of the "now" line, when today is on screen
    /// inside the timeline hours.
    pub time_indicator: Option<(NaiveDate, f64)>,
}

pub struct Engine<C, P> {
    settings: Settings,
    clock: C,
    store: P,
    dataset: Option<Dataset>,
    last_error: Option<String>,
    groups: Vec<Group>,
    selected: Vec<String>,
    navigator: Navigator,
    monitor: FreshnessMonitor,
    freshness: Option<Freshness>,
    available_height: f64,
}

impl<C: Clock, P: PreferenceStore> Engine<C, P> {
    /// Reads the persisted view and selection once; nothing is loaded yet.
    pub fn new(settings: Settings, clock: C, store: P) -> Self {
        let view = store.view().unwrap_or_default();
        let selected = store.selected_groups().unwrap_or_default();
        let monitor = FreshnessMonitor::new(settings.stale_threshold_hours);
        Self {
            settings,
            clock,
            store,
            dataset: None,
            last_error: None,
            groups: Vec::new(),
            selected,
            navigator: Navigator::new(view, 0),
            monitor,
            freshness: None,
            available_height: 0.0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn events(&self) -> &[Event] {
        self.dataset.as_ref().map_or(&[][..], |dataset| dataset.events.as_slice())
    }

    pub fn is_available(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn navigator(&self) -> Navigator {
        self.navigator
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn selected_groups(&self) -> &[String] {
        &self.selected
    }

    pub fn color_of(&self, group: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .map(|g| g.color.as_str())
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Takes the outcome of a fetch. On success the dataset is replaced
    /// wholesale; on failure the previous dataset, if any, stays on screen
    /// and the error is kept for display. The returned freshness is the only
    /// place a stale alert raised by this reload shows up.
    pub fn reload(&mut self, fetched: Result<Payload, LoadError>) -> Result<Option<Freshness>, LoadError> {
        match fetched.and_then(|payload| Ok(decode(payload)?)) {
            Ok(dataset) => Ok(self.replace(dataset)),
            Err(err) => {
                error!("failed to load schedule: {err}");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Installs a decoded dataset, recomputing everything derived from it.
    pub fn replace(&mut self, dataset: Dataset) -> Option<Freshness> {
        let today = self.today();
        let max_offset = dataset.max_offset(today);

        let mut names = dataset.meta.groups.clone();
        sort_groups(&mut names, &self.settings.pinned_groups);
        names.dedup();
        self.groups = names
            .into_iter()
            .map(|name| Group {
                color: group_color(&self.settings.group_colors, &name),
                name,
            })
            .collect();

        if self.store.selected_groups().is_none() {
            self.selected = self.groups.iter().map(|g| g.name.clone()).collect();
            self.store.set_selected_groups(&self.selected);
        }

        info!(
            "loaded {} events in {} groups, {} days ahead",
            dataset.events.len(),
            self.groups.len(),
            max_offset
        );

        self.navigator = self.navigator.with_max_offset(max_offset);
        self.dataset = Some(dataset);
        self.last_error = None;
        self.freshness = None;
        self.evaluate_freshness()
    }

    /// The cached copy never carries the alert; it is handed out once by
    /// the call that raised it.
    fn evaluate_freshness(&mut self) -> Option<Freshness> {
        let scraped_at = self.dataset.as_ref()?.meta.scraped_at?;
        let now = self.clock.now().with_timezone(&Utc);
        let freshness = self.monitor.check(scraped_at, now);
        self.freshness = Some(Freshness {
            alert: false,
            ..freshness.clone()
        });
        Some(freshness)
    }

    /// The once-a-minute refresh of time-dependent state.
    pub fn tick(&mut self) -> Tick {
        let freshness = self.evaluate_freshness();
        let now = self.clock.now();
        let today = now.date_naive();
        let minutes = now.hour() * 60 + now.minute();

        let time_indicator = self
            .navigator
            .window(today)
            .contains(today)
            .then(|| self.timeline().time_indicator(minutes))
            .flatten()
            .map(|top| (today, top));

        Tick {
            freshness,
            time_indicator,
        }
    }

    pub fn freshness(&self) -> Option<&Freshness> {
        self.freshness.as_ref()
    }

    pub fn set_available_height(&mut self, pixels: f64) {
        self.available_height = pixels;
    }

    pub fn timeline(&self) -> Timeline {
        Timeline::fit(&self.settings, self.available_height)
    }

    fn navigate(&mut self, transition: impl FnOnce(Navigator) -> Navigator) -> NavigationState {
        let before = self.navigator.offset();
        self.navigator = transition(self.navigator);
        debug!("offset {} -> {}", before, self.navigator.offset());
        self.navigator.state()
    }

    pub fn next(&mut self) -> NavigationState {
        self.navigate(Navigator::next)
    }

    pub fn prev(&mut self) -> NavigationState {
        self.navigate(Navigator::prev)
    }

    pub fn next_day(&mut self) -> NavigationState {
        self.navigate(Navigator::next_day)
    }

    pub fn prev_day(&mut self) -> NavigationState {
        self.navigate(Navigator::prev_day)
    }

    pub fn next_week(&mut self) -> NavigationState {
        self.navigate(Navigator::next_week)
    }

    pub fn prev_week(&mut self) -> NavigationState {
        self.navigate(Navigator::prev_week)
    }

    pub fn go_to_today(&mut self) -> NavigationState {
        self.navigate(Navigator::go_to_today)
    }

    pub fn switch_view(&mut self, view: View) -> NavigationState {
        if view != self.navigator.view() {
            let today = self.today();
            let events = self.dataset.as_ref().map_or(&[][..], |d| d.events.as_slice());
            self.navigator = self
                .navigator
                .switch_view(view, today, events, &self.selected);
            self.store.set_view(view);
        }
        self.navigator.state()
    }

    pub fn set_selected_groups(&mut self, groups: Vec<String>) {
        self.selected = groups;
        self.store.set_selected_groups(&self.selected);
    }

    /// Flips one group in or out of the selection. Returns whether it is
    /// selected afterwards.
    pub fn toggle_group(&mut self, group: &str) -> bool {
        let selected = match self.selected.iter().position(|g| g == group) {
            Some(index) => {
                self.selected.remove(index);
                false
            }
            None => {
                self.selected.push(group.to_string());
                true
            }
        };
        self.store.set_selected_groups(&self.selected);
        selected
    }

    /// Toggles the group at `index` in catalog order, if there is one.
    pub fn toggle_group_at(&mut self, index: usize) -> Option<bool> {
        let name = self.groups.get(index)?.name.clone();
        Some(self.toggle_group(&name))
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        let collapsed = !self.store.sidebar_collapsed();
        self.store.set_sidebar_collapsed(collapsed);
        collapsed
    }

    pub fn dismiss_instructions(&mut self) {
        self.store.set_visited(true);
    }

    /// Events of the selected groups, in dataset order.
    pub fn visible_events(&self) -> impl Iterator<Item = &Event> {
        self.events()
            .iter()
            .filter(move |event| event.in_group(&self.selected))
    }

    pub fn day_columns(&self) -> Vec<DayColumn<'_>> {
        let Some(dataset) = self.dataset.as_ref() else {
            return Vec::new();
        };

        let now = self.clock.now();
        let today = now.date_naive();
        let timeline = self.timeline();

        self.navigator
            .window(today)
            .days()
            .map(|date| DayColumn {
                date,
                is_today: date == today,
                events: layout_day(dataset.events_on(date, &self.selected), &timeline),
                time_indicator: (date == today)
                    .then(|| timeline.time_indicator(now.hour() * 60 + now.minute()))
                    .flatten(),
            })
            .collect()
    }

    pub fn presentation(&self) -> Presentation<'_> {
        let timeline = self.timeline();
        Presentation {
            available: self.is_available(),
            last_error: self.last_error(),
            navigation: self.navigator.state(),
            groups: &self.groups,
            selected_groups: &self.selected,
            timeline,
            hour_marks: timeline.hour_marks(),
            days: self.day_columns(),
            freshness: self.freshness(),
            sidebar_collapsed: self.store.sidebar_collapsed(),
            show_instructions: !self.store.visited(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::FixedClock;
    use crate::decoder::PayloadMeta;
    use crate::prefs::MemoryStore;
    use chrono::{DateTime, Duration};
    use serde_json::json;

    // Wednesday 2025-10-15, 10:30 UTC.
    fn clock() -> FixedClock {
        FixedClock(DateTime::parse_from_rfc3339("2025-10-15T10:30:00+00:00").unwrap())
    }

    fn payload() -> Payload {
        serde_json::from_value(json!({
            "schema": ["t", "d", "st", "et", "g", "l"],
            "events": [
                ["Planification", 151025, 900, 1000, 0, "Salle 101"],
                ["Projet", 151025, 930, 1030, 1, "Salle 102"],
                ["Examen", 241025, 1400, 1600, 1, null],
                ["Cassé", 161025, 1600, 1500, 0, "Salle 103"],
            ],
            "meta": { "c": ["MADI", "M2"], "ts": "2025-10-15T06:00:00Z" }
        }))
        .unwrap()
    }

    fn engine() -> Engine<FixedClock, MemoryStore> {
        let mut engine = Engine::new(Settings::default(), clock(), MemoryStore::default());
        engine.reload(Ok(payload())).unwrap();
        engine
    }

    #[test]
    fn reload_installs_dataset_and_defaults() {
        let engine = engine();
        assert!(engine.is_available());
        assert_eq!(engine.events().len(), 4);
        assert_eq!(engine.navigator().max_offset(), 9);
        let names = engine.groups().iter().map(|g| g.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["M2", "MADI"]);
        assert_eq!(engine.selected_groups(), ["M2", "MADI"]);
        assert_eq!(engine.store().0.selected_groups.as_deref(), Some(&["M2".to_string(), "MADI".to_string()][..]));
        assert_eq!(engine.color_of("M2"), Some("#eb0909"));
        assert!(!engine.freshness().unwrap().stale);
    }

    #[test]
    fn persisted_selection_survives_reload() {
        let mut store = MemoryStore::default();
        store.set_selected_groups(&["M2".to_string()]);
        store.set_view(View::Weekly);

        let mut engine = Engine::new(Settings::default(), clock(), store);
        engine.reload(Ok(payload())).unwrap();
        assert_eq!(engine.selected_groups(), ["M2"]);
        assert_eq!(engine.navigator().view(), View::Weekly);
    }

    #[test]
    fn failed_reload_keeps_previous_data() {
        let mut engine = engine();
        let err = engine.reload(Err(LoadError::Fetch("HTTP 502".into()))).unwrap_err();
        assert!(matches!(err, LoadError::Fetch(_)));
        assert!(engine.is_available());
        assert_eq!(engine.last_error(), Some("failed to fetch dataset: HTTP 502"));

        let mut fresh = Engine::new(Settings::default(), clock(), MemoryStore::default());
        let broken = Payload {
            meta: Some(PayloadMeta::default()),
            ..payload()
        };
        assert!(fresh.reload(Ok(broken)).is_err());
        assert!(!fresh.is_available());
        assert!(fresh.presentation().days.is_empty());
    }

    #[test]
    fn day_columns_lay_out_selected_groups() {
        let mut engine = engine();
        let days = engine.day_columns();
        assert_eq!(days.len(), 2);
        assert!(days[0].is_today);
        assert_eq!(days[0].events.len(), 2);
        assert!(days[0].events.iter().all(|p| p.total_columns == 2));
        assert!(days[0].time_indicator.is_some());
        // The inverted 16:00-15:00 event stays in the raw collection only.
        assert!(days[1].events.is_empty());

        assert!(!engine.toggle_group("M2"));
        let days = engine.day_columns();
        assert_eq!(days[0].events.len(), 1);
        assert_eq!(days[0].events[0].total_columns, 1);
        assert_eq!(engine.toggle_group_at(0), Some(true));
        assert_eq!(engine.toggle_group_at(9), None);
    }

    #[test]
    fn navigation_persists_view() {
        let mut engine = engine();
        let state = engine.switch_view(View::Weekly);
        assert_eq!(state.view, View::Weekly);
        assert_eq!(engine.store().0.view, Some(View::Weekly));

        let state = engine.next();
        assert_eq!(state.offset, 7);
        assert!(state.can_go_next);
        let state = engine.next();
        assert_eq!(state.offset, 9);
        assert!(!state.can_go_next);

        // Back to daily lands on the first visible event of the displayed
        // week (Friday 24th).
        let state = engine.switch_view(View::Daily);
        assert_eq!(state.offset, 9);
        assert_eq!(engine.go_to_today().offset, 0);
    }

    #[test]
    fn tick_fires_stale_alert_once() {
        let mut engine = engine();
        engine.clock_mut().advance(Duration::hours(20));
        let tick = engine.tick();
        assert!(tick.freshness.as_ref().is_some_and(|f| f.stale && f.alert));
        let tick = engine.tick();
        assert!(tick.freshness.as_ref().is_some_and(|f| f.stale && !f.alert));
    }

    #[test]
    fn presentation_never_repeats_the_alert() {
        let mut engine = Engine::new(Settings::default(), clock(), MemoryStore::default());
        let mut stale = payload();
        stale.meta = Some(PayloadMeta {
            ts: Some("2025-10-13T06:00:00Z".into()),
            ..stale.meta.unwrap()
        });

        let freshness = engine.reload(Ok(stale)).unwrap().unwrap();
        assert!(freshness.stale && freshness.alert);

        for _ in 0..2 {
            let shown = engine.presentation().freshness.cloned().unwrap();
            assert!(shown.stale);
            assert!(!shown.alert);
        }
    }

    #[test]
    fn reload_without_timestamp_clears_freshness() {
        let mut engine = engine();
        assert!(engine.freshness().is_some());

        let mut undated = payload();
        undated.meta = Some(PayloadMeta {
            ts: None,
            ..undated.meta.unwrap()
        });
        assert_eq!(engine.reload(Ok(undated)).unwrap(), None);
        assert_eq!(engine.freshness(), None);
        assert!(engine.presentation().freshness.is_none());
        assert_eq!(engine.tick().freshness, None);
    }

    #[test]
    fn tick_places_time_indicator_only_when_today_is_shown() {
        let mut engine = engine();
        let tick = engine.tick();
        let (date, top) = tick.time_indicator.unwrap();
        assert_eq!(date, engine.today());
        assert_eq!(top, 4.5 * 60.0);

        engine.next();
        assert_eq!(engine.tick().time_indicator, None);
    }

    #[test]
    fn presentation_serializes() {
        let mut engine = engine();
        engine.toggle_sidebar();
        engine.dismiss_instructions();
        let json = serde_json::to_value(engine.presentation()).unwrap();
        assert_eq!(json["available"], true);
        assert_eq!(json["navigation"]["canGoPrev"], false);
        assert_eq!(json["navigation"]["canGoNext"], true);
        assert_eq!(json["days"][0]["date"], "2025-10-15");
        assert_eq!(json["days"][0]["events"][1]["columnIndex"], 1);
        assert_eq!(json["days"][0]["events"][1]["event"]["title"], "Projet");
        assert_eq!(json["freshness"]["label"], "Last update: 4 hours ago");
        assert_eq!(json["sidebarCollapsed"], true);
        assert_eq!(json["showInstructions"], false);
    }
}
