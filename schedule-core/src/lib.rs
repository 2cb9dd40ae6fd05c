//! Decoding, navigation and layout for a personal course schedule.
//!
//! The compact dataset is decoded once into [`Event`]s, the [`Navigator`]
//! decides which days are on screen and [`layout_day`] turns each day's
//! overlapping events into side-by-side geometry. [`Engine`] ties these
//! together with the group selection, colors and freshness tracking.

use std::collections::HashMap;

mod color;
mod date;
mod decoder;
mod engine;
mod error;
mod freshness;
mod layout;
mod navigation;
mod prefs;
mod structs;

#[cfg(feature = "ics")]
mod ics;

#[cfg(feature = "ics")]
pub use self::ics::to_ics;
pub use color::{
    group_color, hashed_color, hex_to_rgba, sort_groups, DEFAULT_GROUP_COLORS, DEFAULT_PINNED_GROUPS,
};
pub use date::{add_days, days_between, monday_of, Clock, DayWindow, FixedClock, SystemClock};
pub use decoder::{decode, decode_str, expand_date, expand_time, Payload, PayloadMeta, END_DATE_KEY, REQUIRED_KEYS};
pub use engine::{DayColumn, Engine, Group, Presentation, Tick};
pub use error::{DecodeError, EventParseWarning, LoadError};
pub use freshness::{Freshness, FreshnessMonitor, UpdateAge};
pub use layout::{collision_blocks, layout_day, pack_columns, HourMark, Placement, Slot, Timeline};
pub use navigation::{NavigationState, Navigator, View, DAILY_SPAN, WEEKLY_SPAN};
pub use prefs::{MemoryStore, PreferenceStore, Preferences};
pub use structs::{Dataset, Event, Metadata};

/// Tunables shared by every renderer.
#[derive(Debug, Clone)]
pub struct Settings {
    /// First hour drawn on the timeline.
    pub start_hour: u32,
    /// Last hour drawn on the timeline.
    pub end_hour: u32,
    pub min_hour_height: f64,
    pub min_event_height: f64,
    pub stale_threshold_hours: f64,
    /// Explicit group colors; other groups get a hashed one.
    pub group_colors: HashMap<String, String>,
    /// Groups listed first, in this order.
    pub pinned_groups: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 21,
            min_hour_height: 60.0,
            min_event_height: 20.0,
            stale_threshold_hours: 24.0,
            group_colors: DEFAULT_GROUP_COLORS.clone(),
            pinned_groups: DEFAULT_PINNED_GROUPS.map(String::from).to_vec(),
        }
    }
}
