use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Serialize, Serializer};

use crate::date::days_between;
use crate::error::EventParseWarning;

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%H:%M";

fn serialize_day<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
        None => serializer.serialize_none(),
    }
}

fn serialize_clock<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
    match time {
        Some(time) => serializer.serialize_str(&format!("{:02}:{:02}", time.hour(), time.minute())),
        None => serializer.serialize_none(),
    }
}

/// One decoded course session. Fields that failed to parse are `None`; such
/// an event is kept here but is never laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    #[serde(serialize_with = "serialize_day")]
    pub date: Option<NaiveDate>,
    #[serde(serialize_with = "serialize_day")]
    pub end_date: Option<NaiveDate>,
    #[serde(serialize_with = "serialize_clock")]
    pub start: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_clock")]
    pub end: Option<NaiveTime>,
    pub group: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

impl Event {
    pub fn start_minutes(&self) -> Option<u32> {
        self.start.map(minute_of_day)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        self.end.map(minute_of_day)
    }

    /// Both times are readable and the event has a positive duration.
    pub fn is_layout_eligible(&self) -> bool {
        matches!(
            (self.start_minutes(), self.end_minutes()),
            (Some(start), Some(end)) if end > start
        )
    }

    pub fn in_group(&self, selected: &[String]) -> bool {
        self.group
            .as_ref()
            .is_some_and(|group| selected.iter().any(|s| s == group))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Group names, indexed by the encoded `g` column.
    pub groups: Vec<String>,
    pub scraped_at: Option<DateTime<Utc>>,
}

/// Everything one successful load produced. Replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub events: Vec<Event>,
    pub meta: Metadata,
    pub warnings: Vec<EventParseWarning>,
}

impl Dataset {
    /// Chronologically latest start date over the whole collection.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.events.iter().filter_map(|event| event.date).max()
    }

    /// Furthest a viewer anchored at `today` may navigate forward.
    pub fn max_offset(&self, today: NaiveDate) -> i64 {
        self.latest_date()
            .map_or(0, |latest| days_between(today, latest).max(0))
    }

    pub fn events_on<'a>(
        &'a self,
        day: NaiveDate,
        selected: &'a [String],
    ) -> impl Iterator<Item = &'a Event> + 'a {
        self.events
            .iter()
            .filter(move |event| event.date == Some(day) && event.in_group(selected))
    }
}
