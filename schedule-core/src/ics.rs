use ics::{
    parameters::TzIDParam,
    properties::{Categories, DtEnd, DtStart, Location, RRule, Summary, TzName},
    Daylight, ICalendar, Standard, TimeZone,
};

use crate::date::Clock;
use crate::engine::Engine;
use crate::prefs::PreferenceStore;
use crate::structs::Event;

const TZID: &str = "Europe/Paris";

fn timezone() -> TimeZone<'static> {
    let mut cet_standard = Standard::new("19701025T030000", "+0200", "+0100");
    cet_standard.push(TzName::new("CET"));
    cet_standard.push(RRule::new("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"));

    let mut cest_daylight = Daylight::new("19700329T020000", "+0100", "+0200");
    cest_daylight.push(TzName::new("CEST"));
    cest_daylight.push(RRule::new("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"));

    let mut timezone = TimeZone::daylight(TZID, cest_daylight);
    timezone.add_standard(cet_standard);
    timezone
}

/// Calendar holding every event that can be placed on a timeline.
#[must_use]
pub fn to_ics<'a, I>(name: &'a str, events: I) -> ICalendar<'a>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut icalendar = ICalendar::new("2.0", name);
    icalendar.add_timezone(timezone());

    for event in events.into_iter().filter_map(Event::to_ics) {
        icalendar.add_event(event);
    }

    icalendar
}

impl Event {
    /// `None` when the event has no readable date or no positive duration.
    #[must_use]
    pub fn to_ics(&self) -> Option<ics::Event<'_>> {
        if !self.is_layout_eligible() {
            return None;
        }
        let date = self.date?;
        let end_date = self.end_date.unwrap_or(date);

        let start = format!("{}T{}00", date.format("%Y%m%d"), self.start?.format("%H%M"));
        let end = format!("{}T{}00", end_date.format("%Y%m%d"), self.end?.format("%H%M"));

        let id = format!("{}_{}", start, self.title.replace(' ', "-"));

        let mut ics_event = ics::Event::new(id, start.clone());

        let mut dtstart = DtStart::new(start);
        dtstart.add(TzIDParam::new(TZID));
        ics_event.push(dtstart);

        let mut dtend = DtEnd::new(end);
        dtend.add(TzIDParam::new(TZID));
        ics_event.push(dtend);
        ics_event.push(Summary::new(&self.title));

        if let Some(location) = &self.location {
            ics_event.push(Location::new(location));
        }

        if let Some(group) = &self.group {
            ics_event.push(Categories::new(group));
        }

        Some(ics_event)
    }
}

impl<C: Clock, P: PreferenceStore> Engine<C, P> {
    /// The selected groups as an iCalendar feed.
    #[must_use]
    pub fn to_ics<'a>(&'a self, name: &'a str) -> ICalendar<'a> {
        to_ics(name, self.visible_events())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn event(start: (u32, u32), end: (u32, u32)) -> Event {
        Event {
            date: NaiveDate::from_ymd_opt(2025, 10, 15),
            end_date: NaiveDate::from_ymd_opt(2025, 10, 15),
            start: NaiveTime::from_hms_opt(start.0, start.1, 0),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0),
            group: Some("MADI".into()),
            title: "Décision dans l'incertain".into(),
            location: Some("Esclangon 101".into()),
        }
    }

    #[test]
    fn exports_timed_events() {
        let events = [event((9, 0), (10, 30)), event((11, 0), (11, 0))];
        let ics = to_ics("M2", &events).to_string();

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
        assert!(ics.contains("DTSTART;TZID=Europe/Paris:20251015T090000"));
        assert!(ics.contains("DTEND;TZID=Europe/Paris:20251015T103000"));
        assert!(ics.contains("CATEGORIES:MADI"));
        assert!(ics.contains("TZID:Europe/Paris"));
    }
}
