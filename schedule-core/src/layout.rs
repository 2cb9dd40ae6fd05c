//! Side-by-side geometry for one day's overlapping events.
//!
//! Events are split into collision blocks by chaining on the running maximum
//! end time, then packed first-fit into columns inside each block. Every
//! event of a block shares the block's column count. This is deliberately
//! not a minimal interval coloring: a long event can force extra columns on
//! a later sub-chain that would not need them on its own.

use serde::Serialize;

use crate::structs::Event;
use crate::Settings;

/// Vertical scale of a day column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub start_hour: u32,
    pub end_hour: u32,
    pub hour_height: f64,
    pub min_event_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourMark {
    pub hour: u32,
    pub top: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Timeline {
    /// Scale that fills `available_height` pixels without going below the
    /// configured minimum hour height.
    pub fn fit(settings: &Settings, available_height: f64) -> Self {
        let hours = f64::from(settings.end_hour.saturating_sub(settings.start_hour).max(1));
        Self {
            start_hour: settings.start_hour,
            end_hour: settings.end_hour,
            hour_height: settings.min_hour_height.max(available_height / hours),
            min_event_height: settings.min_event_height,
        }
    }

    pub fn window_start_minutes(&self) -> u32 {
        self.start_hour * 60
    }

    pub fn window_end_minutes(&self) -> u32 {
        self.end_hour * 60
    }

    /// Pixel offset of a minute-of-day from the top of the timeline.
    pub fn top_of(&self, minutes: u32) -> f64 {
        (f64::from(minutes) - f64::from(self.window_start_minutes())) / 60.0 * self.hour_height
    }

    pub fn height(&self) -> f64 {
        f64::from(self.end_hour.saturating_sub(self.start_hour)) * self.hour_height
    }

    /// A line for every hour, a label for every hour strictly inside.
    pub fn hour_marks(&self) -> Vec<HourMark> {
        (self.start_hour..=self.end_hour)
            .map(|hour| HourMark {
                hour,
                top: f64::from(hour - self.start_hour) * self.hour_height,
                label: (hour > self.start_hour && hour < self.end_hour).then(|| format!("{hour}:00")),
            })
            .collect()
    }

    /// Where the "now" line goes, if `minutes` falls inside the timeline.
    pub fn time_indicator(&self, minutes: u32) -> Option<f64> {
        (self.window_start_minutes()..=self.window_end_minutes())
            .contains(&minutes)
            .then(|| self.top_of(minutes))
    }
}

/// An event annotated with its render geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement<'a> {
    pub event: &'a Event,
    pub start_minutes: u32,
    pub end_minutes: u32,
    pub top: f64,
    pub height: f64,
    pub column_index: usize,
    pub total_columns: usize,
    pub left: f64,
    pub width: f64,
}

impl Placement<'_> {
    pub fn overlaps(&self, other: &Placement<'_>) -> bool {
        self.start_minutes < other.end_minutes && other.start_minutes < self.end_minutes
    }
}

/// Column slot assigned to one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub column: usize,
    pub total_columns: usize,
}

/// Splits start-sorted `(start, end)` intervals into collision blocks,
/// returned as index ranges. A new block opens when an interval starts at
/// or after the maximum end seen so far in the current one.
pub fn collision_blocks(spans: &[(u32, u32)]) -> Vec<std::ops::Range<usize>> {
    let mut blocks = Vec::new();
    let Some(&(_, first_end)) = spans.first() else {
        return blocks;
    };

    let mut block_start = 0;
    let mut max_end = first_end;
    for (index, &(start, end)) in spans.iter().enumerate().skip(1) {
        if start >= max_end {
            blocks.push(block_start..index);
            block_start = index;
            max_end = end;
        } else {
            max_end = max_end.max(end);
        }
    }
    blocks.push(block_start..spans.len());
    blocks
}

/// First-fit column packing of one start-sorted block.
pub fn pack_columns(block: &[(u32, u32)]) -> Vec<Slot> {
    // End time of the last event placed in each column.
    let mut column_ends: Vec<u32> = Vec::new();
    let columns = block
        .iter()
        .map(|&(start, end)| {
            match column_ends.iter().position(|&last_end| start >= last_end) {
                Some(column) => {
                    column_ends[column] = end;
                    column
                }
                None => {
                    column_ends.push(end);
                    column_ends.len() - 1
                }
            }
        })
        .collect::<Vec<_>>();

    let total_columns = column_ends.len();
    columns
        .into_iter()
        .map(|column| Slot {
            column,
            total_columns,
        })
        .collect()
}

/// Lays out one day. `events` should already be limited to that day and to
/// the selected groups; events without a positive, readable duration are
/// dropped. Output is in start-time order.
pub fn layout_day<'a, I>(events: I, timeline: &Timeline) -> Vec<Placement<'a>>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut timed = events
        .into_iter()
        .filter_map(|event| match (event.start_minutes(), event.end_minutes()) {
            (Some(start), Some(end)) if end > start => Some((event, start, end)),
            _ => None,
        })
        .collect::<Vec<_>>();
    timed.sort_by_key(|&(_, start, _)| start);

    let spans = timed.iter().map(|&(_, start, end)| (start, end)).collect::<Vec<_>>();

    let mut placements = Vec::with_capacity(timed.len());
    for block in collision_blocks(&spans) {
        let slots = pack_columns(&spans[block.clone()]);
        for (&(event, start, end), slot) in timed[block].iter().zip(slots) {
            let width = 100.0 / slot.total_columns as f64;
            placements.push(Placement {
                event,
                start_minutes: start,
                end_minutes: end,
                top: timeline.top_of(start),
                height: (f64::from(end - start) / 60.0 * timeline.hour_height)
                    .max(timeline.min_event_height),
                column_index: slot.column,
                total_columns: slot.total_columns,
                left: slot.column as f64 * width,
                width,
            });
        }
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use proptest::prelude::*;

    fn timeline() -> Timeline {
        Timeline {
            start_hour: 6,
            end_hour: 21,
            hour_height: 60.0,
            min_event_height: 20.0,
        }
    }

    fn event(start: &str, end: &str) -> Event {
        Event {
            date: None,
            end_date: None,
            start: NaiveTime::parse_from_str(start, "%H:%M").ok(),
            end: NaiveTime::parse_from_str(end, "%H:%M").ok(),
            group: Some("M2".into()),
            title: format!("{start}-{end}"),
            location: None,
        }
    }

    #[test]
    fn empty_day_has_no_placements() {
        assert!(layout_day(&Vec::<Event>::new(), &timeline()).is_empty());
        assert!(collision_blocks(&[]).is_empty());
    }

    #[test]
    fn single_event_is_full_width() {
        let events = [event("08:00", "09:30")];
        let placed = layout_day(&events, &timeline());
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].total_columns, 1);
        assert_eq!(placed[0].width, 100.0);
        assert_eq!(placed[0].left, 0.0);
        assert_eq!(placed[0].top, 120.0);
        assert_eq!(placed[0].height, 90.0);
    }

    #[test]
    fn short_events_get_minimum_height() {
        let events = [event("08:00", "08:10")];
        let placed = layout_day(&events, &timeline());
        assert_eq!(placed[0].height, 20.0);
    }

    #[test]
    fn unreadable_or_empty_events_are_dropped() {
        let events = [
            event("10:00", "10:00"),
            event("11:00", "10:00"),
            event("bad", "10:00"),
            event("09:00", "10:00"),
        ];
        let placed = layout_day(&events, &timeline());
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].event.title, "09:00-10:00");
    }

    #[test]
    fn output_is_sorted_by_start() {
        let events = [event("13:00", "14:00"), event("08:00", "09:00"), event("10:00", "11:00")];
        let starts = layout_day(&events, &timeline())
            .iter()
            .map(|p| p.start_minutes)
            .collect::<Vec<_>>();
        assert_eq!(starts, [480, 600, 780]);
    }

    #[test]
    fn chained_block_keeps_wide_column_count() {
        // 08-12 overlaps both 09-10 and 10-11, so all three share one block;
        // 10-11 reuses the column 09-10 freed up.
        let spans = [(480, 720), (540, 600), (600, 660)];
        assert_eq!(collision_blocks(&spans), vec![0..3]);
        let slots = pack_columns(&spans);
        assert_eq!(
            slots.iter().map(|s| s.column).collect::<Vec<_>>(),
            [0, 1, 1]
        );
        assert!(slots.iter().all(|s| s.total_columns == 2));
    }

    #[test]
    fn later_block_is_independent() {
        let spans = [(480, 540), (500, 560), (600, 660)];
        assert_eq!(collision_blocks(&spans), vec![0..2, 2..3]);
        assert_eq!(pack_columns(&spans[2..3])[0].total_columns, 1);
    }

    #[test]
    fn timeline_marks_and_indicator() {
        let timeline = timeline();
        let marks = timeline.hour_marks();
        assert_eq!(marks.len(), 16);
        assert_eq!(marks[0].label, None);
        assert_eq!(marks[1].label.as_deref(), Some("7:00"));
        assert_eq!(marks[15].label, None);
        assert_eq!(timeline.height(), 900.0);

        assert_eq!(timeline.time_indicator(5 * 60 + 59), None);
        assert_eq!(timeline.time_indicator(6 * 60), Some(0.0));
        assert_eq!(timeline.time_indicator(12 * 60 + 30), Some(390.0));
        assert_eq!(timeline.time_indicator(21 * 60 + 1), None);
    }

    #[test]
    fn fit_respects_minimum_hour_height() {
        let settings = Settings::default();
        assert_eq!(Timeline::fit(&settings, 300.0).hour_height, 60.0);
        assert_eq!(Timeline::fit(&settings, 1500.0).hour_height, 100.0);
    }

    fn spans() -> impl Strategy<Value = Vec<(u32, u32)>> {
        prop::collection::vec((360u32..1200, 1u32..200), 0..25)
            .prop_map(|raw| raw.into_iter().map(|(start, len)| (start, start + len)).collect())
    }

    proptest! {
        #[test]
        fn columns_never_overlap(raw in spans()) {
            let events = raw
                .iter()
                .map(|&(start, end)| Event {
                    date: None,
                    end_date: None,
                    start: NaiveTime::from_hms_opt(start / 60, start % 60, 0),
                    end: NaiveTime::from_hms_opt(end / 60, end % 60, 0),
                    group: None,
                    title: String::new(),
                    location: None,
                })
                .collect::<Vec<_>>();
            let placed = layout_day(&events, &timeline());

            for (i, a) in placed.iter().enumerate() {
                prop_assert!(a.column_index < a.total_columns);
                for b in &placed[i + 1..] {
                    prop_assert!(
                        !(a.column_index == b.column_index && a.overlaps(b)),
                        "{:?} and {:?} share a column",
                        a,
                        b
                    );
                }
            }
        }

        #[test]
        fn block_widths_sum_to_at_most_full(raw in spans()) {
            let mut spans = raw;
            spans.sort_by_key(|&(start, _)| start);
            for block in collision_blocks(&spans) {
                let slots = pack_columns(&spans[block]);
                let columns = slots.iter().map(|s| s.column).max().map_or(0, |c| c + 1);
                prop_assert_eq!(columns, slots[0].total_columns);
                let total = columns as f64 * (100.0 / slots[0].total_columns as f64);
                prop_assert!(total <= 100.0 + 1e-9);
            }
        }
    }
}
