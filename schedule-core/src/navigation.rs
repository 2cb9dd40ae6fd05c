//! View mode and date offset, clamped to the span of the loaded data.
//!
//! Every transition consumes the current [`Navigator`] and returns the next
//! one; nothing here touches storage or the clock. `today` is passed in.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::date::{add_days, days_between, is_sunday, monday_of, DayWindow};
use crate::structs::Event;

/// Days shown side by side in the daily view.
pub const DAILY_SPAN: u32 = 2;
/// Monday through Saturday.
pub const WEEKLY_SPAN: u32 = 6;
const DAY_STEP: i64 = 2;
const WEEK_STEP: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Daily,
    Weekly,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Daily => "daily",
            View::Weekly => "weekly",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(View::Daily),
            "weekly" => Ok(View::Weekly),
            other => Err(format!("unknown view `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Navigator {
    view: View,
    offset: i64,
    max_offset: i64,
}

/// What the presentation layer needs to draw the navigation controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub view: View,
    pub offset: i64,
    pub max_offset: i64,
    pub can_go_prev: bool,
    pub can_go_next: bool,
}

impl Navigator {
    pub fn new(view: View, max_offset: i64) -> Self {
        Self {
            view,
            offset: 0,
            max_offset: max_offset.max(0),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn max_offset(&self) -> i64 {
        self.max_offset
    }

    pub fn can_go_prev(&self) -> bool {
        self.offset > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.offset < self.max_offset
    }

    pub fn state(&self) -> NavigationState {
        NavigationState {
            view: self.view,
            offset: self.offset,
            max_offset: self.max_offset,
            can_go_prev: self.can_go_prev(),
            can_go_next: self.can_go_next(),
        }
    }

    /// New data bound, with the offset pulled back inside it.
    #[must_use]
    pub fn with_max_offset(self, max_offset: i64) -> Self {
        let max_offset = max_offset.max(0);
        Self {
            max_offset,
            ..self
        }
        .at(self.offset)
    }

    #[must_use]
    fn at(self, offset: i64) -> Self {
        Self {
            offset: offset.clamp(0, self.max_offset),
            ..self
        }
    }

    #[must_use]
    pub fn next_day(self) -> Self {
        self.at(self.offset.saturating_add(DAY_STEP))
    }

    #[must_use]
    pub fn prev_day(self) -> Self {
        self.at(self.offset.saturating_sub(DAY_STEP))
    }

    #[must_use]
    pub fn next_week(self) -> Self {
        self.at(self.offset.saturating_add(WEEK_STEP))
    }

    #[must_use]
    pub fn prev_week(self) -> Self {
        self.at(self.offset.saturating_sub(WEEK_STEP))
    }

    /// One step forward in the unit of the current view.
    #[must_use]
    pub fn next(self) -> Self {
        match self.view {
            View::Daily => self.next_day(),
            View::Weekly => self.next_week(),
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self.view {
            View::Daily => self.prev_day(),
            View::Weekly => self.prev_week(),
        }
    }

    #[must_use]
    pub fn go_to_today(self) -> Self {
        self.at(0)
    }

    pub fn anchor(&self, today: NaiveDate) -> NaiveDate {
        add_days(today, self.offset)
    }

    /// Days currently on screen.
    pub fn window(&self, today: NaiveDate) -> DayWindow {
        let anchor = self.anchor(today);
        match self.view {
            View::Daily => DayWindow::new(anchor, DAILY_SPAN),
            // Standing on a Sunday "now" shows the coming week, not the one
            // that just ended.
            View::Weekly if self.offset == 0 && is_sunday(anchor) => {
                DayWindow::new(add_days(anchor, 1), WEEKLY_SPAN)
            }
            View::Weekly => DayWindow::new(monday_of(anchor), WEEKLY_SPAN),
        }
    }

    /// Changes the view while keeping roughly the same dates on screen.
    ///
    /// Daily to weekly lands on the Monday of the anchor's week. Weekly to
    /// daily lands on the first day of the displayed week that has an event
    /// in one of the `selected` groups, or on its first day when there is
    /// none.
    #[must_use]
    pub fn switch_view(
        self,
        view: View,
        today: NaiveDate,
        events: &[Event],
        selected: &[String],
    ) -> Self {
        if view == self.view {
            return self;
        }

        let target = match view {
            View::Weekly => monday_of(self.anchor(today)),
            View::Daily => {
                let week = self.window(today);
                events
                    .iter()
                    .filter(|event| event.in_group(selected))
                    .filter_map(|event| event.date)
                    .filter(|date| week.contains(*date))
                    .min()
                    .unwrap_or(week.first)
            }
        };

        let next = Self { view, ..self }.at(days_between(today, target));
        debug!(
            "switched view {} -> {}, offset {} -> {}",
            self.view, next.view, self.offset, next.offset
        );
        next
    }
}
