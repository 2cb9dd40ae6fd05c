//! Staleness of the scraped dataset.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// How long ago the dataset was scraped, bucketed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "camelCase")]
pub enum UpdateAge {
    JustNow,
    Minutes(i64),
    Hours(i64),
}

impl UpdateAge {
    pub fn between(scraped_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let millis = (now - scraped_at).num_milliseconds() as f64;
        let minutes = (millis / MILLIS_PER_MINUTE).round() as i64;
        match minutes {
            ..=0 => UpdateAge::JustNow,
            1..=59 => UpdateAge::Minutes(minutes),
            _ => UpdateAge::Hours(minutes / 60),
        }
    }

    pub fn label(&self) -> String {
        format!("Last update: {self}")
    }
}

impl fmt::Display for UpdateAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (count, unit) = match *self {
            UpdateAge::JustNow => return f.write_str("just now"),
            UpdateAge::Minutes(n) => (n, "minute"),
            UpdateAge::Hours(n) => (n, "hour"),
        };
        let plural = if count > 1 { "s" } else { "" };
        write!(f, "{count} {unit}{plural} ago")
    }
}

/// Result of one freshness evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Freshness {
    pub stale: bool,
    /// Set only on the check that moved the dataset from fresh to stale.
    pub alert: bool,
    pub age: UpdateAge,
    pub label: String,
}

/// Remembers whether the stale alert already fired so it fires once per
/// fresh -> stale transition.
#[derive(Debug, Clone)]
pub struct FreshnessMonitor {
    threshold_hours: f64,
    stale: bool,
}

impl FreshnessMonitor {
    pub fn new(threshold_hours: f64) -> Self {
        Self {
            threshold_hours,
            stale: false,
        }
    }

    pub fn threshold_hours(&self) -> f64 {
        self.threshold_hours
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn check(&mut self, scraped_at: DateTime<Utc>, now: DateTime<Utc>) -> Freshness {
        let elapsed_hours = (now - scraped_at).num_milliseconds() as f64 / MILLIS_PER_HOUR;
        let stale = elapsed_hours > self.threshold_hours;
        let alert = stale && !self.stale;

        if alert {
            warn!(
                "dataset is stale: scraped {elapsed_hours:.1}h ago (threshold {}h)",
                self.threshold_hours
            );
        } else if self.stale && !stale {
            info!("dataset is fresh again");
        }
        self.stale = stale;

        let age = UpdateAge::between(scraped_at, now);
        Freshness {
            stale,
            alert,
            age,
            label: age.label(),
        }
    }
}
