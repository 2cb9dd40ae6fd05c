use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DecodeError, EventParseWarning};
use crate::structs::{Dataset, Event, Metadata, DATE_FORMAT, TIME_FORMAT};

/// Keys every schema has to declare.
pub const REQUIRED_KEYS: [&str; 6] = ["d", "st", "et", "g", "t", "l"];
/// Optional end-date key; tuples may stop right before it.
pub const END_DATE_KEY: &str = "ed";

/// The compact document exactly as fetched. Every part is optional here so
/// that a missing part becomes a [`DecodeError`] rather than a serde error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payload {
    pub schema: Option<Vec<String>>,
    pub events: Option<Vec<Vec<Value>>>,
    pub meta: Option<PayloadMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayloadMeta {
    pub c: Option<Vec<String>>,
    pub ts: Option<String>,
}

pub fn decode_str<S: AsRef<str>>(s: S) -> Result<Dataset, DecodeError> {
    decode(serde_json::from_str(s.as_ref())?)
}

pub fn decode(payload: Payload) -> Result<Dataset, DecodeError> {
    let schema = payload.schema.ok_or(DecodeError::MissingSchema)?;
    let tuples = payload.events.ok_or(DecodeError::MissingEvents)?;
    let meta = payload.meta.ok_or(DecodeError::MissingMeta)?;
    let groups = meta.c.ok_or(DecodeError::MissingGroupTable)?;

    let layout = FieldLayout::new(&schema)?;

    let mut warnings = Vec::new();
    let events = tuples
        .iter()
        .enumerate()
        .map(|(index, tuple)| {
            let mut row = Row {
                index,
                tuple,
                warnings: &mut warnings,
            };
            layout.event(&mut row, &groups)
        })
        .collect::<Vec<_>>();

    for warning in &warnings {
        warn!("{warning}");
    }

    let scraped_at = meta.ts.as_deref().and_then(|ts| {
        let parsed = parse_timestamp(ts);
        if parsed.is_none() {
            warn!("ignoring unreadable scrape timestamp {ts:?}");
        }
        parsed
    });

    debug!(
        "decoded {} events across {} groups ({} warnings)",
        events.len(),
        groups.len(),
        warnings.len()
    );

    Ok(Dataset {
        events,
        meta: Metadata { groups, scraped_at },
        warnings,
    })
}

/// Positions of each field inside a tuple, resolved from the key list.
struct FieldLayout {
    date: usize,
    start: usize,
    end: usize,
    group: usize,
    title: usize,
    location: usize,
    end_date: Option<usize>,
}

impl FieldLayout {
    fn new(schema: &[String]) -> Result<Self, DecodeError> {
        let positions = schema
            .iter()
            .enumerate()
            .map(|(index, key)| (key.as_str(), index))
            .collect::<HashMap<_, _>>();

        let position = |key: &'static str| positions.get(key).copied().ok_or(DecodeError::MissingKey(key));

        let [d, st, et, g, t, l] = REQUIRED_KEYS;
        Ok(Self {
            date: position(d)?,
            start: position(st)?,
            end: position(et)?,
            group: position(g)?,
            title: position(t)?,
            location: position(l)?,
            end_date: positions.get(END_DATE_KEY).copied(),
        })
    }

    fn event(&self, row: &mut Row<'_>, groups: &[String]) -> Event {
        let date = row.date(self.date, "d");
        let end_date = match self.end_date {
            Some(index) if index < row.tuple.len() => row.date(index, END_DATE_KEY),
            _ => date,
        };

        Event {
            date,
            end_date,
            start: row.time(self.start, "st"),
            end: row.time(self.end, "et"),
            group: row.group(self.group, groups),
            title: row.text(self.title).unwrap_or_default(),
            location: row.text(self.location),
        }
    }
}

struct Row<'a> {
    index: usize,
    tuple: &'a [Value],
    warnings: &'a mut Vec<EventParseWarning>,
}

impl Row<'_> {
    fn warn(&mut self, field: &'static str, position: usize) {
        let raw = self
            .tuple
            .get(position)
            .map_or_else(|| "<missing>".to_string(), Value::to_string);
        self.warnings.push(EventParseWarning {
            index: self.index,
            field,
            raw,
        });
    }

    fn date(&mut self, position: usize, field: &'static str) -> Option<NaiveDate> {
        let parsed = self.tuple.get(position).and_then(expand_date).and_then(|expanded| {
            NaiveDate::parse_from_str(&expanded, DATE_FORMAT).ok()
        });
        if parsed.is_none() {
            self.warn(field, position);
        }
        parsed
    }

    fn time(&mut self, position: usize, field: &'static str) -> Option<NaiveTime> {
        let parsed = self.tuple.get(position).and_then(expand_time).and_then(|expanded| {
            NaiveTime::parse_from_str(&expanded, TIME_FORMAT).ok()
        });
        if parsed.is_none() {
            self.warn(field, position);
        }
        parsed
    }

    fn group(&mut self, position: usize, groups: &[String]) -> Option<String> {
        let group = self
            .tuple
            .get(position)
            .and_then(as_integer)
            .and_then(|index| groups.get(usize::try_from(index).ok()?))
            .cloned();
        if group.is_none() {
            self.warn("g", position);
        }
        group
    }

    fn text(&self, position: usize) -> Option<String> {
        match self.tuple.get(position)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn as_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
        _ => None,
    }
}

/// Zero-pads `value` to `width` digits, rejecting anything longer.
fn padded(value: &Value, width: usize) -> Option<String> {
    let digits = format!("{:0width$}", as_integer(value)?);
    (digits.len() == width).then_some(digits)
}

/// `151025` -> `15/10/2025`. The century is always 20.
pub fn expand_date(value: &Value) -> Option<String> {
    let digits = padded(value, 6)?;
    Some(format!("{}/{}/20{}", &digits[0..2], &digits[2..4], &digits[4..6]))
}

/// `930` -> `09:30`.
pub fn expand_time(value: &Value) -> Option<String> {
    let digits = padded(value, 4)?;
    Some(format!("{}:{}", &digits[0..2], &digits[2..4]))
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(ts) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
