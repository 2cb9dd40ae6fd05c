//! Error types for loading a schedule dataset.

use std::fmt;

use thiserror::Error;

/// The payload did not have the shape the decoder needs. Fatal for the
/// whole load.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload has no `schema` key list")]
    MissingSchema,

    #[error("payload has no `events` list")]
    MissingEvents,

    #[error("payload has no `meta` object")]
    MissingMeta,

    #[error("payload metadata has no group table (`meta.c`)")]
    MissingGroupTable,

    #[error("schema does not declare the required key `{0}`")]
    MissingKey(&'static str),

    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A reload attempt that left the dataset unavailable.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch dataset: {0}")]
    Fetch(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// One event carried a date or time field that could not be read. The event
/// stays in the decoded collection but never reaches the layout engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParseWarning {
    pub index: usize,
    pub field: &'static str,
    pub raw: String,
}

impl fmt::Display for EventParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event #{} has an unreadable `{}` field: {}",
            self.index, self.field, self.raw
        )
    }
}
