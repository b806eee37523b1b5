//! Total decoders from raw property containers to semantic values.
//!
//! Every accessor has a documented default for absent or malformed input and
//! never returns an error.

use crate::sync::record::Record;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeSet;

pub const UNTITLED: &str = "Untitled";

/// The two schema representations a status property can use. The store can
/// migrate a property between them without touching the rest of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Status,
    Select,
}

impl StatusKind {
    /// Decoder order for reading a label.
    pub const PRIORITY: [StatusKind; 2] = [StatusKind::Status, StatusKind::Select];

    pub fn key(self) -> &'static str {
        match self {
            StatusKind::Status => "status",
            StatusKind::Select => "select",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|kind| kind.key() == key)
    }

    fn decode(self, container: &Value) -> Option<&str> {
        container
            .get(self.key())
            .and_then(|option| option.get("name"))
            .and_then(Value::as_str)
    }
}

/// First title segment's plain text. `None` when any level is missing.
pub fn title(record: &Record, property: &str) -> Option<String> {
    record
        .property(property)
        .and_then(|container| container.get("title"))
        .and_then(Value::as_array)
        .and_then(|segments| segments.first())
        .and_then(|segment| {
            segment
                .get("plain_text")
                .or_else(|| segment.get("text").and_then(|text| text.get("content")))
        })
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

pub fn display_title(record: &Record, property: &str) -> String {
    title(record, property).unwrap_or_else(|| UNTITLED.to_string())
}

/// Status label from whichever representation carries one; "" otherwise.
pub fn status_label(record: &Record, property: &str) -> String {
    let Some(container) = record.property(property) else {
        return String::new();
    };
    StatusKind::PRIORITY
        .into_iter()
        .find_map(|kind| kind.decode(container))
        .unwrap_or_default()
        .to_string()
}

/// Which representation the record's status property uses, so writes match
/// the deployed schema. Defaults to `Select`.
pub fn status_kind(record: &Record, property: &str) -> StatusKind {
    let Some(container) = record.property(property) else {
        return StatusKind::Select;
    };
    if let Some(kind) = container
        .get("type")
        .and_then(Value::as_str)
        .and_then(StatusKind::from_key)
    {
        return kind;
    }
    StatusKind::PRIORITY
        .into_iter()
        .find(|kind| container.get(kind.key()).is_some())
        .unwrap_or(StatusKind::Select)
}

/// Raw `start` of a date container. A bare `null` date counts as absent.
pub fn date_start(record: &Record, property: &str) -> Option<String> {
    record
        .property(property)
        .and_then(|container| container.get("date"))
        .filter(|date| date.is_object())
        .and_then(|date| date.get("start"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

/// Calendar day of a date container; time-of-day and offset are discarded.
pub fn date(record: &Record, property: &str) -> Option<NaiveDate> {
    date_start(record, property).and_then(|start| parse_day(&start))
}

/// Strict `YYYY-MM-DD` prefix; unpadded months or days are rejected.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    let well_formed = day.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Related ids in store order with duplicates dropped.
pub fn relation_ids(record: &Record, property: &str) -> Vec<String> {
    let Some(refs) = record
        .property(property)
        .and_then(|container| container.get("relation"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    refs.iter()
        .filter_map(|r| r.get("id").and_then(Value::as_str))
        .filter(|id| seen.insert(id.to_string()))
        .map(ToOwned::to_owned)
        .collect()
}

/// True when the store truncated the embedded relation list.
pub fn relation_has_more(record: &Record, property: &str) -> bool {
    record
        .property(property)
        .and_then(|container| container.get("has_more"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn property_id(record: &Record, property: &str) -> Option<String> {
    record
        .property(property)
        .and_then(|container| container.get("id"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

pub fn checkbox(record: &Record, property: &str) -> bool {
    record
        .property(property)
        .and_then(|container| container.get("checkbox"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
