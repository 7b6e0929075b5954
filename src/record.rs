//! Game catalog record shape and helpers over untyped corpus entries.
//!
//! The corpus is kept as raw JSON values so legacy entries survive a
//! load/write cycle untouched; `Record` is the shape new entries are asked
//! to follow.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub studio: String,
    pub genres: Vec<String>,
    /// `YYYY-MM-DD`, not calendar-checked.
    pub release_date: String,
    pub image: String,
    pub description: String,
    pub site: String,
}

impl Record {
    /// Required fields in the order they are written.
    pub const FIELDS: [&'static str; 7] = [
        "name",
        "studio",
        "genres",
        "release_date",
        "image",
        "description",
        "site",
    ];

    /// At least one genre and a `dddd-dd-dd` release date.
    pub fn is_well_formed(&self) -> bool {
        !self.genres.is_empty() && is_iso_date_shape(&self.release_date)
    }
}

fn is_iso_date_shape(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Name of a corpus entry, if it has a string `name`.
pub fn record_name(value: &Value) -> Option<&str> {
    value.get("name").and_then(Value::as_str)
}

/// Names of all entries that carry one, in corpus order.
pub fn corpus_names(corpus: &[Value]) -> Vec<&str> {
    corpus.iter().filter_map(record_name).collect()
}

/// Names in `batch` that already appear in `existing`.
pub fn colliding_names<'a>(existing: &[Value], batch: &'a [Value]) -> Vec<&'a str> {
    let known: BTreeSet<&str> = corpus_names(existing).into_iter().collect();
    batch
        .iter()
        .filter_map(record_name)
        .filter(|name| known.contains(name))
        .collect()
}

/// Count of entries in `batch` that do not match the `Record` shape.
pub fn nonconforming_count(batch: &[Value]) -> usize {
    batch
        .iter()
        .filter(|value| {
            !Record::deserialize(*value).is_ok_and(|record| record.is_well_formed())
        })
        .count()
}
