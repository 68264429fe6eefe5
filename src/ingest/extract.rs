//! # Field Extractor
//! Resolves title, location, identifier and posted date from a raw posting whose
//! shape depends on the board (and on the board's API version).
//!
//! Every field has an ordered table of candidate paths. Paths are tried left to
//! right and the first one landing on a non-null scalar wins. A missing key or a
//! wrong intermediate type simply means "this path does not resolve"; nothing in
//! here can fail. Supporting a new naming convention is a table edit.

use serde_json::Value;

use crate::ingest::types::{NormalizedPosting, RawPosting};

/// Value used when no posted-date path resolves.
pub const POSTED_DATE_UNAVAILABLE: &str = "N/A";

/// One step of a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seg {
    Key(&'static str),
    Index(usize),
}

pub type FieldPath = &'static [Seg];

use Seg::{Index, Key};

pub const TITLE_PATHS: &[FieldPath] = &[
    &[Key("title")],
    &[Key("jobTitle")],
    &[Key("name")],
    &[Key("jobPostingInfo"), Key("title")],
    &[Key("posting"), Key("title")],
];

pub const LOCATION_PATHS: &[FieldPath] = &[
    &[Key("locationsText")],
    &[Key("location")],
    &[Key("location"), Key("name")],
    &[Key("locations"), Index(0)],
    &[Key("primaryLocation")],
    &[Key("jobPostingInfo"), Key("location")],
];

pub const IDENTIFIER_PATHS: &[FieldPath] = &[
    &[Key("externalPath")],
    &[Key("jobPostingInfo"), Key("externalPath")],
    &[Key("id")],
    &[Key("jobId")],
    &[Key("jobReqId")],
    &[Key("jobPostingInfo"), Key("jobReqId")],
    &[Key("bulletFields"), Index(0)],
];

pub const POSTED_DATE_PATHS: &[FieldPath] = &[
    &[Key("postedOn")],
    &[Key("postedOn"), Key("value")],
    &[Key("postedDate")],
    &[Key("datePosted")],
    &[Key("jobPostingInfo"), Key("startDate")],
];

/// Walk one path. `None` on any miss.
fn walk<'a>(root: &'a Value, path: &[Seg]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, seg| match seg {
        Key(k) => node.as_object()?.get(*k),
        Index(i) => node.as_array()?.get(*i),
    })
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// First candidate path that resolves to a scalar, rendered as trimmed text.
pub fn resolve(root: &Value, candidates: &[FieldPath]) -> Option<String> {
    candidates
        .iter()
        .find_map(|p| walk(root, *p).and_then(scalar_text))
}

/// Extract all four fields, falling back to defaults. Never fails.
pub fn extract(raw: &RawPosting) -> NormalizedPosting {
    let v = &raw.0;
    NormalizedPosting {
        title: resolve(v, TITLE_PATHS).unwrap_or_default(),
        location: resolve(v, LOCATION_PATHS).unwrap_or_default(),
        identifier: resolve(v, IDENTIFIER_PATHS).unwrap_or_default(),
        posted_date: resolve(v, POSTED_DATE_PATHS)
            .unwrap_or_else(|| POSTED_DATE_UNAVAILABLE.to_string()),
    }
}

/// Like [`extract`], but drops records without a title or identifier.
pub fn normalize(raw: &RawPosting) -> Option<NormalizedPosting> {
    let p = extract(raw);
    if p.title.is_empty() || p.identifier.is_empty() {
        return None;
    }
    Some(p)
}
