// src/ingest/matcher.rs
//! Keyword and location predicates. Pure functions over normalized postings.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::filters::FilterConfig;

/// Metro tokens used by the India broadening rule.
///
/// Boards spell the same place many ways ("IN-KA-Bangalore", "India - Bengaluru",
/// "Bengaluru, Karnataka, India"). A location that mentions India together with
/// one of these cities is accepted even when no configured location keyword hits.
/// This is a heuristic: it can admit postings outside the configured cities.
pub const INDIA_METRO_TOKENS: &[&str] = &[
    "bangalore",
    "bengaluru",
    "mumbai",
    "pune",
    "hyderabad",
    "chennai",
    "gurgaon",
    "gurugram",
    "noida",
    "delhi",
    "kolkata",
    "ahmedabad",
];

/// Lower-case and collapse whitespace runs to a single space.
pub fn normalize_location(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s.trim(), " ").to_lowercase()
}

/// Title-case for display: first letter of every alphabetic run upper, rest lower.
pub fn display_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct Matcher {
    keywords: Vec<String>,
    locations: Vec<String>,
}

impl Matcher {
    pub fn new(filters: &FilterConfig) -> Self {
        Self {
            keywords: filters.keywords.iter().map(|k| k.to_lowercase()).collect(),
            locations: filters
                .locations
                .iter()
                .map(|l| normalize_location(l))
                .collect(),
        }
    }

    /// True iff some keyword is a contiguous substring of the lower-cased title.
    pub fn matches_keywords(&self, title: &str) -> bool {
        let t = title.to_lowercase();
        self.keywords.iter().any(|k| t.contains(k.as_str()))
    }

    /// Location keyword hit, or India plus a metro token. An empty location passes:
    /// a board that omits the field has not told us the posting is elsewhere.
    pub fn matches_location(&self, location: &str) -> bool {
        let loc = normalize_location(location);
        if loc.is_empty() {
            return true;
        }
        if self.locations.iter().any(|k| loc.contains(k.as_str())) {
            return true;
        }
        loc.contains("india") && INDIA_METRO_TOKENS.iter().any(|c| loc.contains(c))
    }

    pub fn matches(&self, title: &str, location: &str) -> bool {
        self.matches_keywords(title) && self.matches_location(location)
    }
}
