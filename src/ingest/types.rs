// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// One job board: a query endpoint plus the base URL used to build posting links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub query_endpoint: String,
    pub base_url: String,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        query_endpoint: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            query_endpoint: query_endpoint.into(),
            base_url: base_url.into(),
        }
    }

    /// Build a public link for a posting identifier.
    /// Absolute identifiers are returned untouched.
    pub fn posting_url(&self, identifier: &str) -> String {
        if identifier.starts_with("http://") || identifier.starts_with("https://") {
            return identifier.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = identifier.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// A posting exactly as a board returned it. Only the field extractor looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPosting(pub serde_json::Value);

impl From<serde_json::Value> for RawPosting {
    fn from(v: serde_json::Value) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub title: String,
    pub location: String,
    pub identifier: String,
    pub posted_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedJob {
    pub source_name: String,
    pub title: String,
    pub location: String, // display-cased
    pub url: String,
    pub posted_date: String,
    pub identifier: String,
}

/// Output of one pipeline pass, both lists grouped by source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub new_jobs: Vec<MatchedJob>,
    pub current_jobs: Vec<MatchedJob>,
}

impl RunResult {
    pub fn is_empty(&self) -> bool {
        self.new_jobs.is_empty() && self.current_jobs.is_empty()
    }

    /// New jobs as `(source, jobs)` runs, in the already-grouped order.
    pub fn new_by_source(&self) -> Vec<(&str, Vec<&MatchedJob>)> {
        runs_by_source(&self.new_jobs)
    }

    pub fn current_by_source(&self) -> Vec<(&str, Vec<&MatchedJob>)> {
        runs_by_source(&self.current_jobs)
    }
}

fn runs_by_source(jobs: &[MatchedJob]) -> Vec<(&str, Vec<&MatchedJob>)> {
    let mut out: Vec<(&str, Vec<&MatchedJob>)> = Vec::new();
    for job in jobs {
        match out.last_mut() {
            Some((name, bucket)) if *name == job.source_name => bucket.push(job),
            _ => out.push((job.source_name.as_str(), vec![job])),
        }
    }
    out
}
