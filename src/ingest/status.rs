//! Per-source outcome log for diagnostics. Nothing in the pipeline reads it back.

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::ingest::fetch::FetchFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Ok {
        postings: usize,
        variant: usize,
        pages: u32,
    },
    Failed(FetchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: String,
    pub outcome: SourceOutcome,
    pub latency_ms: u64,
}

impl SourceStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Ok { .. })
    }

    pub fn postings(&self) -> usize {
        match self.outcome {
            SourceOutcome::Ok { postings, .. } => postings,
            SourceOutcome::Failed(_) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub working: usize,
    pub total: usize,
    pub postings: usize,
}

#[derive(Debug, Default)]
pub struct StatusTracker {
    inner: Mutex<Vec<SourceStatus>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, source: &str, outcome: SourceOutcome, latency: Duration) {
        let entry = SourceStatus {
            source: source.to_string(),
            outcome,
            latency_ms: latency.as_millis() as u64,
        };
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn snapshot(&self) -> Vec<SourceStatus> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub fn summarize(statuses: &[SourceStatus]) -> StatusSummary {
    StatusSummary {
        working: statuses.iter().filter(|s| s.is_ok()).count(),
        total: statuses.len(),
        postings: statuses.iter().map(SourceStatus::postings).sum(),
    }
}

/// Plain-text report: totals line, then one line per source.
pub fn render_report(statuses: &[SourceStatus]) -> String {
    let sum = summarize(statuses);
    let mut out = String::new();
    let _ = writeln!(out, "Working sources: {}/{}", sum.working, sum.total);
    let _ = writeln!(out, "Postings fetched: {}", sum.postings);
    for s in statuses {
        let _ = match &s.outcome {
            SourceOutcome::Ok { postings, .. } => writeln!(
                out,
                "  {}: WORKING ({} jobs, {} ms)",
                s.source, postings, s.latency_ms
            ),
            SourceOutcome::Failed(e) => {
                writeln!(out, "  {}: FAILED ({}, {} ms)", s.source, e, s.latency_ms)
            }
        };
    }
    out
}
