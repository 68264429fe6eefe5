// src/notify/mod.rs
//! Delivery of a finished run: one message per run, plus spreadsheet rows for
//! new jobs. Channels are independent; one failing does not stop the others and
//! never rolls back the run.

pub mod digest;
pub mod email;
pub mod sheet;

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::ingest::status::{render_report, SourceStatus};
use crate::ingest::types::{MatchedJob, RunResult};

pub use digest::DigestWindow;
pub use email::EmailNotifier;
pub use sheet::{SheetNotifier, SheetRow};

/// Everything a channel needs to describe one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: RunResult,
    pub statuses: Vec<SourceStatus>,
    pub generated_at: DateTime<Utc>,
    /// Append the per-source status report to the message body.
    pub diagnostics: bool,
}

impl RunReport {
    pub fn new(result: RunResult, statuses: Vec<SourceStatus>, diagnostics: bool) -> Self {
        Self {
            result,
            statuses,
            generated_at: Utc::now(),
            diagnostics,
        }
    }

    pub fn subject(&self) -> String {
        let n = self.result.new_jobs.len();
        let date = self.generated_at.format("%Y-%m-%d");
        match n {
            0 => format!("No new job matches ({date})"),
            1 => format!("1 new job match ({date})"),
            _ => format!("{n} new job matches ({date})"),
        }
    }

    /// Plain-text body: new jobs by source, then a short list of still-open ones.
    pub fn body(&self) -> String {
        let mut out = String::new();
        let new = self.result.new_by_source();
        if new.is_empty() {
            let _ = writeln!(out, "No new matching postings this run.");
        } else {
            let _ = writeln!(out, "New matching postings: {}", self.result.new_jobs.len());
            for (source, jobs) in &new {
                let _ = writeln!(out, "\n== {source} ({}) ==", jobs.len());
                for j in jobs {
                    write_job(&mut out, j);
                }
            }
        }

        let current = self.result.current_by_source();
        if !current.is_empty() {
            let _ = writeln!(
                out,
                "\nStill listed (already notified): {}",
                self.result.current_jobs.len()
            );
            for (source, jobs) in &current {
                let _ = writeln!(out, "  {source}: {}", jobs.len());
            }
        }

        if self.diagnostics && !self.statuses.is_empty() {
            let _ = writeln!(out, "\n-- Source status --");
            out.push_str(&render_report(&self.statuses));
        }
        out
    }

    pub fn sheet_rows(&self) -> Vec<SheetRow> {
        let ts = self.generated_at.to_rfc3339();
        self.result
            .new_jobs
            .iter()
            .map(|j| SheetRow::from_job(j, &ts))
            .collect()
    }
}

fn write_job(out: &mut String, j: &MatchedJob) {
    let loc = if j.location.is_empty() {
        "Location not listed"
    } else {
        j.location.as_str()
    };
    let _ = writeln!(out, "- {} | {} | {}", j.title, loc, j.posted_date);
    let _ = writeln!(out, "  {}", j.url);
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, report: &RunReport) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fans a report out to every configured channel.
#[derive(Default)]
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, n: Box<dyn Notifier>) -> Self {
        self.channels.push(n);
        self
    }

    /// Email and spreadsheet channels whose environment is present.
    /// A channel with invalid settings is left out; the others are still built.
    pub fn from_env() -> Self {
        let mut mux = Self::new();
        match EmailNotifier::from_env() {
            Ok(Some(e)) => mux.channels.push(Box::new(e)),
            Ok(None) => tracing::debug!("email disabled (no SMTP_HOST)"),
            Err(e) => tracing::warn!(error = ?e, "email misconfigured; channel disabled"),
        }
        match SheetNotifier::from_env() {
            Some(s) => mux.channels.push(Box::new(s)),
            None => tracing::debug!("spreadsheet logging disabled (no SHEET_WEBHOOK_URL)"),
        }
        mux
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver to all channels. Returns the names of channels that failed.
    pub async fn notify(&self, report: &RunReport) -> Vec<&'static str> {
        let mut failed = Vec::new();
        for ch in &self.channels {
            match ch.send(report).await {
                Ok(()) => tracing::info!(channel = ch.name(), "notification delivered"),
                Err(e) => {
                    tracing::error!(channel = ch.name(), error = ?e, "notification failed");
                    failed.push(ch.name());
                }
            }
        }
        failed
    }
}
