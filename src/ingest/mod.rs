// src/ingest/mod.rs
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod matcher;
pub mod sources;
pub mod status;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::config::filters::FilterConfig;
use crate::ingest::dedup::{classify, SeenSet};
use crate::ingest::extract::normalize;
use crate::ingest::fetch::Fetcher;
use crate::ingest::matcher::{display_case, Matcher};
use crate::ingest::sources::{group_order, SourceRegistry};
use crate::ingest::types::{MatchedJob, RawPosting, RunResult, Source};

/// One-time metrics registration (so series show up on an exporter).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "jobwatch_postings_fetched_total",
            "Raw postings returned by sources."
        );
        describe_counter!(
            "jobwatch_postings_dropped_total",
            "Postings dropped for a missing title or identifier."
        );
        describe_counter!(
            "jobwatch_matches_total",
            "Postings passing keyword and location filters."
        );
        describe_counter!("jobwatch_new_jobs_total", "Matches not seen in earlier runs.");
        describe_counter!(
            "jobwatch_source_errors_total",
            "Sources that yielded nothing because every attempt failed."
        );
        describe_histogram!("jobwatch_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!("jobwatch_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Normalize and filter one source's raw postings.
/// Returns the matches and how many records were unusable.
pub fn match_postings(
    source: &Source,
    raw: &[RawPosting],
    matcher: &Matcher,
) -> (Vec<MatchedJob>, usize) {
    let mut dropped = 0usize;
    let mut out = Vec::new();
    for r in raw {
        let Some(p) = normalize(r) else {
            dropped += 1;
            continue;
        };
        if !matcher.matches(&p.title, &p.location) {
            continue;
        }
        out.push(MatchedJob {
            source_name: source.name.clone(),
            url: source.posting_url(&p.identifier),
            title: p.title,
            location: display_case(&p.location),
            posted_date: p.posted_date,
            identifier: p.identifier,
        });
    }
    (out, dropped)
}

/// Stable sort by source group: pinned first, then by name. Posting order
/// inside a source is kept.
pub fn group_by_source(jobs: &mut [MatchedJob], pinned: &str) {
    jobs.sort_by(|a, b| group_order(pinned, &a.source_name, &b.source_name));
}

/// Run one full pass: fetch every source in registry order, match, then classify
/// the whole batch against `seen` in a single step.
pub async fn run_once(
    fetcher: &Fetcher,
    registry: &SourceRegistry,
    filters: &FilterConfig,
    seen: &SeenSet,
) -> (RunResult, SeenSet) {
    ensure_metrics_described();
    let matcher = Matcher::new(filters);

    let mut matches = Vec::new();
    for (i, source) in registry.sources().iter().enumerate() {
        if i > 0 {
            fetcher.pause().await;
        }
        let raw = fetcher.fetch(source).await;
        let (mut found, dropped) = match_postings(source, &raw, &matcher);
        debug!(
            source = %source.name,
            raw = raw.len(),
            matched = found.len(),
            dropped,
            "source matched"
        );
        counter!("jobwatch_postings_fetched_total").increment(raw.len() as u64);
        counter!("jobwatch_postings_dropped_total").increment(dropped as u64);
        counter!("jobwatch_matches_total").increment(found.len() as u64);
        matches.append(&mut found);
    }

    let classified = classify(matches, seen);
    let mut result = RunResult {
        new_jobs: classified.new,
        current_jobs: classified.current,
    };
    group_by_source(&mut result.new_jobs, registry.pinned());
    group_by_source(&mut result.current_jobs, registry.pinned());

    counter!("jobwatch_new_jobs_total").increment(result.new_jobs.len() as u64);
    gauge!("jobwatch_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    info!(
        target: "ingest",
        new = result.new_jobs.len(),
        current = result.current_jobs.len(),
        seen = classified.seen.len(),
        "pipeline run complete"
    );

    (result, classified.seen)
}
