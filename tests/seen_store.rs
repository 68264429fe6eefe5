// tests/seen_store.rs
mod common;

use std::fs;
use std::sync::Arc;

use common::{fetcher, ok_json, ScriptedTransport};
use job_board_watcher::{run_once, FilterConfig, SeenStore, Source, SourceRegistry};
use serde_json::json;

fn registry() -> SourceRegistry {
    SourceRegistry::new(
        vec![Source::new(
            "Board",
            "https://board.test/jobs",
            "https://board.test/careers",
        )],
        "Board",
    )
    .unwrap()
}

fn filters() -> FilterConfig {
    FilterConfig {
        keywords: vec!["data".into()],
        locations: vec![],
    }
}

#[tokio::test]
async fn persisted_set_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("state").join("seen_jobs.json"));

    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        ok_json(json!({"jobPostings": [{"title": "Data Analyst", "externalPath": "/job/1"}]}))
    }));
    let (f, _) = fetcher(transport);

    // Run 1: cold start.
    let seen = store.load();
    let (r1, updated) = run_once(&f, &registry(), &filters(), &seen).await;
    assert_eq!(r1.new_jobs.len(), 1);
    store.save(&updated).unwrap();

    // Run 2: same listing, nothing new.
    let seen = store.load();
    assert!(seen.contains("/job/1"));
    let (r2, updated2) = run_once(&f, &registry(), &filters(), &seen).await;
    assert!(r2.new_jobs.is_empty());
    assert_eq!(r2.current_jobs.len(), 1);
    assert!(updated2.is_superset(&seen));
}

#[tokio::test]
async fn disappeared_posting_stays_seen() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen_jobs.json"));
    store
        .save(&["/job/gone"].into_iter().collect())
        .unwrap();

    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        ok_json(json!({"jobPostings": [{"title": "Data Engineer", "externalPath": "/job/new"}]}))
    }));
    let (f, _) = fetcher(transport);

    let (_, updated) = run_once(&f, &registry(), &filters(), &store.load()).await;
    store.save(&updated).unwrap();

    let reloaded = store.load();
    assert!(reloaded.contains("/job/gone"));
    assert!(reloaded.contains("/job/new"));
}

#[tokio::test]
async fn corrupt_state_means_cold_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen_jobs.json");
    fs::write(&path, r#"{"oops": true}"#).unwrap();
    let store = SeenStore::new(&path);

    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        ok_json(json!({"jobPostings": [{"title": "Data Analyst", "externalPath": "/job/1"}]}))
    }));
    let (f, _) = fetcher(transport);

    let (r, _) = run_once(&f, &registry(), &filters(), &store.load()).await;
    assert_eq!(r.new_jobs.len(), 1);
}

#[test]
fn overlapping_runs_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen_jobs.json"));
    let _first = store.lock().unwrap();
    let second = SeenStore::new(dir.path().join("seen_jobs.json")).lock();
    assert!(second.is_err());
}
