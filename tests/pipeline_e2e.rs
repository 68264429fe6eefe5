// tests/pipeline_e2e.rs
mod common;

use std::sync::Arc;

use common::{fetcher, ok_json, status, ScriptedTransport};
use job_board_watcher::ingest::status::SourceOutcome;
use job_board_watcher::{run_once, FetchFailure, FilterConfig, SeenSet, Source, SourceRegistry};
use serde_json::json;

fn filters() -> FilterConfig {
    FilterConfig {
        keywords: vec!["data".into(), "analyst".into(), "intern".into()],
        locations: vec!["mumbai".into()],
    }
}

fn src(name: &str, slug: &str) -> Source {
    Source::new(
        name,
        format!("https://{slug}.test/wday/cxs/{slug}/jobs"),
        format!("https://{slug}.test/careers"),
    )
}

#[tokio::test]
async fn scenario_new_and_current_across_two_sources() {
    let transport = Arc::new(ScriptedTransport::new(|endpoint, _| {
        if endpoint.contains("one") {
            ok_json(json!({"total": 1, "jobPostings": [{
                "title": "Data Analyst Intern",
                "locationsText": "Mumbai, Maharashtra",
                "externalPath": "/job/123",
                "postedOn": "Posted Today"
            }]}))
        } else {
            ok_json(json!({"jobPostings": [{
                "title": "Senior Data Analyst",
                "locationsText": "Mumbai",
                "externalPath": "/job/old-9",
                "postedOn": "Posted 30+ Days Ago"
            }]}))
        }
    }));
    let (f, tracker) = fetcher(transport);
    let registry = SourceRegistry::new(vec![src("One", "one"), src("Two", "two")], "One").unwrap();
    let seen: SeenSet = ["/job/old-9"].into_iter().collect();

    let (result, updated) = run_once(&f, &registry, &filters(), &seen).await;

    assert_eq!(result.new_jobs.len(), 1);
    let n = &result.new_jobs[0];
    assert_eq!(n.source_name, "One");
    assert_eq!(n.title, "Data Analyst Intern");
    assert_eq!(n.location, "Mumbai, Maharashtra");
    assert_eq!(n.url, "https://one.test/careers/job/123");

    assert_eq!(result.current_jobs.len(), 1);
    assert_eq!(result.current_jobs[0].identifier, "/job/old-9");

    assert!(updated.contains("/job/123"));
    assert!(updated.is_superset(&seen));
    assert_eq!(tracker.snapshot().len(), 2);
}

#[tokio::test]
async fn scenario_missing_title_is_excluded() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        ok_json(json!({"jobPostings": [
            {"locationsText": "Mumbai", "externalPath": "/job/no-title", "postedOn": "Posted Today"},
            {"title": "Data Intern", "locationsText": "Mumbai", "externalPath": "/job/ok"}
        ]}))
    }));
    let (f, _) = fetcher(transport);
    let registry = SourceRegistry::new(vec![src("Solo", "solo")], "Solo").unwrap();

    let (result, updated) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;

    let all: Vec<_> = result
        .new_jobs
        .iter()
        .chain(result.current_jobs.iter())
        .map(|j| j.identifier.as_str())
        .collect();
    assert_eq!(all, vec!["/job/ok"]);
    assert!(!updated.contains("/job/no-title"));
}

#[tokio::test]
async fn pinned_source_is_grouped_first() {
    let transport = Arc::new(ScriptedTransport::new(|endpoint, _| {
        let id = if endpoint.contains("zed") { "/z" } else { "/s" };
        ok_json(json!({"jobPostings": [{"title": "Data Analyst", "externalPath": id}]}))
    }));
    let (f, _) = fetcher(transport);
    // Zed is fetched first, the pinned source second.
    let registry = SourceRegistry::new(
        vec![src("Zed Corp", "zed"), src("S&P Global", "spgi")],
        "S&P Global",
    )
    .unwrap();

    let (result, _) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;
    let order: Vec<_> = result.new_jobs.iter().map(|j| j.source_name.as_str()).collect();
    assert_eq!(order, vec!["S&P Global", "Zed Corp"]);
}

#[tokio::test]
async fn failing_source_is_skipped_and_recorded() {
    let transport = Arc::new(ScriptedTransport::new(|endpoint, _| {
        if endpoint.contains("down") {
            Err(FetchFailure::Timeout)
        } else {
            ok_json(json!({"jobs": [{"title": "Data Analyst", "id": 77, "location": "Pune, India"}]}))
        }
    }));
    let (f, tracker) = fetcher(transport.clone());
    let registry =
        SourceRegistry::new(vec![src("Down", "down"), src("Up", "up")], "Up").unwrap();

    let (result, _) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;

    // Pune + India broadening lets the posting through even though only Mumbai is listed.
    assert_eq!(result.new_jobs.len(), 1);
    assert_eq!(result.new_jobs[0].identifier, "77");
    // Every variant is tried against the dead board; the healthy source needs one call.
    assert_eq!(transport.call_count(), 4);

    let snap = tracker.snapshot();
    assert_eq!(snap[0].outcome, SourceOutcome::Failed(FetchFailure::Timeout));
    assert!(snap[1].is_ok());
}

#[tokio::test]
async fn transient_timeout_falls_through_to_next_variant() {
    let transport = Arc::new(ScriptedTransport::new(|_, body| {
        if body.get("appliedFacets").is_some() {
            Err(FetchFailure::Timeout)
        } else {
            ok_json(json!({"jobPostings": [{
                "title": "Data Analyst", "externalPath": "/job/slow-1", "locationsText": "Mumbai"
            }]}))
        }
    }));
    let (f, tracker) = fetcher(transport.clone());
    let registry = SourceRegistry::new(vec![src("Flaky", "flaky")], "Flaky").unwrap();

    let (result, _) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;

    assert_eq!(result.new_jobs.len(), 1);
    assert_eq!(result.new_jobs[0].identifier, "/job/slow-1");
    assert_eq!(transport.call_count(), 2);
    match &tracker.snapshot()[0].outcome {
        SourceOutcome::Ok { variant, .. } => assert_eq!(*variant, 1),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn body_variants_fall_back_until_accepted() {
    let transport = Arc::new(ScriptedTransport::new(|_, body| {
        if body.get("appliedFacets").is_some() {
            status(400)
        } else if body.get("searchText").is_some() {
            ok_json(json!({"error": "unexpected field"}))
        } else {
            ok_json(json!({"postings": [{"title": "Data Analyst", "externalPath": "/v3"}]}))
        }
    }));
    let (f, tracker) = fetcher(transport.clone());
    let registry = SourceRegistry::new(vec![src("Picky", "picky")], "Picky").unwrap();

    let (result, _) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;

    assert_eq!(result.new_jobs.len(), 1);
    assert_eq!(transport.call_count(), 3);
    match &tracker.snapshot()[0].outcome {
        SourceOutcome::Ok { variant, .. } => assert_eq!(*variant, 2),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn all_variants_rejected_records_last_reason() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        Ok(job_board_watcher::ingest::fetch::TransportResponse {
            status: 200,
            body: "<html>blocked</html>".into(),
        })
    }));
    let (f, tracker) = fetcher(transport.clone());
    let registry = SourceRegistry::new(vec![src("Html", "html")], "Html").unwrap();

    let (result, _) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;

    assert!(result.is_empty());
    assert_eq!(transport.call_count(), 3);
    assert!(matches!(
        tracker.snapshot()[0].outcome,
        SourceOutcome::Failed(FetchFailure::Malformed(_))
    ));
}

#[tokio::test]
async fn second_run_announces_nothing_new() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| {
        ok_json(json!({"jobPostings": [
            {"title": "Data Analyst", "externalPath": "/a"},
            {"title": "Analyst Intern", "externalPath": "/b", "locationsText": ""}
        ]}))
    }));
    let (f, _) = fetcher(transport);
    let registry = SourceRegistry::new(vec![src("Board", "board")], "Board").unwrap();

    let (first, seen1) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;
    assert_eq!(first.new_jobs.len(), 2);

    let (second, seen2) = run_once(&f, &registry, &filters(), &seen1).await;
    assert!(second.new_jobs.is_empty());
    assert_eq!(second.current_jobs.len(), 2);
    assert_eq!(seen1, seen2);
}

#[tokio::test]
async fn pagination_follows_accepted_variant() {
    let transport = Arc::new(ScriptedTransport::new(|_, body| {
        let offset = body["offset"].as_u64().unwrap_or(0);
        let limit = body["limit"].as_u64().unwrap_or(0);
        // 45 postings total, served `limit` at a time.
        let items: Vec<_> = (offset..(offset + limit).min(45))
            .map(|i| json!({"title": format!("Data Role {i}"), "externalPath": format!("/job/{i}")}))
            .collect();
        let total = if offset == 0 { 45 } else { 0 };
        ok_json(json!({"total": total, "jobPostings": items}))
    }));
    let (f, tracker) = fetcher(transport.clone());
    let registry = SourceRegistry::new(vec![src("Big", "big")], "Big").unwrap();

    let (result, _) = run_once(&f, &registry, &filters(), &SeenSet::new()).await;

    // Default policy: 20 per page, at most 3 pages.
    assert_eq!(result.new_jobs.len(), 45);
    assert_eq!(transport.call_count(), 3);
    match &tracker.snapshot()[0].outcome {
        SourceOutcome::Ok { pages, postings, .. } => {
            assert_eq!(*pages, 3);
            assert_eq!(*postings, 45);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}
