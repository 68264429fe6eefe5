//! Job board watcher: binary entrypoint.
//! Runs one pipeline pass: fetch every board, classify matches against the seen
//! set, persist it, then deliver the run report. Scheduling is left to cron/CI.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_board_watcher::config::{env_flag, AppConfig};
use job_board_watcher::{
    run_once, Fetcher, HttpTransport, NotifierMux, RunReport, SeenStore, StatusTracker,
};

/// RUST_LOG wins; otherwise `info`, or `debug` when DEBUG is set.
fn init_tracing(debug: bool) {
    let fallback = if debug { "job_board_watcher=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing(env_flag("DEBUG"));

    // Configuration problems are the only fatal errors, and surface before any I/O.
    let cfg = AppConfig::from_env()?;
    info!(
        sources = cfg.sources.sources().len(),
        keywords = cfg.filters.keywords.len(),
        locations = cfg.filters.locations.len(),
        digest = cfg.digest.is_some(),
        "configuration loaded"
    );

    if let Some(window) = cfg.digest {
        if !window.contains(Utc::now()) {
            info!(?window, "digest mode: outside delivery window, skipping run");
            return Ok(());
        }
    }

    let mux = NotifierMux::from_env();
    info!(channels = ?mux.channel_names(), "notification channels ready");

    let store = SeenStore::new(&cfg.seen_path);
    let _lock = store.lock().context("locking seen-jobs store")?;
    let seen = store.load();

    let tracker = Arc::new(StatusTracker::new());
    let transport = HttpTransport::new().context("building HTTP client")?;
    let fetcher = Fetcher::new(Arc::new(transport), cfg.fetch.clone()).with_status(tracker.clone());

    let (result, updated) = run_once(&fetcher, &cfg.sources, &cfg.filters, &seen).await;

    if let Err(e) = store.save(&updated) {
        error!(error = ?e, "failed to persist seen jobs; next run may repeat notifications");
    }

    let report = RunReport::new(result, tracker.snapshot(), cfg.debug);
    if mux.is_empty() {
        warn!("no notification channel configured; printing report");
        println!("{}\n\n{}", report.subject(), report.body());
    } else {
        let failed = mux.notify(&report).await;
        if !failed.is_empty() {
            warn!(?failed, "some notification channels failed");
        }
    }

    Ok(())
}
