// src/config/mod.rs
//! Runtime configuration, read once at startup and passed down immutably.

pub mod filters;

use anyhow::{Context, Result};
use chrono::Weekday;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::ingest::dedup::DEFAULT_SEEN_PATH;
use crate::ingest::fetch::FetchPolicy;
use crate::ingest::sources::{load_sources_default, SourceRegistry};
use crate::notify::DigestWindow;
use filters::{load_filters_default, FilterConfig};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub filters: FilterConfig,
    pub sources: SourceRegistry,
    pub seen_path: PathBuf,
    pub fetch: FetchPolicy,
    /// `Some` when digest mode is on.
    pub digest: Option<DigestWindow>,
    pub debug: bool,
}

/// "1", "true", "yes", "on" (any case) are true; anything else is false.
pub fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load filters, sources and tunables from the environment.
    /// Fails when no usable source or keyword is configured.
    pub fn from_env() -> Result<Self> {
        let filters = load_filters_default().context("loading filters")?;
        let sources = load_sources_default().context("loading job sources")?;

        let seen_path = std::env::var("SEEN_JOBS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SEEN_PATH));

        let base = FetchPolicy::default();
        let fetch = FetchPolicy {
            timeout: Duration::from_secs(env_or("FETCH_TIMEOUT_SECS", 20u64).max(1)),
            delay_min: Duration::from_millis(env_or("FETCH_DELAY_MIN_MS", 1_000u64)),
            delay_max: Duration::from_millis(env_or("FETCH_DELAY_MAX_MS", 3_000u64)),
            page_limit: env_or("FETCH_PAGE_LIMIT", base.page_limit).max(1),
            max_pages: env_or("FETCH_MAX_PAGES", base.max_pages).max(1),
            search_text: std::env::var("FETCH_SEARCH_TEXT").unwrap_or_default(),
        };

        let digest = env_flag("DIGEST_MODE").then(|| {
            let d = DigestWindow::default();
            DigestWindow::new(
                env_or::<Weekday>("DIGEST_WEEKDAY", d.weekday),
                env_or("DIGEST_HOUR_UTC", d.start_hour),
                env_or("DIGEST_WINDOW_HOURS", d.hours),
            )
        });

        Ok(Self {
            filters,
            sources,
            seen_path,
            fetch,
            digest,
            debug: env_flag("DEBUG"),
        })
    }
}
