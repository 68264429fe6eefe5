// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::config::{filters::FilterConfig, AppConfig};
pub use crate::ingest::dedup::{classify, Classified, SeenSet, SeenStore};
pub use crate::ingest::extract::{extract, normalize};
pub use crate::ingest::fetch::{FetchFailure, FetchPolicy, Fetcher, HttpTransport, JobBoardTransport};
pub use crate::ingest::matcher::Matcher;
pub use crate::ingest::run_once;
pub use crate::ingest::sources::SourceRegistry;
pub use crate::ingest::status::StatusTracker;
pub use crate::ingest::types::{MatchedJob, NormalizedPosting, RawPosting, RunResult, Source};
pub use crate::notify::{Notifier, NotifierMux, RunReport};
