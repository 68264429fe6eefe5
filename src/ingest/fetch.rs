// src/ingest/fetch.rs
//! Per-source retrieval.
//!
//! A board is queried with an ordered list of request-body shapes, most permissive
//! first. Some deployments reject `appliedFacets` or `searchText`, so each rejected
//! shape falls through to a leaner one. A timeout or dropped connection on one
//! attempt also moves on to the next shape. The first 2xx response whose payload
//! carries postings under a known key wins; later pages reuse that shape.
//!
//! `fetch` never fails: an exhausted source yields no postings and the reason is
//! recorded on the status tracker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ingest::status::{SourceOutcome, StatusTracker};
use crate::ingest::types::{RawPosting, Source};

/// Top-level keys that have carried the postings array across API versions.
pub const POSTING_KEYS: &[&str] = &["jobPostings", "jobs", "postings", "results", "data"];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("no postings under any known key")]
    UnrecognizedShape,

    #[error("request error: {0}")]
    Request(String),
}

impl FetchFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection(_) => "connection",
            Self::Status(_) => "status",
            Self::Malformed(_) => "malformed",
            Self::UnrecognizedShape => "shape",
            Self::Request(_) => "request",
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// POST a JSON query to a board. Implemented over reqwest; tests supply their own.
#[async_trait]
pub trait JobBoardTransport: Send + Sync {
    async fn post_json(
        &self,
        endpoint: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, FetchFailure>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JobBoardTransport for HttpTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, FetchFailure> {
        let resp = self
            .client
            .post(endpoint)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// One request-body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyVariant {
    pub applied_facets: bool,
    pub search_text: bool,
}

pub const BODY_VARIANTS: &[BodyVariant] = &[
    BodyVariant {
        applied_facets: true,
        search_text: true,
    },
    BodyVariant {
        applied_facets: false,
        search_text: true,
    },
    BodyVariant {
        applied_facets: false,
        search_text: false,
    },
];

impl BodyVariant {
    pub fn build(&self, limit: u32, offset: u32, search_text: &str) -> Value {
        let mut m = Map::new();
        if self.applied_facets {
            m.insert("appliedFacets".into(), Value::Object(Map::new()));
        }
        m.insert("limit".into(), limit.into());
        m.insert("offset".into(), offset.into());
        if self.search_text {
            m.insert("searchText".into(), search_text.into());
        }
        Value::Object(m)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Randomized courtesy delay bounds, applied before every attempt.
    pub delay_min: Duration,
    pub delay_max: Duration,
    pub page_limit: u32,
    pub max_pages: u32,
    pub search_text: String,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            delay_min: Duration::from_millis(1_000),
            delay_max: Duration::from_millis(3_000),
            page_limit: 20,
            max_pages: 3,
            search_text: String::new(),
        }
    }
}

impl FetchPolicy {
    /// No delays; handy for tests and local fixtures.
    pub fn immediate() -> Self {
        Self {
            delay_min: Duration::ZERO,
            delay_max: Duration::ZERO,
            ..Self::default()
        }
    }

    fn pick_delay(&self) -> Duration {
        let lo = self.delay_min.min(self.delay_max);
        let hi = self.delay_min.max(self.delay_max);
        if hi.is_zero() {
            return Duration::ZERO;
        }
        let (lo_ms, hi_ms) = (lo.as_millis() as u64, hi.as_millis() as u64);
        Duration::from_millis(rand::rng().random_range(lo_ms..=hi_ms))
    }
}

/// Find the postings array in a decoded payload.
pub fn find_postings(payload: &Value) -> Option<&Vec<Value>> {
    if let Some(arr) = payload.as_array() {
        return Some(arr);
    }
    let obj = payload.as_object()?;
    POSTING_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_array))
}

#[derive(Debug)]
struct Page {
    postings: Vec<RawPosting>,
    total: Option<u64>,
}

/// Postings gathered for one source plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub postings: Vec<RawPosting>,
    pub variant: usize,
    pub pages: u32,
}

pub struct Fetcher {
    transport: Arc<dyn JobBoardTransport>,
    policy: FetchPolicy,
    status: Option<Arc<StatusTracker>>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn JobBoardTransport>, policy: FetchPolicy) -> Self {
        Self {
            transport,
            policy,
            status: None,
        }
    }

    pub fn with_status(mut self, status: Arc<StatusTracker>) -> Self {
        self.status = Some(status);
        self
    }

    /// Sleep for a random span within the policy bounds.
    pub async fn pause(&self) {
        let d = self.policy.pick_delay();
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }

    /// Retrieve raw postings; failures degrade to an empty list.
    pub async fn fetch(&self, source: &Source) -> Vec<RawPosting> {
        let t0 = Instant::now();
        let res = self.fetch_detailed(source).await;
        let latency = t0.elapsed();
        histogram!("jobwatch_fetch_ms").record(latency.as_secs_f64() * 1_000.0);

        let (postings, outcome) = match res {
            Ok(f) => {
                info!(
                    source = %source.name,
                    postings = f.postings.len(),
                    variant = f.variant,
                    pages = f.pages,
                    "source fetched"
                );
                let outcome = SourceOutcome::Ok {
                    postings: f.postings.len(),
                    variant: f.variant,
                    pages: f.pages,
                };
                (f.postings, outcome)
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, kind = e.kind(), "source failed");
                counter!("jobwatch_source_errors_total").increment(1);
                (Vec::new(), SourceOutcome::Failed(e))
            }
        };
        if let Some(st) = &self.status {
            st.record(&source.name, outcome, latency);
        }
        postings
    }

    /// Try every body variant in order; paginate with the first one accepted.
    /// The source fails only when every variant fails, with the last reason.
    pub async fn fetch_detailed(&self, source: &Source) -> Result<Fetched, FetchFailure> {
        let limit = self.policy.page_limit.max(1);
        let mut last = FetchFailure::UnrecognizedShape;

        for (i, variant) in BODY_VARIANTS.iter().enumerate() {
            self.pause().await;
            let body = variant.build(limit, 0, &self.policy.search_text);
            match self.query_page(source, &body).await {
                Ok(first) => return Ok(self.paginate(source, i, *variant, first).await),
                Err(e) => {
                    debug!(source = %source.name, variant = i, error = %e, kind = e.kind(), "body variant failed");
                    last = e;
                }
            }
        }
        Err(last)
    }

    async fn paginate(
        &self,
        source: &Source,
        variant_idx: usize,
        variant: BodyVariant,
        first: Page,
    ) -> Fetched {
        let limit = self.policy.page_limit.max(1);
        let total = first.total;
        let mut last_len = first.postings.len();
        let mut postings = first.postings;
        let mut pages = 1u32;
        let mut offset = limit;

        while pages < self.policy.max_pages
            && last_len >= limit as usize
            && total.map_or(true, |t| u64::from(offset) < t)
        {
            self.pause().await;
            let body = variant.build(limit, offset, &self.policy.search_text);
            match self.query_page(source, &body).await {
                Ok(p) => {
                    last_len = p.postings.len();
                    postings.extend(p.postings);
                    pages += 1;
                    offset += limit;
                }
                Err(e) => {
                    warn!(source = %source.name, offset, error = %e, "later page failed; keeping earlier pages");
                    break;
                }
            }
        }

        Fetched {
            postings,
            variant: variant_idx,
            pages,
        }
    }

    async fn query_page(&self, source: &Source, body: &Value) -> Result<Page, FetchFailure> {
        let resp = self
            .transport
            .post_json(&source.query_endpoint, body, self.policy.timeout)
            .await?;
        if !(200..300).contains(&resp.status) {
            return Err(FetchFailure::Status(resp.status));
        }
        let payload: Value = serde_json::from_str(resp.body.trim())
            .map_err(|e| FetchFailure::Malformed(e.to_string()))?;
        let arr = find_postings(&payload).ok_or(FetchFailure::UnrecognizedShape)?;
        let total = payload
            .get("total")
            .and_then(Value::as_u64)
            .filter(|t| *t > 0);
        Ok(Page {
            postings: arr.iter().cloned().map(RawPosting).collect(),
            total,
        })
    }
}
