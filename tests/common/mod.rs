// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use job_board_watcher::ingest::fetch::TransportResponse;
use job_board_watcher::{FetchFailure, FetchPolicy, Fetcher, JobBoardTransport, StatusTracker};
use serde_json::Value;

type Handler = dyn Fn(&str, &Value) -> Result<TransportResponse, FetchFailure> + Send + Sync;

/// In-memory board: a closure decides the reply for each (endpoint, body).
pub struct ScriptedTransport {
    handler: Box<Handler>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<TransportResponse, FetchFailure> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(f),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl JobBoardTransport for ScriptedTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        body: &Value,
        _timeout: Duration,
    ) -> Result<TransportResponse, FetchFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.clone()));
        (self.handler)(endpoint, body)
    }
}

pub fn ok_json(v: Value) -> Result<TransportResponse, FetchFailure> {
    Ok(TransportResponse {
        status: 200,
        body: v.to_string(),
    })
}

pub fn status(code: u16) -> Result<TransportResponse, FetchFailure> {
    Ok(TransportResponse {
        status: code,
        body: String::new(),
    })
}

pub fn fetcher(t: Arc<ScriptedTransport>) -> (Fetcher, Arc<StatusTracker>) {
    let tracker = Arc::new(StatusTracker::new());
    let f = Fetcher::new(t, FetchPolicy::immediate()).with_status(tracker.clone());
    (f, tracker)
}
