use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;

use super::{Notifier, RunReport};
use crate::ingest::types::MatchedJob;

/// One spreadsheet row. Serialized as a positional array:
/// `[source, title, location, url, posted_date, timestamp]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRow(
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
    pub String,
);

impl SheetRow {
    pub fn from_job(j: &MatchedJob, timestamp: &str) -> Self {
        Self(
            j.source_name.clone(),
            j.title.clone(),
            j.location.clone(),
            j.url.clone(),
            j.posted_date.clone(),
            timestamp.to_string(),
        )
    }
}

/// Appends new-job rows through a sheet webhook (e.g. an Apps Script endpoint).
pub struct SheetNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SheetNotifier {
    pub fn from_env() -> Option<Self> {
        std::env::var("SHEET_WEBHOOK_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .map(Self::new)
    }

    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for SheetNotifier {
    async fn send(&self, report: &RunReport) -> Result<()> {
        let rows = report.sheet_rows();
        if rows.is_empty() {
            tracing::debug!("no new jobs; nothing to append to sheet");
            return Ok(());
        }
        let body = serde_json::json!({ "rows": rows });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("sheet webhook post")?
            .error_for_status()
            .context("sheet webhook non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sheet"
    }
}
