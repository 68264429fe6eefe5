// src/ingest/sources.rs
//! Source registry: which boards to poll, in which order, and which one is pinned
//! to the top of every report.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::Source;

pub const ENV_SOURCES_PATH: &str = "JOBWATCH_SOURCES_PATH";
pub const DEFAULT_PINNED_SOURCE: &str = "S&P Global";

/// Built-in Workday boards: (name, query endpoint, public base URL).
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "S&P Global",
        "https://spgi.wd5.myworkdayjobs.com/wday/cxs/spgi/SPGI_Careers/jobs",
        "https://spgi.wd5.myworkdayjobs.com/SPGI_Careers",
    ),
    (
        "KPMG India",
        "https://kpmg.wd1.myworkdayjobs.com/wday/cxs/kpmgcareers/KPMG_Careers/jobs",
        "https://kpmg.wd1.myworkdayjobs.com/KPMG_Careers",
    ),
    (
        "Capgemini India",
        "https://capgemini.wd3.myworkdayjobs.com/wday/cxs/capgemini/Capgemini_India/jobs",
        "https://capgemini.wd3.myworkdayjobs.com/Capgemini_India",
    ),
    (
        "Nasdaq",
        "https://nasdaq.wd1.myworkdayjobs.com/wday/cxs/nasdaqcareers/NasdaqCareers/jobs",
        "https://nasdaq.wd1.myworkdayjobs.com/NasdaqCareers",
    ),
    (
        "PwC",
        "https://pwc.wd3.myworkdayjobs.com/wday/cxs/pwc/External_Careers/jobs",
        "https://pwc.wd3.myworkdayjobs.com/External_Careers",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<Source>,
    pinned: String,
}

impl SourceRegistry {
    /// Validates: at least one source, unique names, non-empty endpoints.
    pub fn new(sources: Vec<Source>, pinned: impl Into<String>) -> Result<Self> {
        if sources.is_empty() {
            bail!("no job sources configured");
        }
        let mut names = HashSet::new();
        for s in &sources {
            if s.name.trim().is_empty() {
                bail!("job source with empty name");
            }
            if s.query_endpoint.trim().is_empty() || s.base_url.trim().is_empty() {
                bail!("job source {:?} is missing its endpoint or base URL", s.name);
            }
            if !names.insert(s.name.as_str()) {
                bail!("duplicate job source name {:?}", s.name);
            }
        }
        Ok(Self {
            sources,
            pinned: pinned.into(),
        })
    }

    pub fn builtin() -> Self {
        let sources = BUILTIN
            .iter()
            .map(|(n, q, b)| Source::new(*n, *q, *b))
            .collect();
        Self {
            sources,
            pinned: DEFAULT_PINNED_SOURCE.to_string(),
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn pinned(&self) -> &str {
        &self.pinned
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Report order: pinned source first, then lexicographic by name.
pub fn group_order(pinned: &str, a: &str, b: &str) -> Ordering {
    (a != pinned, a).cmp(&(b != pinned, b))
}

#[derive(Deserialize)]
struct SourcesFile {
    sources: Vec<Source>,
    #[serde(default)]
    pinned: Option<String>,
}

pub fn load_sources_from(path: &Path) -> Result<SourceRegistry> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let file: SourcesFile = if path.extension().and_then(|s| s.to_str()) == Some("json") {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    SourceRegistry::new(
        file.sources,
        file.pinned
            .unwrap_or_else(|| DEFAULT_PINNED_SOURCE.to_string()),
    )
    .with_context(|| format!("validating sources from {}", path.display()))
}

/// 1) $JOBWATCH_SOURCES_PATH  2) config/sources.toml  3) built-in registry
pub fn load_sources_default() -> Result<SourceRegistry> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        return load_sources_from(&PathBuf::from(p));
    }
    let p = PathBuf::from("config/sources.toml");
    if p.exists() {
        return load_sources_from(&p);
    }
    Ok(SourceRegistry::builtin())
}
