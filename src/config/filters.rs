// src/config/filters.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_FILTERS_PATH: &str = "JOBWATCH_FILTERS_PATH";

/// Title keywords and location keywords. Both lists are lower-cased, trimmed,
/// de-duplicated and keep their configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let own = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            keywords: own(&[
                "data",
                "analyst",
                "analytics",
                "business intelligence",
                "developer",
                "software engineer",
                "full stack",
                "python",
                "intern",
                "graduate",
                "trainee",
            ]),
            locations: own(&["mumbai", "navi mumbai", "thane", "pune", "remote india"]),
        }
    }
}

impl FilterConfig {
    fn cleaned(self) -> Result<Self> {
        let out = Self {
            keywords: clean_list(self.keywords),
            locations: clean_list(self.locations),
        };
        if out.keywords.is_empty() {
            bail!("filter config has no keywords");
        }
        Ok(out)
    }
}

/// Load filters from an explicit path. Supports TOML or JSON.
pub fn load_filters_from(path: &Path) -> Result<FilterConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading filters from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_filters(&content, ext.as_str())
        .with_context(|| format!("parsing filters from {}", path.display()))
}

/// Load filters using env var + fallbacks:
/// 1) $JOBWATCH_FILTERS_PATH
/// 2) config/filters.toml
/// 3) config/filters.json
/// 4) built-in defaults
pub fn load_filters_default() -> Result<FilterConfig> {
    if let Ok(p) = std::env::var(ENV_FILTERS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_filters_from(&pb);
        }
        return Err(anyhow!("{ENV_FILTERS_PATH} points to non-existent path"));
    }
    for candidate in ["config/filters.toml", "config/filters.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_filters_from(&p);
        }
    }
    FilterConfig::default().cleaned()
}

fn parse_filters(s: &str, hint_ext: &str) -> Result<FilterConfig> {
    let parsed: FilterConfig = if hint_ext == "json" || s.trim_start().starts_with('{') {
        serde_json::from_str(s)?
    } else {
        toml::from_str(s)?
    };
    parsed.cleaned()
}

/// Trim, lower-case, drop empties and repeats; first occurrence keeps its slot.
pub(crate) fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
