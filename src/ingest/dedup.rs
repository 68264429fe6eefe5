// src/ingest/dedup.rs
//! Seen-identifier set: classification plus its on-disk store.
//!
//! The set only grows. A posting that leaves a board and later returns with the
//! same identifier is never announced twice.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::ingest::types::MatchedJob;

pub const DEFAULT_SEEN_PATH: &str = "state/seen_jobs.json";

/// A lock file older than this is assumed to belong to a crashed run.
pub const STALE_LOCK_AFTER: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    ids: BTreeSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true if the identifier was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_superset(&self, other: &SeenSet) -> bool {
        self.ids.is_superset(&other.ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub new: Vec<MatchedJob>,
    pub current: Vec<MatchedJob>,
    pub seen: SeenSet,
}

/// Split matches into new and already-seen, preserving discovery order.
/// A repeated identifier within one batch is new the first time only.
pub fn classify(matches: Vec<MatchedJob>, seen: &SeenSet) -> Classified {
    let mut updated = seen.clone();
    let mut new = Vec::new();
    let mut current = Vec::new();
    for job in matches {
        if updated.insert(job.identifier.clone()) {
            new.push(job);
        } else {
            current.push(job);
        }
    }
    Classified {
        new,
        current,
        seen: updated,
    }
}

/// JSON list of identifiers at a fixed path, rewritten whole on save.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file is a cold start. An unreadable or invalid file is also treated
    /// as empty, with a warning: every current match will be re-announced.
    pub fn load(&self) -> SeenSet {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no seen-jobs file yet; starting empty");
                return SeenSet::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "seen-jobs file unreadable; starting empty, expect duplicate notifications");
                return SeenSet::new();
            }
        };
        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(ids) => {
                let set: SeenSet = ids.into_iter().collect();
                debug!(path = %self.path.display(), count = set.len(), "seen-jobs loaded");
                set
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "seen-jobs file corrupt; starting empty, expect duplicate notifications");
                SeenSet::new()
            }
        }
    }

    /// Write to a sibling temp file, then rename over the target.
    pub fn save(&self, seen: &SeenSet) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        let ids: Vec<&str> = seen.iter().collect();
        let body = serde_json::to_vec_pretty(&ids).context("encoding seen-jobs")?;
        let tmp = sibling(&self.path, "tmp");
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = seen.len(), "seen-jobs saved");
        Ok(())
    }

    /// Take the single-writer lock for this store. Released on drop.
    pub fn lock(&self) -> Result<SeenLock> {
        let lock_path = sibling(&self.path, "lock");
        if let Some(dir) = lock_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        for _ in 0..2 {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut f) => {
                    let _ = writeln!(f, "{}", std::process::id());
                    return Ok(SeenLock { path: lock_path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&lock_path) {
                        warn!(path = %lock_path.display(), "removing stale lock");
                        let _ = fs::remove_file(&lock_path);
                        continue;
                    }
                    bail!(
                        "another run holds {}; refusing to overlap",
                        lock_path.display()
                    );
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("creating {}", lock_path.display()))
                }
            }
        }
        bail!("could not acquire {}", lock_path.display())
    }
}

fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn is_stale(lock_path: &Path) -> bool {
    fs::metadata(lock_path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| SystemTime::now().duration_since(t).ok())
        .is_some_and(|age| age > STALE_LOCK_AFTER)
}

#[derive(Debug)]
pub struct SeenLock {
    path: PathBuf,
}

impl Drop for SeenLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}
