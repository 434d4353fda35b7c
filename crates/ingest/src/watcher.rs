//! Polling directory watcher.
//!
//! Observes `watch_path` (non-recursive) and emits one [`IngestionEvent`] per
//! newly appearing file whose name matches the filter.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use thiserror::Error;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A file that appeared in the watch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionEvent {
    pub file_path: PathBuf,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("invalid file filter `{filter}`: {source}")]
    InvalidPattern {
        filter: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("watch directory does not exist: {0}")]
    Missing(PathBuf),

    #[error("watch path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot read watch directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
pub struct DirectoryWatcher {
    dir: PathBuf,
    pattern: Pattern,
    poll_interval: Duration,
}

impl DirectoryWatcher {
    pub fn new(
        dir: impl Into<PathBuf>,
        filter: &str,
        poll_interval: Duration,
    ) -> Result<Self, WatchError> {
        let pattern = Pattern::new(filter).map_err(|source| WatchError::InvalidPattern {
            filter: filter.to_string(),
            source,
        })?;
        Ok(Self {
            dir: dir.into(),
            pattern,
            poll_interval,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names are matched case-insensitively.
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches_with(file_name, MATCH_OPTIONS)
    }

    /// Fail unless the watch directory exists and can be listed.
    pub async fn check_accessible(&self) -> Result<(), WatchError> {
        let meta = match tokio::fs::metadata(&self.dir).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WatchError::Missing(self.dir.clone()));
            }
            Err(source) => {
                return Err(WatchError::Unreadable {
                    path: self.dir.clone(),
                    source,
                });
            }
        };
        if !meta.is_dir() {
            return Err(WatchError::NotADirectory(self.dir.clone()));
        }
        self.scan().await.map(|_| ())
    }

    /// Regular files directly under the watch directory matching the filter.
    pub async fn scan(&self) -> Result<HashSet<PathBuf>, WatchError> {
        let unreadable = |source| WatchError::Unreadable {
            path: self.dir.clone(),
            source,
        };

        let mut found = HashSet::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unreadable)?;
        while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
            // Entries can vanish between listing and stat.
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| self.matches(n)) {
                found.insert(entry.path());
            }
        }
        Ok(found)
    }

    /// Start polling. `baseline` holds paths that must not be reported (files
    /// already present at startup).
    ///
    /// A reported path stays known until it disappears from a scan or arrives
    /// on `released`, whichever comes first. The dispatcher releases a path
    /// once its file has left the directory, so a new file reusing the name is
    /// reported on the next scan. The task ends on `shutdown` or when the
    /// receiver is dropped; the sender is dropped with it.
    pub fn spawn(
        self,
        baseline: HashSet<PathBuf>,
        events: mpsc::Sender<IngestionEvent>,
        mut released: mpsc::UnboundedReceiver<PathBuf>,
        shutdown: Arc<Notify>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(dir = %self.dir.display(), filter = %self.pattern, "watching directory");

            let mut known = baseline;
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        info!(dir = %self.dir.display(), "watcher stopping");
                        break;
                    }
                    Some(path) = released.recv() => {
                        known.remove(&path);
                    }
                    _ = ticker.tick() => {
                        let current = match self.scan().await {
                            Ok(current) => current,
                            Err(e) => {
                                warn!(error = %e, "directory scan failed");
                                continue;
                            }
                        };

                        let mut fresh: Vec<PathBuf> =
                            current.difference(&known).cloned().collect();
                        fresh.sort();
                        // Forget files that left, so a later file with the same name is new.
                        known = current;

                        for file_path in fresh {
                            debug!(path = %file_path.display(), "file detected");
                            let event = IngestionEvent {
                                file_path,
                                detected_at: Utc::now(),
                            };
                            if events.send(event).await.is_err() {
                                debug!("event receiver closed; watcher exiting");
                                return;
                            }
                        }
                    }
                }
            }
        })
    }
}
