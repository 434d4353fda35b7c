//! Ingestion orchestrator.
//!
//! Wires the watcher to a dispatcher that runs one processing unit per
//! detected file. Units for distinct files run concurrently (bounded by
//! `max_concurrent`), a path already in flight is never dispatched twice, and
//! `stop()` drains every unit before returning.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Notify, Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, FileProcessorConfig};
use crate::pipeline::{FilePipeline, FileReport};
use crate::placement::{OutcomePlacement, PlacementError};
use crate::schema::{SchemaError, SchemaRegistry};
use crate::services::ServiceProvider;
use crate::watcher::{DirectoryWatcher, IngestionEvent, WatchError};

/// Capacity of the watcher → dispatcher channel.
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// Run statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessorStats {
    pub files_detected: u64,
    pub files_succeeded: u64,
    pub files_failed: u64,
    /// Failures keyed by failure kind (`malformed`, `validation`, ...).
    pub failures_by_kind: BTreeMap<&'static str, u64>,
    /// Files whose terminal move failed; they remain in the watch directory.
    pub placement_failures: u64,
    pub in_flight: usize,
}

impl ProcessorStats {
    fn record(&mut self, report: &FileReport) {
        match report.outcome.failure_kind() {
            None => self.files_succeeded += 1,
            Some(kind) => {
                self.files_failed += 1;
                *self.failures_by_kind.entry(kind.as_str()).or_default() += 1;
            }
        }
        if report.placed_at.is_none() {
            self.placement_failures += 1;
        }
    }
}

type SharedStats = Arc<Mutex<ProcessorStats>>;

fn update_stats(stats: &SharedStats, f: impl FnOnce(&mut ProcessorStats)) {
    match stats.lock() {
        Ok(mut guard) => f(&mut guard),
        Err(poisoned) => f(&mut poisoned.into_inner()),
    }
}

/// Removes a path from the in-flight set when its unit ends.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl InFlightGuard {
    /// `None` if the path is already being processed.
    fn claim(set: &Arc<Mutex<HashSet<PathBuf>>>, path: &Path) -> Option<Self> {
        let mut guard = match set.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !guard.insert(path.to_path_buf()) {
            return None;
        }
        Some(Self {
            set: set.clone(),
            path: path.to_path_buf(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.path);
        }
    }
}

/// File-drop processor, constructed explicitly and controlled through the
/// handle returned by [`FileProcessor::start`].
pub struct FileProcessor {
    config: FileProcessorConfig,
    pipeline: Arc<FilePipeline>,
    watcher: DirectoryWatcher,
}

impl FileProcessor {
    /// Validate `config` and load schemas. Does not touch the watch directory.
    pub fn new(
        config: FileProcessorConfig,
        services: Arc<dyn ServiceProvider>,
    ) -> Result<Self, StartError> {
        config.validate()?;

        // Schema definitions are consulted only when validation is on.
        let schemas = if config.schema_validation {
            SchemaRegistry::load(config.schema_path.as_deref())?
        } else {
            SchemaRegistry::builtin()
        };

        let placement = Arc::new(OutcomePlacement::new(
            config.processed_path.clone(),
            config.error_path.clone(),
        ));
        let pipeline = Arc::new(FilePipeline::new(
            schemas,
            config.schema_validation,
            services,
            placement,
        ));
        let watcher = DirectoryWatcher::new(
            config.watch_path.clone(),
            &config.file_filter,
            config.poll_interval(),
        )?;

        Ok(Self {
            config,
            pipeline,
            watcher,
        })
    }

    pub fn config(&self) -> &FileProcessorConfig {
        &self.config
    }

    /// Run the full pipeline for one file outside the watch loop.
    pub async fn process_file(&self, path: &Path) -> FileReport {
        self.pipeline.process_file(path).await
    }

    /// Begin watching. Fails fast if the watch directory is missing or
    /// unreadable, or the destination directories cannot be created.
    pub async fn start(self) -> Result<FileProcessorHandle, StartError> {
        self.watcher.check_accessible().await?;
        self.pipeline.placement().ensure_directories().await?;

        let baseline = if self.config.process_existing {
            HashSet::new()
        } else {
            self.watcher.scan().await?
        };
        if !baseline.is_empty() {
            info!(count = baseline.len(), "ignoring files present at startup");
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (release_tx, release_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let stats: SharedStats = Arc::new(Mutex::new(ProcessorStats::default()));

        let watcher = self
            .watcher
            .spawn(baseline, tx, release_rx, shutdown.clone());
        let dispatcher = tokio::spawn(dispatch(
            self.pipeline.clone(),
            rx,
            release_tx,
            self.config.max_concurrent,
            stats.clone(),
        ));

        info!(
            watch = %self.config.watch_path.display(),
            processed = %self.config.processed_path.display(),
            errors = %self.config.error_path.display(),
            max_concurrent = self.config.max_concurrent,
            "file processor started"
        );

        Ok(FileProcessorHandle {
            shutdown,
            watcher: Some(watcher),
            dispatcher: Some(dispatcher),
            stats,
        })
    }
}

/// Handle to a running processor.
#[derive(Debug)]
pub struct FileProcessorHandle {
    shutdown: Arc<Notify>,
    watcher: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
    stats: SharedStats,
}

impl FileProcessorHandle {
    pub fn stats(&self) -> ProcessorStats {
        match self.stats.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stop accepting new files and wait for in-flight units to finish.
    pub async fn stop(mut self) {
        info!("file processor stopping");
        self.shutdown.notify_one();

        if let Some(watcher) = self.watcher.take()
            && let Err(e) = watcher.await
        {
            error!(error = %e, "watcher task failed");
        }
        // The watcher dropped its sender; the dispatcher drains and exits.
        if let Some(dispatcher) = self.dispatcher.take()
            && let Err(e) = dispatcher.await
        {
            error!(error = %e, "dispatcher task failed");
        }

        let stats = self.stats();
        info!(
            detected = stats.files_detected,
            succeeded = stats.files_succeeded,
            failed = stats.files_failed,
            "file processor stopped"
        );
    }
}

async fn dispatch(
    pipeline: Arc<FilePipeline>,
    mut events: mpsc::Receiver<IngestionEvent>,
    released: mpsc::UnboundedSender<PathBuf>,
    max_concurrent: usize,
    stats: SharedStats,
) {
    let permits = Arc::new(Semaphore::new(max_concurrent));
    let in_flight: Arc<Mutex<HashSet<PathBuf>>> = Arc::new(Mutex::new(HashSet::new()));
    let mut units = JoinSet::new();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let Some(guard) = InFlightGuard::claim(&in_flight, &event.file_path) else {
                    debug!(path = %event.file_path.display(), "already in flight; skipping");
                    continue;
                };

                update_stats(&stats, |s| {
                    s.files_detected += 1;
                    s.in_flight += 1;
                });

                let pipeline = pipeline.clone();
                let permits = permits.clone();
                let stats = stats.clone();
                let released = released.clone();
                units.spawn(async move {
                    let report = match permits.acquire_owned().await {
                        Ok(_permit) => Some(pipeline.process_file(&event.file_path).await),
                        Err(e) => {
                            warn!(path = %event.file_path.display(), error = %e, "unit not started");
                            None
                        }
                    };
                    // Release the claim before the watcher can report the name again.
                    drop(guard);
                    // Only a file that left the watch directory may be seen again;
                    // one whose move failed stays known and is not retried.
                    if report.as_ref().is_some_and(|r| r.placed_at.is_some()) {
                        let _ = released.send(event.file_path.clone());
                    }
                    update_stats(&stats, |s| {
                        s.in_flight = s.in_flight.saturating_sub(1);
                        if let Some(report) = &report {
                            s.record(report);
                        }
                    });
                });
            }
            Some(joined) = units.join_next(), if !units.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "processing unit failed");
                }
            }
        }
    }

    debug!(remaining = units.len(), "draining processing units");
    while let Some(joined) = units.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "processing unit failed");
        }
    }
}
