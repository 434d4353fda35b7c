//! One processing unit: route → validate → convert → resolve → submit → place.
//!
//! [`FilePipeline::process_file`] is the error boundary. Every failure is
//! logged and turned into a placement decision; nothing propagates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::convert::convert;
use crate::error::{FailureKind, IngestResult};
use crate::kind::DocumentKind;
use crate::placement::{OutcomePlacement, PlacementArea};
use crate::router::route;
use crate::schema::SchemaRegistry;
use crate::services::{ServiceProvider, Submission};

/// How the pipeline ended for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProcessingOutcome {
    Succeeded(Submission),
    Failed { kind: FailureKind, message: String },
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Succeeded(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ProcessingOutcome::Succeeded(_) => None,
            ProcessingOutcome::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Known once the root tag has been classified.
    pub kind: Option<DocumentKind>,
    pub outcome: ProcessingOutcome,
    pub area: PlacementArea,
    /// Final location, `None` if the move itself failed.
    pub placed_at: Option<PathBuf>,
}

/// Stages shared by all processing units.
pub struct FilePipeline {
    schemas: SchemaRegistry,
    schema_validation: bool,
    services: Arc<dyn ServiceProvider>,
    placement: Arc<OutcomePlacement>,
}

impl FilePipeline {
    pub fn new(
        schemas: SchemaRegistry,
        schema_validation: bool,
        services: Arc<dyn ServiceProvider>,
        placement: Arc<OutcomePlacement>,
    ) -> Self {
        Self {
            schemas,
            schema_validation,
            services,
            placement,
        }
    }

    pub fn placement(&self) -> &OutcomePlacement {
        &self.placement
    }

    /// Run every stage for `path` and move the file to its terminal area.
    pub async fn process_file(&self, path: &Path) -> FileReport {
        let mut kind = None;
        let result = self.run_stages(path, &mut kind).await;

        let outcome = match result {
            Ok(submission) => {
                info!(
                    path = %path.display(),
                    kind = %submission.kind,
                    key = %submission.key,
                    "file processed"
                );
                ProcessingOutcome::Succeeded(submission)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    kind = ?kind,
                    failure = %e.kind(),
                    error = %e,
                    "file rejected"
                );
                ProcessingOutcome::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        let area = PlacementArea::for_result(outcome.failure_kind());
        let placed_at = match self.placement.place(path, area).await {
            Ok(target) => Some(target),
            Err(e) => {
                error!(path = %path.display(), area = ?area, error = %e, "failed to place file");
                None
            }
        };

        FileReport {
            path: path.to_path_buf(),
            kind,
            outcome,
            area,
            placed_at,
        }
    }

    async fn run_stages(
        &self,
        path: &Path,
        kind_seen: &mut Option<DocumentKind>,
    ) -> IngestResult<Submission> {
        let routed = route(path).await?;
        *kind_seen = Some(routed.kind);

        if self.schema_validation {
            self.schemas.validate(routed.kind, &routed.document)?;
        }

        let request = convert(&routed.document, routed.kind, Utc::now())?;

        let scope = self.services.scope();
        scope.resolver().resolve(&request).await?;
        scope.submit(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryServiceProvider;

    struct Fixture {
        _root: tempfile::TempDir,
        watch: PathBuf,
        provider: InMemoryServiceProvider,
        pipeline: FilePipeline,
    }

    fn fixture(schema_validation: bool) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let watch = root.path().join("in");
        std::fs::create_dir_all(&watch).unwrap();
        let provider = InMemoryServiceProvider::new();
        let placement = Arc::new(OutcomePlacement::new(
            root.path().join("processed"),
            root.path().join("errors"),
        ));
        let pipeline = FilePipeline::new(
            SchemaRegistry::builtin(),
            schema_validation,
            Arc::new(provider.clone()),
            placement,
        );
        Fixture {
            _root: root,
            watch,
            provider,
            pipeline,
        }
    }

    fn drop_file(dir: &Path, name: &str, xml: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, xml).unwrap();
        path
    }

    #[tokio::test]
    async fn customer_file_is_submitted_and_processed() {
        let f = fixture(true);
        let path = drop_file(
            &f.watch,
            "c.xml",
            "<Customer><CustomerIdentifier>C-1</CustomerIdentifier><Name>Acme</Name><Address>1 Road</Address></Customer>",
        );

        let report = f.pipeline.process_file(&path).await;

        assert_eq!(report.kind, Some(DocumentKind::Customer));
        assert!(report.outcome.is_success());
        assert_eq!(report.area, PlacementArea::Processed);
        assert!(report.placed_at.unwrap().exists());
        assert!(!path.exists());
        assert_eq!(f.provider.customers().len(), 1);
    }

    #[tokio::test]
    async fn malformed_file_goes_to_errors() {
        let f = fixture(true);
        let path = drop_file(&f.watch, "broken.xml", "<Customer><Name>");

        let report = f.pipeline.process_file(&path).await;

        assert_eq!(report.kind, None);
        assert_eq!(report.outcome.failure_kind(), Some(FailureKind::Malformed));
        assert_eq!(report.area, PlacementArea::Errors);
        assert!(report.placed_at.is_some());
    }

    #[tokio::test]
    async fn validation_failure_names_the_element() {
        let f = fixture(true);
        let path = drop_file(
            &f.watch,
            "c.xml",
            "<Customer><CustomerIdentifier>C-1</CustomerIdentifier><Name>Acme</Name></Customer>",
        );

        let report = f.pipeline.process_file(&path).await;

        assert_eq!(report.kind, Some(DocumentKind::Customer));
        assert_eq!(report.area, PlacementArea::ValidationErrors);
        match report.outcome {
            ProcessingOutcome::Failed { kind, message } => {
                assert_eq!(kind, FailureKind::Validation);
                assert!(message.contains("Address"), "{message}");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(f.provider.customers().is_empty());
    }

    #[tokio::test]
    async fn converter_still_guards_required_fields_without_validation() {
        let f = fixture(false);
        let path = drop_file(&f.watch, "p.xml", "<Product><Title>Widget</Title></Product>");

        let report = f.pipeline.process_file(&path).await;

        assert_eq!(report.outcome.failure_kind(), Some(FailureKind::Validation));
        assert!(f.provider.products().is_empty());
    }

    #[tokio::test]
    async fn duplicate_submission_is_transient() {
        let f = fixture(true);
        let xml = "<Product><Code>P001</Code><Title>Widget</Title></Product>";

        let first = f.pipeline.process_file(&drop_file(&f.watch, "a.xml", xml)).await;
        let second = f.pipeline.process_file(&drop_file(&f.watch, "b.xml", xml)).await;

        assert!(first.outcome.is_success());
        assert_eq!(second.outcome.failure_kind(), Some(FailureKind::Transient));
        assert_eq!(second.area, PlacementArea::Errors);
    }

    #[tokio::test]
    async fn failed_move_keeps_the_outcome_and_later_files_still_run() {
        let f = fixture(true);
        let processed = f.pipeline.placement().directory(PlacementArea::Processed).to_path_buf();
        std::fs::write(&processed, "not a directory").unwrap();

        let stuck = drop_file(
            &f.watch,
            "c.xml",
            "<Customer><CustomerIdentifier>C-1</CustomerIdentifier><Name>Acme</Name><Address>1 Road</Address></Customer>",
        );
        let report = f.pipeline.process_file(&stuck).await;

        assert!(report.outcome.is_success());
        assert_eq!(report.area, PlacementArea::Processed);
        assert_eq!(report.placed_at, None);
        assert!(stuck.exists());
        assert_eq!(f.provider.customers().len(), 1);

        let broken = drop_file(&f.watch, "broken.xml", "<Customer><Name>");
        let next = f.pipeline.process_file(&broken).await;

        assert_eq!(next.outcome.failure_kind(), Some(FailureKind::Malformed));
        let placed = next.placed_at.unwrap();
        assert!(placed.starts_with(f.pipeline.placement().directory(PlacementArea::Errors)));
        assert!(placed.exists());
        assert!(!broken.exists());
    }
}
