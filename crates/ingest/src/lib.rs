//! XML file-drop ingestion.
//!
//! Files dropped into a watched directory are classified by root tag,
//! validated, converted into typed requests, checked against existing master
//! data, submitted to the domain services, and finally moved to the processed
//! or error area.

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod kind;
pub mod orchestrator;
pub mod pipeline;
pub mod placement;
pub mod resolve;
pub mod router;
pub mod schema;
pub mod services;
pub mod values;
pub mod watcher;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, FileProcessorConfig};
pub use error::{FailureKind, IngestError, IngestResult};
pub use kind::DocumentKind;
pub use orchestrator::{FileProcessor, FileProcessorHandle, ProcessorStats, StartError};
pub use pipeline::{FileReport, ProcessingOutcome};
pub use placement::PlacementArea;
pub use services::{InMemoryServiceProvider, ServiceProvider, ServiceScope};
