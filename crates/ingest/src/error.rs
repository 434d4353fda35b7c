//! Failure taxonomy for the per-file pipeline.
//!
//! Every stage returns an [`IngestError`]; the orchestrator is the only place
//! that turns one into a placement decision.

use serde::Serialize;
use thiserror::Error;

use wms_core::{CustomerId, DomainError, ProductCode};

/// Result type used by pipeline stages.
pub type IngestResult<T> = Result<T, IngestError>;

/// Coarse failure category, used for logging, stats and placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Malformed,
    Validation,
    UnknownType,
    ReferenceNotFound,
    Transient,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Malformed => "malformed",
            FailureKind::Validation => "validation",
            FailureKind::UnknownType => "unknown_type",
            FailureKind::ReferenceNotFound => "reference_not_found",
            FailureKind::Transient => "transient",
        }
    }
}

impl core::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural violation: which element, and what was expected of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetail {
    pub element: String,
    pub constraint: String,
}

impl ValidationDetail {
    pub fn new(element: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            constraint: constraint.into(),
        }
    }
}

impl core::fmt::Display for ValidationDetail {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "element `{}` {}", self.element, self.constraint)
    }
}

/// A reference inside a document that does not resolve to an existing record.
///
/// The rendered messages are relied upon by log tooling; keep them stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReference {
    Customer(CustomerId),
    Product(ProductCode),
}

impl MissingReference {
    pub fn entity(&self) -> &'static str {
        match self {
            MissingReference::Customer(_) => "Customer",
            MissingReference::Product(_) => "Product",
        }
    }

    pub fn key(&self) -> String {
        match self {
            MissingReference::Customer(id) => id.to_string(),
            MissingReference::Product(code) => code.to_string(),
        }
    }
}

impl core::fmt::Display for MissingReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MissingReference::Customer(id) => write!(f, "Customer with ID {id} not found"),
            MissingReference::Product(code) => write!(f, "Product with code {code} not found"),
        }
    }
}

/// Pipeline failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    /// Content could not be read as a document at all, or a value could not be parsed.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Document shape does not match the schema for its kind.
    #[error("validation failed: {0}")]
    Validation(ValidationDetail),

    /// Root element is not one of the known document kinds.
    #[error("Unknown file type: {0}")]
    UnknownType(String),

    /// A referenced customer or product does not exist.
    #[error("{0}")]
    ReferenceNotFound(MissingReference),

    /// Downstream service or I/O failure.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl IngestError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn validation(element: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::Validation(ValidationDetail::new(element, constraint))
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::Malformed(_) => FailureKind::Malformed,
            IngestError::Validation(_) => FailureKind::Validation,
            IngestError::UnknownType(_) => FailureKind::UnknownType,
            IngestError::ReferenceNotFound(_) => FailureKind::ReferenceNotFound,
            IngestError::Transient(_) => FailureKind::Transient,
        }
    }
}

/// Any error reported by a domain service is treated as transient: the file is
/// parked for manual re-submission, never retried here.
impl From<DomainError> for IngestError {
    fn from(value: DomainError) -> Self {
        IngestError::Transient(value.to_string())
    }
}

impl From<std::io::Error> for IngestError {
    fn from(value: std::io::Error) -> Self {
        IngestError::Transient(format!("i/o error: {value}"))
    }
}
