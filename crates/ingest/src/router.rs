//! Type router: read a dropped file, parse it, and pick its handling path.

use std::path::Path;

use crate::document::ParsedDocument;
use crate::error::{IngestError, IngestResult};
use crate::kind::DocumentKind;

/// A parsed document together with the kind it was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedDocument {
    pub kind: DocumentKind,
    pub document: ParsedDocument,
}

/// Map a parsed document to its kind via the root tag.
pub fn classify(document: &ParsedDocument) -> IngestResult<DocumentKind> {
    DocumentKind::from_root_tag(document.root_tag())
        .ok_or_else(|| IngestError::UnknownType(document.root_tag().to_string()))
}

/// Read and parse `path`, then classify it.
///
/// Read failures are transient; unparseable content is malformed.
pub async fn route(path: &Path) -> IngestResult<RoutedDocument> {
    let bytes = tokio::fs::read(path).await?;
    let document = ParsedDocument::from_bytes(&bytes)?;
    let kind = classify(&document)?;
    Ok(RoutedDocument { kind, document })
}
