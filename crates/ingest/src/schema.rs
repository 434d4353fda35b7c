//! Structural validation of parsed documents.
//!
//! Each document kind has a schema: flat fields under the root plus optional
//! list sections (order `Items`). Built-in schemas cover every kind; a
//! `<Kind>.schema.json` file under the configured schema directory replaces the
//! built-in one for that kind.
//!
//! Once a document passes validation, converters may assume every required
//! element is present and every typed value parses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{ParsedDocument, XmlElement};
use crate::error::{IngestError, IngestResult};
use crate::kind::DocumentKind;
use crate::values;

/// Primitive type of a field's text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Date,
}

/// Constraint on a single child element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Numeric values must be strictly greater than zero.
    #[serde(default)]
    pub positive: bool,
}

impl FieldRule {
    fn new(name: &str, field_type: FieldType, required: bool, positive: bool) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            required,
            positive,
        }
    }

    pub fn required(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type, true, false)
    }

    pub fn required_positive(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type, true, true)
    }

    pub fn optional(name: &str, field_type: FieldType) -> Self {
        Self::new(name, field_type, false, false)
    }
}

fn one() -> usize {
    1
}

/// A repeated section: `<container><item>..</item>..</container>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRule {
    pub container: String,
    pub item: String,
    #[serde(default = "one")]
    pub min_items: usize,
    pub fields: Vec<FieldRule>,
}

/// Expected shape of one document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSchema {
    pub root: String,
    pub fields: Vec<FieldRule>,
    #[serde(default)]
    pub lists: Vec<ListRule>,
}

impl DocumentSchema {
    /// Built-in schema for a kind.
    pub fn builtin(kind: DocumentKind) -> Self {
        use FieldType::*;

        let order_items = ListRule {
            container: "Items".to_string(),
            item: "Item".to_string(),
            min_items: 1,
            fields: vec![
                FieldRule::required("ProductCode", Text),
                FieldRule::required_positive("Quantity", Integer),
            ],
        };

        let (fields, lists) = match kind {
            DocumentKind::Customer => (
                vec![
                    FieldRule::required("CustomerIdentifier", Text),
                    FieldRule::required("Name", Text),
                    FieldRule::required("Address", Text),
                ],
                vec![],
            ),
            DocumentKind::Product => (
                vec![
                    FieldRule::required("Code", Text),
                    FieldRule::required("Title", Text),
                    FieldRule::optional("Description", Text),
                    FieldRule::optional("Length", Decimal),
                    FieldRule::optional("Width", Decimal),
                    FieldRule::optional("Height", Decimal),
                    FieldRule::optional("Weight", Decimal),
                ],
                vec![],
            ),
            DocumentKind::PurchaseOrder => (
                vec![
                    FieldRule::required("OrderId", Text),
                    FieldRule::optional("ProcessingDate", Date),
                    FieldRule::required_positive("CustomerId", Integer),
                ],
                vec![order_items],
            ),
            DocumentKind::SalesOrder => (
                vec![
                    FieldRule::required("OrderId", Text),
                    FieldRule::optional("ProcessingDate", Date),
                    FieldRule::required_positive("CustomerId", Integer),
                    FieldRule::required("ShipmentAddress", Text),
                ],
                vec![order_items],
            ),
        };

        Self {
            root: kind.root_tag().to_string(),
            fields,
            lists,
        }
    }

    /// Check `document` against this schema, stopping at the first violation.
    pub fn validate(&self, document: &ParsedDocument) -> IngestResult<()> {
        let root = document.root();
        if root.name != self.root {
            return Err(IngestError::validation(
                root.name.clone(),
                format!("must be `{}`", self.root),
            ));
        }

        for rule in &self.fields {
            check_field(root, rule, &self.root)?;
        }

        for list in &self.lists {
            let container_path = format!("{}/{}", self.root, list.container);
            let container = root
                .child(&list.container)
                .ok_or_else(|| IngestError::validation(&container_path, "is required"))?;

            let items: Vec<&XmlElement> = container.children_named(&list.item).collect();
            if items.len() < list.min_items {
                return Err(IngestError::validation(
                    &container_path,
                    format!(
                        "must contain at least {} `{}` element(s), found {}",
                        list.min_items,
                        list.item,
                        items.len()
                    ),
                ));
            }

            for (idx, item) in items.iter().enumerate() {
                let item_path = format!("{container_path}/{}[{}]", list.item, idx + 1);
                for rule in &list.fields {
                    check_field(item, rule, &item_path)?;
                }
            }
        }

        Ok(())
    }
}

fn check_field(parent: &XmlElement, rule: &FieldRule, parent_path: &str) -> IngestResult<()> {
    let path = format!("{parent_path}/{}", rule.name);

    let Some(text) = parent.child_text(&rule.name) else {
        if rule.required {
            return Err(IngestError::validation(path, "is required"));
        }
        return Ok(());
    };

    match rule.field_type {
        FieldType::Text => {
            if rule.required && text.is_empty() {
                return Err(IngestError::validation(path, "must not be empty"));
            }
        }
        FieldType::Integer => {
            let value = values::parse_integer(text)
                .map_err(|e| IngestError::validation(&path, format!("must be an integer: {e}")))?;
            if rule.positive && value <= 0 {
                return Err(IngestError::validation(path, "must be greater than zero"));
            }
        }
        FieldType::Decimal => {
            let value = values::parse_decimal(text)
                .map_err(|e| IngestError::validation(&path, format!("must be a decimal: {e}")))?;
            if rule.positive && value <= rust_decimal::Decimal::ZERO {
                return Err(IngestError::validation(path, "must be greater than zero"));
            }
        }
        FieldType::Date => {
            values::parse_date(text)
                .map_err(|e| IngestError::validation(&path, format!("must be a date: {e}")))?;
        }
    }

    Ok(())
}

/// Error loading schema definitions from disk.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema {path} declares root `{found}`, expected `{expected}`")]
    RootMismatch {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },
}

/// Schemas for every document kind.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<DocumentKind, DocumentSchema>,
}

impl SchemaRegistry {
    pub fn builtin() -> Self {
        let schemas = DocumentKind::ALL
            .into_iter()
            .map(|kind| (kind, DocumentSchema::builtin(kind)))
            .collect();
        Self { schemas }
    }

    /// File name of the on-disk override for a kind.
    pub fn schema_file_name(kind: DocumentKind) -> String {
        format!("{}.schema.json", kind.root_tag())
    }

    /// Built-in schemas, overridden by any `<Kind>.schema.json` under `dir`.
    pub fn load(dir: Option<&Path>) -> Result<Self, SchemaError> {
        let mut registry = Self::builtin();
        let Some(dir) = dir else {
            return Ok(registry);
        };

        for kind in DocumentKind::ALL {
            let path = dir.join(Self::schema_file_name(kind));
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(SchemaError::Io { path, source }),
            };

            let schema: DocumentSchema = serde_json::from_str(&raw)
                .map_err(|source| SchemaError::Parse { path: path.clone(), source })?;

            if schema.root != kind.root_tag() {
                return Err(SchemaError::RootMismatch {
                    path,
                    expected: kind.root_tag(),
                    found: schema.root,
                });
            }

            tracing::info!(kind = %kind, path = %path.display(), "loaded schema override");
            registry.schemas.insert(kind, schema);
        }

        Ok(registry)
    }

    pub fn get(&self, kind: DocumentKind) -> &DocumentSchema {
        // Every kind is populated by `builtin()`; overrides only replace entries.
        &self.schemas[&kind]
    }

    pub fn validate(&self, kind: DocumentKind, document: &ParsedDocument) -> IngestResult<()> {
        self.get(kind).validate(document)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
