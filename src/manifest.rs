//! Rendered manifest model.
//!
//! `helm template` emits one multi-document YAML stream. Each document is
//! parsed into a [`RenderedDocument`] holding its field tree and exposing
//! the identity triple (`apiVersion`, `kind`, `metadata.name`) used for
//! mask-rule matching. After masking, the set is canonicalized: documents
//! are sorted by `(kind, name, apiVersion)` and re-serialized so that
//! renderer emission order, comments, and incidental whitespace can never
//! flip a verdict.

use serde::Deserialize;
use serde_yaml::Value;

use crate::errors::{Result, SnapError};

/// One parsed document of a render stream. Never mutated outside the
/// masker.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub body: Value,
}

impl RenderedDocument {
    pub fn api_version(&self) -> &str {
        str_field(&self.body, "apiVersion")
    }

    pub fn kind(&self) -> &str {
        str_field(&self.body, "kind")
    }

    pub fn name(&self) -> &str {
        self.body
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Parse a raw multi-document YAML stream into documents.
///
/// Empty documents (separators with nothing but comments between them) are
/// dropped; helm emits those for charts with conditional templates.
pub fn parse_documents(raw: &str) -> Result<Vec<RenderedDocument>> {
    let mut docs = Vec::new();
    for de in serde_yaml::Deserializer::from_str(raw) {
        let body = Value::deserialize(de).map_err(|source| SnapError::Manifest { source })?;
        if body.is_null() {
            continue;
        }
        docs.push(RenderedDocument { body });
    }
    Ok(docs)
}

/// Serialize masked documents into the canonical comparison artifact.
///
/// The artifact is what gets persisted and diffed; raw renderer output
/// never is.
pub fn canonicalize(mut docs: Vec<RenderedDocument>) -> Result<String> {
    docs.sort_by(|a, b| {
        (a.kind(), a.name(), a.api_version()).cmp(&(b.kind(), b.name(), b.api_version()))
    });
    let mut parts = Vec::with_capacity(docs.len());
    for doc in &docs {
        let text = serde_yaml::to_string(&doc.body)
            .map_err(|source| SnapError::Manifest { source })?;
        parts.push(text);
    }
    Ok(parts.join("---\n"))
}
