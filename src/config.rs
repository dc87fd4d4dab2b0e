//! Masking-rule configuration (`.chartsnap.yaml`).
//!
//! The config declares which fields of the rendered manifests are
//! nondeterministic (Helm's `randAlphaNum` and friends) so the masker can
//! replace them with a fixed placeholder before comparison:
//!
//! ```yaml
//! dynamicFields:
//!   - apiVersion: v1
//!     kind: Secret
//!     name: my-secret
//!     jsonPath:
//!       - /data/TOKEN
//! ```
//!
//! A config file may live at the chart root and/or inside a test values
//! directory; the directory-local one is merged last so its rules win on
//! overlapping paths.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SnapError};

/// One masking rule: a document selector plus the pointers to neutralize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicField {
    pub api_version: String,
    pub kind: String,
    /// Empty matches any document name.
    #[serde(default)]
    pub name: String,
    /// Slash-delimited pointers (RFC 6901) into the document tree.
    #[serde(default)]
    pub json_path: Vec<String>,
}

impl DynamicField {
    /// Whether this rule selects a document with the given identity.
    pub fn matches(&self, api_version: &str, kind: &str, name: &str) -> bool {
        self.api_version == api_version
            && self.kind == kind
            && (self.name.is_empty() || self.name == name)
    }
}

/// Ordered rule collection parsed from `.chartsnap.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotConfig {
    #[serde(default)]
    pub dynamic_fields: Vec<DynamicField>,
}

impl SnapshotConfig {
    /// Load a config file, tolerating absence.
    ///
    /// Returns `Ok(None)` when the file does not exist; a present but
    /// malformed file is a [`SnapError::Config`].
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SnapError::io(format!("read {}", path.display()), e)),
        };
        let cfg: Self = serde_yaml::from_str(&raw).map_err(|source| SnapError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        for rule in &cfg.dynamic_fields {
            if rule.json_path.is_empty() {
                log::warn!(
                    "ignoring dynamicFields rule without jsonPath: apiVersion={} kind={} name={}",
                    rule.api_version,
                    rule.kind,
                    rule.name
                );
            }
        }
        Ok(Some(cfg))
    }

    /// Append another config's rules after this one's.
    ///
    /// Rules apply in order with last-write-wins on a shared path, so the
    /// merged-in (directory-local) config takes precedence.
    pub fn merge(&mut self, other: Self) {
        self.dynamic_fields.extend(other.dynamic_fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = "\
dynamicFields:
  - apiVersion: v1
    kind: Secret
    name: my-secret
    jsonPath:
      - /data/TOKEN
      - /data/COOKIE
  - apiVersion: apps/v1
    kind: Deployment
    jsonPath:
      - /spec/template/metadata/annotations/checksum~1config
";

    #[test]
    fn parses_dynamic_fields() {
        let cfg: SnapshotConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.dynamic_fields.len(), 2);
        assert_eq!(cfg.dynamic_fields[0].name, "my-secret");
        assert_eq!(cfg.dynamic_fields[0].json_path.len(), 2);
        // name omitted -> empty -> matches any
        assert_eq!(cfg.dynamic_fields[1].name, "");
    }

    #[test]
    fn selector_matching() {
        let rule = DynamicField {
            api_version: "v1".into(),
            kind: "Secret".into(),
            name: String::new(),
            json_path: vec!["/data/TOKEN".into()],
        };
        assert!(rule.matches("v1", "Secret", "anything"));
        assert!(!rule.matches("v1", "ConfigMap", "anything"));
    }

    #[test]
    fn missing_file_is_none() {
        let got = SnapshotConfig::from_file(&PathBuf::from("/nonexistent/.chartsnap.yaml"));
        assert!(matches!(got, Ok(None)));
    }

    #[test]
    fn merge_appends_local_rules_last() {
        let mut root: SnapshotConfig = serde_yaml::from_str(SAMPLE).unwrap();
        let local = SnapshotConfig {
            dynamic_fields: vec![DynamicField {
                api_version: "v1".into(),
                kind: "Secret".into(),
                name: "my-secret".into(),
                json_path: vec!["/data/EXTRA".into()],
            }],
        };
        root.merge(local);
        assert_eq!(root.dynamic_fields.len(), 3);
        assert_eq!(root.dynamic_fields[2].json_path[0], "/data/EXTRA");
    }
}
