//! Dynamic field masker.
//!
//! Replaces the values Helm generates nondeterministically (random
//! passwords, checksums, timestamps) with a fixed sentinel before the
//! artifact is persisted or compared. Pure: takes documents, returns
//! documents, no I/O.
//!
//! Pointers use RFC 6901 syntax: slash-delimited segments with `~1` for
//! `/` and `~0` for `~`. A segment that parses as an unsigned integer
//! indexes into a sequence. Pointers that do not resolve are silently
//! inert, as are rules that match no document: one config is commonly
//! shared across a chart family whose variants render different subsets.

use serde_yaml::Value;

use crate::config::SnapshotConfig;
use crate::manifest::RenderedDocument;

/// Sentinel written over masked values; distinguishable from real data.
pub const DYNAMIC_FIELD_PLACEHOLDER: &str = "###DYNAMIC_FIELD###";

/// Apply all matching rules to all documents.
///
/// Rules apply in config order; when two rules hit the same path the last
/// write wins (both write the same placeholder, so the outcome is the
/// placeholder either way). Applying the config twice is a no-op after
/// the first pass.
pub fn mask(mut docs: Vec<RenderedDocument>, config: &SnapshotConfig) -> Vec<RenderedDocument> {
    for doc in &mut docs {
        let (api_version, kind, name) = (
            doc.api_version().to_owned(),
            doc.kind().to_owned(),
            doc.name().to_owned(),
        );
        for rule in &config.dynamic_fields {
            if rule.json_path.is_empty() || !rule.matches(&api_version, &kind, &name) {
                continue;
            }
            for pointer in &rule.json_path {
                mask_pointer(&mut doc.body, pointer);
            }
        }
    }
    docs
}

/// Overwrite the value at `pointer` with the placeholder, if it resolves.
fn mask_pointer(body: &mut Value, pointer: &str) {
    if let Some(slot) = resolve_mut(body, pointer) {
        *slot = Value::String(DYNAMIC_FIELD_PLACEHOLDER.to_owned());
    }
}

/// Walk a slash-delimited pointer to a mutable slot in the value tree.
fn resolve_mut<'a>(root: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    let rest = pointer.strip_prefix('/')?;
    let mut current = root;
    if rest.is_empty() {
        return None;
    }
    for segment in rest.split('/') {
        let key = unescape(segment);
        current = match current {
            Value::Mapping(map) => map.get_mut(&Value::String(key))?,
            Value::Sequence(seq) => {
                let idx: usize = key.parse().ok()?;
                seq.get_mut(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
