//! Chartsnap error handling.
//!
//! One public error type covers the whole pipeline. The taxonomy matters
//! for reporting: a malformed config or an unreadable snapshot is fatal to
//! its test case, while a snapshot *mismatch* is an ordinary outcome and
//! never surfaces as an error (see [`crate::runner::CaseOutcome`]).

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapError>;

#[derive(Debug, Error, Diagnostic)]
pub enum SnapError {
    /// The masking config file exists but cannot be parsed. Absence of the
    /// file is not an error and is handled before this is constructed.
    #[error("failed to load snapshot config {}: {source}", path.display())]
    #[diagnostic(
        code(chartsnap::config::parse),
        help("check the `dynamicFields` entries in the config file")
    )]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The external renderer exited non-zero or could not be spawned.
    #[error("helm template failed for chart={chart} values={values}: {detail}")]
    #[diagnostic(code(chartsnap::render::failed))]
    Render {
        chart: String,
        values: String,
        detail: String,
    },

    /// Rendered output is not a parsable multi-document YAML stream.
    #[error("failed to parse rendered manifest stream: {source}")]
    #[diagnostic(code(chartsnap::manifest::parse))]
    Manifest {
        #[source]
        source: serde_yaml::Error,
    },

    /// An existing snapshot file matches no known format. Distinct from
    /// file absence, which means "no baseline yet".
    #[error("snapshot file {} is not readable in any supported format", path.display())]
    #[diagnostic(
        code(chartsnap::snapshot::corrupt),
        help("delete the file or re-create it with --update-snapshot")
    )]
    SnapshotCorrupt { path: PathBuf },

    /// Snapshot text could not be serialized into the requested format.
    #[error("failed to encode snapshot as {version}: {detail}")]
    #[diagnostic(code(chartsnap::snapshot::encode))]
    SnapshotEncode { version: String, detail: String },

    #[error("unknown snapshot version {0:?} (supported: v1, v2, v3)")]
    #[diagnostic(code(chartsnap::snapshot::version))]
    UnknownSnapshotVersion(String),

    #[error("values file '{}' not found", .0.display())]
    #[diagnostic(code(chartsnap::values::not_found))]
    ValuesNotFound(PathBuf),

    #[error("{context}: {source}")]
    #[diagnostic(code(chartsnap::io))]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl SnapError {
    /// Wrap an I/O error with the path or action it concerns.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
