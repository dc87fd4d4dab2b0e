//! The comparator: one test case, one verdict.
//!
//! Composes renderer -> parser -> masker -> codec -> diff into a single
//! `snap` operation. Mismatch never mutates the baseline; that is
//! reserved for update mode. A missing baseline is approved on first run,
//! never failed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::SnapshotConfig;
use crate::diff::diff;
use crate::errors::Result;
use crate::manifest::{canonicalize, parse_documents};
use crate::mask::mask;
use crate::render::{Renderer, TestCase};
use crate::snapshot::{self, SnapshotVersion};

/// Cooperative cancellation handle shared by all workers of a run.
///
/// Checked between pipeline stages only; an in-flight render is never
/// interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapOutcome {
    Matched,
    Mismatched { diff: String },
    /// The run was cancelled between stages (fail-fast mode).
    Cancelled,
}

/// Verdict for one test case, with the artifact that was produced and the
/// snapshot format version it was judged against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapResult {
    pub outcome: SnapOutcome,
    pub artifact: String,
    pub version: SnapshotVersion,
}

/// Everything needed to snap one test case.
pub struct ChartSnapshotter<'a> {
    pub renderer: &'a dyn Renderer,
    pub config: &'a SnapshotConfig,
    pub snapshot_file: PathBuf,
    /// Version used when writing. Reads auto-detect.
    pub snapshot_version: SnapshotVersion,
    pub diff_context_lines: usize,
    pub update_snapshot: bool,
    pub tool_version: String,
}

impl ChartSnapshotter<'_> {
    pub fn snap(&self, case: &TestCase, cancel: &CancelToken) -> Result<SnapResult> {
        let raw = self.renderer.render(case)?;
        if cancel.is_cancelled() {
            return Ok(self.cancelled(String::new()));
        }

        let docs = parse_documents(&raw)?;
        let artifact = canonicalize(mask(docs, self.config))?;
        if cancel.is_cancelled() {
            return Ok(self.cancelled(artifact));
        }

        if self.update_snapshot {
            self.write_baseline(&artifact)?;
            return Ok(SnapResult {
                outcome: SnapOutcome::Matched,
                artifact,
                version: self.snapshot_version,
            });
        }

        match snapshot::load(&self.snapshot_file)? {
            None => {
                // First run: approve and persist the baseline.
                self.write_baseline(&artifact)?;
                Ok(SnapResult {
                    outcome: SnapOutcome::Matched,
                    artifact,
                    version: self.snapshot_version,
                })
            }
            Some(baseline) => {
                let d = diff(&baseline.artifact, &artifact, self.diff_context_lines);
                let outcome = if d.is_match {
                    SnapOutcome::Matched
                } else {
                    SnapOutcome::Mismatched { diff: d.rendered }
                };
                Ok(SnapResult {
                    outcome,
                    artifact,
                    version: baseline.version,
                })
            }
        }
    }

    fn write_baseline(&self, artifact: &str) -> Result<()> {
        snapshot::save(
            &self.snapshot_file,
            artifact,
            self.snapshot_version,
            &self.tool_version,
        )
    }

    fn cancelled(&self, artifact: String) -> SnapResult {
        SnapResult {
            outcome: SnapOutcome::Cancelled,
            artifact,
            version: self.snapshot_version,
        }
    }
}
