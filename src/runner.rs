//! Test orchestrator.
//!
//! Discovers test cases from the values argument, runs each through the
//! comparator on a bounded pool of worker threads, and aggregates the
//! verdicts. Fail-fast mode flips a shared cancel token on the first
//! failure; best-effort mode always runs every case. The only shared
//! mutable resources are the cancel token, the results vector, and the
//! console, each behind its own synchronization.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use walkdir::WalkDir;

use crate::cli::output::{Console, Tag};
use crate::config::SnapshotConfig;
use crate::errors::{Result, SnapError};
use crate::render::{Renderer, TestCase};
use crate::snap::{CancelToken, ChartSnapshotter, SnapOutcome};
use crate::snapshot::{snapshot_file_path, SnapshotVersion};

/// Immutable run configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub chart: String,
    pub release_name: String,
    pub namespace: String,
    /// Empty = chart defaults; file = one case; directory = one case per
    /// `*.yaml` file in it.
    pub values_path: Option<PathBuf>,
    pub extra_args: Vec<String>,
    /// Config file name or path; the file name component is also looked
    /// up inside a values directory.
    pub config_file: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub snapshot_version: SnapshotVersion,
    pub diff_context_lines: usize,
    pub update_snapshot: bool,
    pub fail_fast: bool,
    /// Non-positive = one worker per case.
    pub parallelism: i64,
    pub debug: bool,
    pub tool_version: String,
}

impl RunOptions {
    /// Enumerated key/value listing for debug logging. Maintained by hand
    /// alongside the struct; no runtime introspection.
    pub fn debug_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("chart", self.chart.clone()),
            ("release_name", self.release_name.clone()),
            ("namespace", self.namespace.clone()),
            (
                "values_path",
                self.values_path
                    .as_deref()
                    .map_or_else(String::new, |p| p.display().to_string()),
            ),
            ("extra_args", format!("{:?}", self.extra_args)),
            ("config_file", self.config_file.display().to_string()),
            (
                "output_dir",
                self.output_dir
                    .as_deref()
                    .map_or_else(String::new, |p| p.display().to_string()),
            ),
            ("snapshot_version", self.snapshot_version.to_string()),
            ("diff_context_lines", self.diff_context_lines.to_string()),
            ("update_snapshot", self.update_snapshot.to_string()),
            ("fail_fast", self.fail_fast.to_string()),
            ("parallelism", self.parallelism.to_string()),
            ("debug", self.debug.to_string()),
        ]
    }

    fn worker_count(&self, cases: usize) -> usize {
        if self.debug {
            // Serial execution keeps interleaved diagnostics readable.
            return 1;
        }
        if self.parallelism <= 0 {
            return cases.max(1);
        }
        (self.parallelism as usize).min(cases.max(1))
    }
}

/// Final state of one test case.
#[derive(Debug)]
pub enum CaseOutcome {
    Matched,
    Mismatched { diff: String },
    Errored { error: SnapError },
    /// Never started or abandoned between stages after a fail-fast cancel.
    Cancelled,
}

#[derive(Debug)]
pub struct CaseReport {
    pub case: TestCase,
    pub outcome: CaseOutcome,
    pub version: SnapshotVersion,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<CaseReport>,
}

impl RunSummary {
    pub fn matched(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Matched))
    }

    pub fn mismatched(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Mismatched { .. }))
    }

    pub fn errored(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Errored { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Cancelled))
    }

    /// Overall failure: any mismatch or error.
    pub fn failed(&self) -> bool {
        self.mismatched() > 0 || self.errored() > 0
    }

    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Test cases plus the mask config they run under.
#[derive(Debug)]
pub struct DiscoveredCases {
    pub cases: Vec<TestCase>,
    pub config: SnapshotConfig,
}

/// Enumerate test cases and resolve the effective mask config.
///
/// The chart-root config (`--config-file`) loads first; a config found
/// inside a values directory merges after it, so directory-local rules
/// take precedence. The config file itself never becomes a test case.
pub fn discover(options: &RunOptions) -> Result<DiscoveredCases> {
    let mut config = SnapshotConfig::from_file(&options.config_file)?.unwrap_or_default();
    let config_name = options
        .config_file
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".chartsnap.yaml"));

    let mut values: Vec<Option<PathBuf>> = Vec::new();
    match &options.values_path {
        None => values.push(None),
        Some(path) => {
            let meta = std::fs::metadata(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SnapError::ValuesNotFound(path.clone())
                } else {
                    SnapError::io(format!("stat {}", path.display()), e)
                }
            })?;
            if meta.is_dir() {
                let local_config = path.join(&config_name);
                if let Some(local) = SnapshotConfig::from_file(&local_config)? {
                    log::debug!("merging values-directory config {}", local_config.display());
                    config.merge(local);
                }
                values.extend(collect_values_files(path, &config_name));
            } else {
                // A single values file may still have a sibling config.
                if let Some(dir) = path.parent() {
                    if let Some(local) = SnapshotConfig::from_file(&dir.join(&config_name))? {
                        config.merge(local);
                    }
                }
                values.push(Some(path.clone()));
            }
        }
    }

    let cases = values
        .into_iter()
        .map(|values_file| TestCase {
            chart: options.chart.clone(),
            release_name: options.release_name.clone(),
            namespace: options.namespace.clone(),
            values_file,
            extra_args: options.extra_args.clone(),
        })
        .collect();
    Ok(DiscoveredCases { cases, config })
}

/// Flat listing of `*.yaml` test values files, config excluded, sorted
/// for deterministic case ordering.
fn collect_values_files(dir: &Path, config_name: &Path) -> Vec<Option<PathBuf>> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            p.extension().map_or(false, |ext| ext == "yaml")
                && p.file_name().map_or(false, |n| n != config_name.as_os_str())
        })
        .collect();
    files.sort();
    files.into_iter().map(Some).collect()
}

/// Runs discovered cases on a bounded worker pool.
pub struct TestRunner<'a> {
    pub options: &'a RunOptions,
    pub renderer: &'a dyn Renderer,
    pub console: &'a Console,
}

impl TestRunner<'_> {
    pub fn run(&self, discovered: DiscoveredCases) -> RunSummary {
        let DiscoveredCases { cases, config } = discovered;
        let workers = self.options.worker_count(cases.len());
        let cancel = CancelToken::new();
        let next = AtomicUsize::new(0);
        let reports: Mutex<Vec<CaseReport>> = Mutex::new(Vec::with_capacity(cases.len()));

        for case in &cases {
            self.console.banner(
                Tag::Runs,
                &format!(
                    "Snapshot testing chart={} values={}",
                    case.chart,
                    case.values_label()
                ),
            );
        }

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(case) = cases.get(i) else { break };
                        let report = self.run_case(case, &config, &cancel);
                        reports.lock().push(report);
                    }
                });
            }
        });

        let mut reports = reports.into_inner();
        // Completion order is nondeterministic; report in case order.
        reports.sort_by_key(|r| {
            cases
                .iter()
                .position(|c| c == &r.case)
                .unwrap_or(usize::MAX)
        });
        RunSummary { reports }
    }

    fn run_case(
        &self,
        case: &TestCase,
        config: &SnapshotConfig,
        cancel: &CancelToken,
    ) -> CaseReport {
        let version = self.options.snapshot_version;
        if self.options.fail_fast && cancel.is_cancelled() {
            self.report_cancelled(case);
            return CaseReport {
                case: case.clone(),
                outcome: CaseOutcome::Cancelled,
                version,
            };
        }

        let snapshotter = ChartSnapshotter {
            renderer: self.renderer,
            config,
            snapshot_file: snapshot_file_path(
                self.options.output_dir.as_deref(),
                &case.chart,
                case.values_file.as_deref(),
            ),
            snapshot_version: version,
            diff_context_lines: self.options.diff_context_lines,
            update_snapshot: self.options.update_snapshot,
            tool_version: self.options.tool_version.clone(),
        };

        let fail_fast_cancel = if self.options.fail_fast {
            cancel.clone()
        } else {
            // Best-effort mode never cancels; hand the comparator a token
            // nobody flips.
            CancelToken::new()
        };

        let (outcome, version) = match snapshotter.snap(case, &fail_fast_cancel) {
            Ok(result) => {
                let outcome = match result.outcome {
                    SnapOutcome::Matched => {
                        self.console.banner(
                            Tag::Pass,
                            &format!(
                                "Snapshot {} chart={} values={} snapshot_version={}",
                                if self.options.update_snapshot { "updated" } else { "matched" },
                                case.chart,
                                case.values_label(),
                                result.version
                            ),
                        );
                        CaseOutcome::Matched
                    }
                    SnapOutcome::Mismatched { diff } => {
                        self.console.banner_with_block(
                            Tag::Fail,
                            &format!(
                                "Snapshot does not match chart={} values={} snapshot_version={}",
                                case.chart,
                                case.values_label(),
                                result.version
                            ),
                            &diff,
                        );
                        if self.options.fail_fast {
                            cancel.cancel();
                        }
                        CaseOutcome::Mismatched { diff }
                    }
                    SnapOutcome::Cancelled => {
                        self.report_cancelled(case);
                        CaseOutcome::Cancelled
                    }
                };
                (outcome, result.version)
            }
            Err(error) => {
                self.console.banner(
                    Tag::Fail,
                    &format!(
                        "chart={} values={} snapshot_version={} err={}",
                        case.chart,
                        case.values_label(),
                        version,
                        error
                    ),
                );
                if self.options.fail_fast {
                    cancel.cancel();
                }
                (CaseOutcome::Errored { error }, version)
            }
        };

        CaseReport {
            case: case.clone(),
            outcome,
            version,
        }
    }

    fn report_cancelled(&self, case: &TestCase) {
        self.console.banner(
            Tag::Skip,
            &format!(
                "Cancelled after earlier failure chart={} values={}",
                case.chart,
                case.values_label()
            ),
        );
    }
}
