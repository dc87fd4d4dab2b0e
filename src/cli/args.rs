//! Command-line arguments for chartsnap.
//!
//! Flag-style surface (no subcommands) using `clap` derive. Arguments
//! after `--` are passed through to `helm template` verbatim. A few
//! options also have environment fallbacks resolved in
//! [`crate::cli::resolve_options`]: explicit flag > environment > default.

use std::path::PathBuf;

use clap::Parser;

const LONG_ABOUT: &str = "\
Snapshot testing tool like Jest for Helm charts.

Create test cases as variations of values files for your chart; a
`__snapshot__` directory is created next to the test values files.

Nondeterministic output (Helm functions like `randAlphaNum`) is masked
through a `.chartsnap.yaml` config listing JSONPath pointers per
document:

  dynamicFields:
    - apiVersion: v1
      kind: Secret
      name: my-secret
      jsonPath:
        - /data/TOKEN
";

const EXAMPLES: &str = "\
  # Snapshot with default values:
  chartsnap -c YOUR_CHART

  # Update snapshot files:
  chartsnap -c YOUR_CHART -u

  # Snapshot all test cases in a directory:
  chartsnap -c YOUR_CHART -f YOUR_TEST_VALUES_DIRECTORY

  # Pass additional flags to 'helm template':
  chartsnap -c YOUR_CHART -f VALUES_FILE -- --skip-tests

  # Output with no colors:
  NO_COLOR=1 chartsnap -c YOUR_CHART";

#[derive(Debug, Parser)]
#[command(
    name = "chartsnap",
    version,
    about = "Snapshot testing tool for Helm charts",
    long_about = LONG_ABOUT,
    after_help = EXAMPLES
)]
pub struct ChartsnapArgs {
    /// Path to the chart directory (or chart reference), passed to
    /// 'helm template RELEASE_NAME CHART' as CHART.
    #[arg(short, long, required = true)]
    pub chart: String,

    /// Release name passed to 'helm template'.
    #[arg(long, default_value = "chartsnap")]
    pub release_name: String,

    /// Namespace. Falls back to HELM_NAMESPACE, then "default".
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Path to a test values file or directory. A directory runs every
    /// *.yaml file as its own test case; empty means chart defaults.
    #[arg(short = 'f', long)]
    pub values: Option<PathBuf>,

    /// Update snapshot mode: overwrite baselines unconditionally.
    #[arg(short, long)]
    pub update_snapshot: bool,

    /// Directory in which the __snapshot__ directory is created.
    /// (default: values file directory if --values is set; chart
    /// directory if the chart is local; else the current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of unchanged lines to show around each diff change.
    /// 0 shows full output.
    #[arg(short = 'N', long = "ctx-lines", default_value_t = 3)]
    pub ctx_lines: usize,

    /// Fail once any test case fails, cancelling the remaining cases.
    #[arg(long)]
    pub failfast: bool,

    /// Test concurrency when snapshotting a values directory.
    /// Non-positive means unlimited.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub parallelism: i64,

    /// Config file name or path defining snapshot behavior
    /// (e.g. dynamic fields).
    #[arg(long, default_value = ".chartsnap.yaml")]
    pub config_file: PathBuf,

    /// Use the toml-based legacy snapshot format (same as
    /// --snapshot-version v1).
    #[arg(long)]
    pub legacy_snapshot: bool,

    /// Snapshot format version to write: v1, v2 or v3.
    /// (default: latest)
    #[arg(long)]
    pub snapshot_version: Option<String>,

    /// Debug mode: verbose logging, serial test execution.
    /// Falls back to HELM_DEBUG.
    #[arg(long)]
    pub debug: bool,

    /// Additional arguments passed through to 'helm template'.
    #[arg(last = true)]
    pub helm_args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_surface() {
        let args = ChartsnapArgs::parse_from([
            "chartsnap",
            "-c",
            "./mychart",
            "-f",
            "testdata/values",
            "-u",
            "--failfast",
            "--parallelism",
            "4",
            "-N",
            "0",
            "--snapshot-version",
            "v2",
            "--",
            "--skip-tests",
        ]);
        assert_eq!(args.chart, "./mychart");
        assert!(args.update_snapshot);
        assert!(args.failfast);
        assert_eq!(args.parallelism, 4);
        assert_eq!(args.ctx_lines, 0);
        assert_eq!(args.snapshot_version.as_deref(), Some("v2"));
        assert_eq!(args.helm_args, vec!["--skip-tests"]);
    }

    #[test]
    fn chart_is_required() {
        let res = ChartsnapArgs::try_parse_from(["chartsnap"]);
        assert!(res.is_err());
    }

    #[test]
    fn defaults_match_documented_behavior() {
        let args = ChartsnapArgs::parse_from(["chartsnap", "-c", "x"]);
        assert_eq!(args.release_name, "chartsnap");
        assert_eq!(args.ctx_lines, 3);
        assert_eq!(args.parallelism, -1);
        assert_eq!(args.config_file, PathBuf::from(".chartsnap.yaml"));
        assert!(args.namespace.is_none());
    }
}
