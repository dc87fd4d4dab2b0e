//! Full-pipeline tests over the library API with a stub renderer:
//! discovery, masking, baseline creation and comparison, config
//! precedence.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use chartsnap::cli::output::Console;
use chartsnap::mask::DYNAMIC_FIELD_PLACEHOLDER;
use chartsnap::render::{Renderer, TestCase};
use chartsnap::runner::{discover, CaseOutcome, RunOptions, TestRunner};
use chartsnap::snapshot::SnapshotVersion;
use chartsnap::Result;

struct StubRenderer(&'static str);

impl Renderer for StubRenderer {
    fn render(&self, _case: &TestCase) -> Result<String> {
        Ok(self.0.to_owned())
    }
}

fn options(dir: &Path) -> RunOptions {
    RunOptions {
        chart: "mychart".into(),
        release_name: "chartsnap".into(),
        namespace: "default".into(),
        values_path: Some(dir.to_path_buf()),
        extra_args: vec![],
        config_file: PathBuf::from(".chartsnap.yaml"),
        output_dir: Some(dir.join("out")),
        snapshot_version: SnapshotVersion::V3,
        diff_context_lines: 3,
        update_snapshot: false,
        fail_fast: false,
        parallelism: -1,
        debug: false,
        tool_version: "0.1.0".into(),
    }
}

fn run(opts: &RunOptions, renderer: &dyn Renderer) -> chartsnap::runner::RunSummary {
    let console = Console::null();
    let runner = TestRunner {
        options: opts,
        renderer,
        console: &console,
    };
    runner.run(discover(opts).unwrap())
}

#[test]
fn masks_named_secret_but_not_its_sibling() {
    let dir = common::scratch_dir("concrete-mask");
    common::write_values(&dir, "case.yaml", "x: 1\n");
    common::write_config(
        &dir,
        "\
dynamicFields:
  - apiVersion: v1
    kind: Secret
    name: my-secret
    jsonPath:
      - /data/TOKEN
",
    );
    let opts = options(&dir);
    let renderer = StubRenderer(common::SECRET_AND_CONFIGMAP);

    let summary = run(&opts, &renderer);
    assert!(!summary.failed());

    let snap = fs::read_to_string(dir.join("out/__snapshot__/case.snap")).unwrap();
    assert!(snap.contains(DYNAMIC_FIELD_PLACEHOLDER));
    // The rule names my-secret only; other-secret keeps its value.
    assert!(snap.contains("keepme"));
    assert!(!snap.contains("abc123"));
    fs::remove_dir_all(dir).ok();
}

#[test]
fn directory_config_merges_after_root_config() {
    let dir = common::scratch_dir("config-precedence");
    let root = common::scratch_dir("config-precedence-root");
    let root_config = root.join("root-chartsnap.yaml");
    fs::write(
        &root_config,
        "\
dynamicFields:
  - apiVersion: v1
    kind: ConfigMap
    name: my-config
    jsonPath:
      - /data/key
",
    )
    .unwrap();
    common::write_values(&dir, "case.yaml", "x: 1\n");
    // Directory-local config must also apply, with its rules appended
    // after the root ones. Its file name follows --config-file.
    fs::write(
        dir.join("root-chartsnap.yaml"),
        "\
dynamicFields:
  - apiVersion: v1
    kind: Secret
    jsonPath:
      - /data/TOKEN
",
    )
    .unwrap();

    let mut opts = options(&dir);
    opts.config_file = root_config;
    let renderer = StubRenderer(common::SECRET_AND_CONFIGMAP);
    let summary = run(&opts, &renderer);
    assert!(!summary.failed());

    let snap = fs::read_to_string(dir.join("out/__snapshot__/case.snap")).unwrap();
    // Root rule masked the ConfigMap value, local rule masked both secrets.
    assert!(!snap.contains("value"));
    assert!(!snap.contains("abc123"));
    assert!(!snap.contains("keepme"));
    fs::remove_dir_all(dir).ok();
    fs::remove_dir_all(root).ok();
}

#[test]
fn rerun_matches_and_drift_mismatches() {
    let dir = common::scratch_dir("drift");
    common::write_values(&dir, "case.yaml", "x: 1\n");
    let opts = options(&dir);

    let stable = StubRenderer(common::SECRET_AND_CONFIGMAP);
    assert!(!run(&opts, &stable).failed()); // first run baselines
    assert!(!run(&opts, &stable).failed()); // second run matches

    let drifted = StubRenderer(
        "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: my-config
data:
  key: CHANGED
",
    );
    let summary = run(&opts, &drifted);
    assert!(summary.failed());
    let report = &summary.reports[0];
    match &report.outcome {
        CaseOutcome::Mismatched { diff } => {
            assert!(diff.contains("+ "));
            assert!(diff.contains("- "));
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    fs::remove_dir_all(dir).ok();
}

#[test]
fn update_mode_rewrites_a_drifted_baseline() {
    let dir = common::scratch_dir("update-mode");
    common::write_values(&dir, "case.yaml", "x: 1\n");
    let opts = options(&dir);

    let stable = StubRenderer(common::SECRET_AND_CONFIGMAP);
    assert!(!run(&opts, &stable).failed());

    let drifted = StubRenderer(
        "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: my-config
data:
  key: CHANGED
",
    );
    let mut update_opts = options(&dir);
    update_opts.update_snapshot = true;
    assert!(!run(&update_opts, &drifted).failed());

    // The refreshed baseline now matches the drifted output.
    assert!(!run(&opts, &drifted).failed());
    fs::remove_dir_all(dir).ok();
}

#[test]
fn old_v2_baseline_still_validates_and_reports_v2() {
    let dir = common::scratch_dir("migration");
    common::write_values(&dir, "case.yaml", "x: 1\n");
    let opts = options(&dir);
    let renderer = StubRenderer(common::SECRET_AND_CONFIGMAP);

    // Baseline once, then rewrite the file as a headerless v2 snapshot
    // the way an older tool version stored it.
    assert!(!run(&opts, &renderer).failed());
    let snap_path = dir.join("out/__snapshot__/case.snap");
    let stored = chartsnap::snapshot::load(&snap_path).unwrap().unwrap();
    fs::write(&snap_path, &stored.artifact).unwrap();

    let summary = run(&opts, &renderer);
    assert!(!summary.failed());
    assert_eq!(summary.reports[0].version, SnapshotVersion::V2);
    fs::remove_dir_all(dir).ok();
}
