//! External renderer boundary.
//!
//! Chartsnap treats the templating engine as a black box behind the
//! [`Renderer`] trait: one invocation per test case, raw multi-document
//! YAML out, or an error. The production implementation shells out to
//! `helm template`; tests substitute stubs.

use std::path::PathBuf;
use std::process::Command;

use crate::errors::{Result, SnapError};

/// One comparison unit: chart + values input. Independent of every other
/// case and carries its own snapshot identity (see
/// [`crate::snapshot::snapshot_file_path`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub chart: String,
    pub release_name: String,
    pub namespace: String,
    /// `None` means chart default values.
    pub values_file: Option<PathBuf>,
    /// Extra arguments passed through to the renderer verbatim.
    pub extra_args: Vec<String>,
}

impl TestCase {
    /// Label used in banners and error messages.
    pub fn values_label(&self) -> String {
        self.values_file
            .as_ref()
            .map_or_else(String::new, |p| p.display().to_string())
    }
}

/// Renders one test case into raw manifest text.
pub trait Renderer: Sync {
    fn render(&self, case: &TestCase) -> Result<String>;
}

/// `helm template` invoker.
#[derive(Debug, Clone)]
pub struct HelmCli {
    /// Resolved from `HELM_BIN` when running as a helm plugin.
    pub helm_bin: String,
}

impl HelmCli {
    pub fn command_args(case: &TestCase) -> Vec<String> {
        let mut args = vec![
            "template".to_owned(),
            case.release_name.clone(),
            case.chart.clone(),
            "--namespace".to_owned(),
            case.namespace.clone(),
        ];
        if let Some(values) = &case.values_file {
            args.push("--values".to_owned());
            args.push(values.display().to_string());
        }
        args.extend(case.extra_args.iter().cloned());
        args
    }
}

impl Renderer for HelmCli {
    fn render(&self, case: &TestCase) -> Result<String> {
        let args = Self::command_args(case);
        log::debug!("exec: {} {}", self.helm_bin, args.join(" "));
        let output = Command::new(&self.helm_bin)
            .args(&args)
            .output()
            .map_err(|e| SnapError::Render {
                chart: case.chart.clone(),
                values: case.values_label(),
                detail: format!("failed to run {}: {e}", self.helm_bin),
            })?;
        if !output.status.success() {
            return Err(SnapError::Render {
                chart: case.chart.clone(),
                values: case.values_label(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| SnapError::Render {
            chart: case.chart.clone(),
            values: case.values_label(),
            detail: "renderer produced non-UTF-8 output".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_args_include_values_and_passthrough() {
        let case = TestCase {
            chart: "./mychart".into(),
            release_name: "chartsnap".into(),
            namespace: "kube-system".into(),
            values_file: Some(PathBuf::from("testdata/values/a.yaml")),
            extra_args: vec!["--skip-tests".into(), "--set".into(), "x=1".into()],
        };
        let args = HelmCli::command_args(&case);
        assert_eq!(
            args,
            vec![
                "template",
                "chartsnap",
                "./mychart",
                "--namespace",
                "kube-system",
                "--values",
                "testdata/values/a.yaml",
                "--skip-tests",
                "--set",
                "x=1",
            ]
        );
    }

    #[test]
    fn default_values_case_omits_values_flag() {
        let case = TestCase {
            chart: "mychart".into(),
            release_name: "chartsnap".into(),
            namespace: "default".into(),
            values_file: None,
            extra_args: vec![],
        };
        let args = HelmCli::command_args(&case);
        assert!(!args.contains(&"--values".to_owned()));
    }
}
