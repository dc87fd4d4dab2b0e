//! The chartsnap command-line interface.
//!
//! Parses arguments, resolves the layered configuration (explicit flag >
//! environment > default) into one immutable [`RunOptions`], and maps the
//! aggregate result to a process exit code: 0 only when every test case
//! matched (or was freshly baselined / updated).

use std::str::FromStr;

use clap::Parser;

use crate::cli::args::ChartsnapArgs;
use crate::cli::output::{Console, Tag};
use crate::errors::{Result, SnapError};
use crate::render::HelmCli;
use crate::runner::{discover, RunOptions, TestRunner};
use crate::snapshot::{SnapshotVersion, LATEST_VERSION};

pub mod args;
pub mod output;

/// The main entry point. Returns the process exit code.
pub fn run() -> i32 {
    let args = ChartsnapArgs::parse();
    let (options, helm_bin) = match resolve_options(&args) {
        Ok(resolved) => resolved,
        Err(e) => return fatal(e),
    };
    output::init_logging(options.debug);

    for (key, value) in options.debug_entries() {
        log::debug!("option {key}={value}");
    }
    for (key, value) in std::env::vars() {
        if key.starts_with("HELM_") {
            log::debug!("helm env {key}={value}");
        }
    }

    let console = Console::stdout();
    match execute(&options, &helm_bin, &console) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => fatal(e),
    }
}

/// Resolve CLI args and environment into immutable run options plus the
/// helm binary to invoke. Called once; nothing downstream reads the
/// environment again.
pub fn resolve_options(args: &ChartsnapArgs) -> Result<(RunOptions, String)> {
    let namespace = args
        .namespace
        .clone()
        .or_else(|| env_nonempty("HELM_NAMESPACE"))
        .unwrap_or_else(|| "default".to_owned());
    let debug = args.debug || env_bool("HELM_DEBUG");
    let helm_bin = env_nonempty("HELM_BIN").unwrap_or_else(|| "helm".to_owned());

    let snapshot_version = if args.legacy_snapshot {
        SnapshotVersion::V1
    } else {
        match &args.snapshot_version {
            Some(raw) => SnapshotVersion::from_str(raw)?,
            None => LATEST_VERSION,
        }
    };

    let options = RunOptions {
        chart: args.chart.clone(),
        release_name: args.release_name.clone(),
        namespace,
        values_path: args.values.clone(),
        extra_args: args.helm_args.clone(),
        config_file: args.config_file.clone(),
        output_dir: args.output_dir.clone(),
        snapshot_version,
        diff_context_lines: args.ctx_lines,
        update_snapshot: args.update_snapshot,
        fail_fast: args.failfast,
        parallelism: args.parallelism,
        debug,
        tool_version: env!("CARGO_PKG_VERSION").to_owned(),
    };
    Ok((options, helm_bin))
}

/// Run the whole suite. `Ok(true)` means every case passed.
fn execute(options: &RunOptions, helm_bin: &str, console: &Console) -> Result<bool> {
    let discovered = discover(options)?;
    let renderer = HelmCli {
        helm_bin: helm_bin.to_owned(),
    };
    let runner = TestRunner {
        options,
        renderer: &renderer,
        console,
    };
    let summary = runner.run(discovered);

    let verb = if options.update_snapshot { "updated" } else { "matched" };
    if summary.failed() {
        console.banner(
            Tag::Fail,
            &format!(
                "{} of {} snapshots failed ({} mismatched, {} errored)",
                summary.mismatched() + summary.errored(),
                summary.reports.len(),
                summary.mismatched(),
                summary.errored()
            ),
        );
        Ok(false)
    } else {
        console.banner(Tag::Pass, &format!("All snapshots {verb}"));
        Ok(true)
    }
}

fn fatal(error: SnapError) -> i32 {
    eprintln!("{:?}", miette::Report::new(error));
    1
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}
