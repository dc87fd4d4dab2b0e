//! Versioned snapshot persistence.
//!
//! Three on-disk formats are supported so old baselines keep validating
//! under newer tool versions:
//!
//! - **v3** (latest): a one-line header
//!   `# chartsnap: snapshot_version=v3 chartsnap_version=…` followed by
//!   the raw artifact.
//! - **v2**: the bare artifact text, no header.
//! - **v1** (legacy): a TOML document with a `[chartsnap]` table holding
//!   the artifact in a `SnapShot` key.
//!
//! `load` auto-detects the version; callers never declare it. Detection
//! probes the v3 header, then the v1 TOML structure, and falls back to v2
//! — v2 is structureless, so probing it any earlier would swallow every
//! legacy file. A baseline that is not readable UTF-8 is corrupt, which
//! is a distinct condition from "no baseline yet" (file absent).
//!
//! Writes are atomic (temp file in the target directory, then rename) so
//! an interrupt can never leave a half-written baseline.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SnapError};

/// Directory created next to the test values files to hold baselines.
pub const SNAPSHOT_DIR_NAME: &str = "__snapshot__";

const V3_HEADER_PREFIX: &str = "# chartsnap:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotVersion {
    V1,
    V2,
    V3,
}

/// Version written when none is configured.
pub const LATEST_VERSION: SnapshotVersion = SnapshotVersion::V3;

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        };
        f.write_str(s)
    }
}

impl FromStr for SnapshotVersion {
    type Err = SnapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            "v3" => Ok(Self::V3),
            other => Err(SnapError::UnknownSnapshotVersion(other.to_owned())),
        }
    }
}

/// A persisted baseline: the canonical artifact plus the format it was
/// stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub artifact: String,
    pub version: SnapshotVersion,
}

/// Legacy v1 file shape. Field casing is fixed by the old format.
#[derive(Debug, Serialize, Deserialize)]
struct LegacyFile {
    chartsnap: LegacyEntry,
}

#[derive(Debug, Serialize, Deserialize)]
struct LegacyEntry {
    #[serde(rename = "SnapShot")]
    snapshot: String,
}

/// Decode snapshot file content, detecting its format version.
pub fn decode(text: &str) -> Snapshot {
    if let Some(first_line) = text.lines().next() {
        if first_line.starts_with(V3_HEADER_PREFIX)
            && first_line.contains("snapshot_version=v3")
        {
            let body = match text.split_once('\n') {
                Some((_, rest)) => rest,
                None => "",
            };
            return Snapshot {
                artifact: body.to_owned(),
                version: SnapshotVersion::V3,
            };
        }
    }
    if let Ok(legacy) = toml::from_str::<LegacyFile>(text) {
        return Snapshot {
            artifact: legacy.chartsnap.snapshot,
            version: SnapshotVersion::V1,
        };
    }
    Snapshot {
        artifact: text.to_owned(),
        version: SnapshotVersion::V2,
    }
}

/// Encode an artifact in the requested format. `tool_version` lands in
/// the v3 header so a baseline records what produced it.
pub fn encode(artifact: &str, version: SnapshotVersion, tool_version: &str) -> Result<String> {
    match version {
        SnapshotVersion::V1 => {
            let file = LegacyFile {
                chartsnap: LegacyEntry {
                    snapshot: artifact.to_owned(),
                },
            };
            toml::to_string(&file).map_err(|e| SnapError::SnapshotEncode {
                version: version.to_string(),
                detail: e.to_string(),
            })
        }
        SnapshotVersion::V2 => Ok(artifact.to_owned()),
        SnapshotVersion::V3 => Ok(format!(
            "{V3_HEADER_PREFIX} snapshot_version=v3 chartsnap_version={tool_version}\n{artifact}"
        )),
    }
}

/// Read and decode a baseline. `Ok(None)` means no baseline exists yet.
pub fn load(path: &Path) -> Result<Option<Snapshot>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SnapError::io(format!("read snapshot {}", path.display()), e)),
    };
    let text = String::from_utf8(bytes).map_err(|_| SnapError::SnapshotCorrupt {
        path: path.to_path_buf(),
    })?;
    Ok(Some(decode(&text)))
}

/// Encode and atomically write a baseline, creating `__snapshot__` as
/// needed. Concurrent test cases never share a snapshot path, so the
/// temp-then-rename is the only coordination required.
pub fn save(
    path: &Path,
    artifact: &str,
    version: SnapshotVersion,
    tool_version: &str,
) -> Result<()> {
    let encoded = encode(artifact, version, tool_version)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SnapError::io(format!("create {}", parent.display()), e))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, encoded)
        .map_err(|e| SnapError::io(format!("write {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| SnapError::io(format!("rename {} -> {}", tmp.display(), path.display()), e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Derive the baseline path for a test case.
///
/// Precedence for the base directory: explicit output dir, then the
/// values file's directory, then the chart directory when the chart is a
/// local path, then the current directory. The file stem is the values
/// file stem, or `default` when testing chart defaults.
pub fn snapshot_file_path(
    output_dir: Option<&Path>,
    chart: &str,
    values_file: Option<&Path>,
) -> PathBuf {
    let base: PathBuf = if let Some(dir) = output_dir {
        dir.to_path_buf()
    } else if let Some(parent) = values_file.and_then(Path::parent) {
        parent.to_path_buf()
    } else if Path::new(chart).is_dir() {
        PathBuf::from(chart)
    } else {
        PathBuf::from(".")
    };
    let stem = values_file
        .and_then(Path::file_stem)
        .map_or_else(|| "default".to_owned(), |s| s.to_string_lossy().into_owned());
    base.join(SNAPSHOT_DIR_NAME).join(format!("{stem}.snap"))
}
