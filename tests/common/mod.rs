//! Shared helpers for integration tests: unique scratch directories and
//! fixture writers (test values, mask configs, fake renderer scripts).

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Create a fresh, uniquely-named scratch directory under the system temp
/// dir. Callers clean up with `fs::remove_dir_all` at the end of a test.
pub fn scratch_dir(tag: &str) -> PathBuf {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "chartsnap-it-{tag}-{}-{}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a values file into `dir` and return its path.
pub fn write_values(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Write a `.chartsnap.yaml` mask config into `dir`.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join(".chartsnap.yaml");
    fs::write(&path, content).unwrap();
    path
}

/// Rendered stream used by most fixtures: one Secret with a dynamic token
/// plus one stable ConfigMap.
pub const SECRET_AND_CONFIGMAP: &str = "\
apiVersion: v1
kind: Secret
metadata:
  name: my-secret
data:
  TOKEN: abc123
---
apiVersion: v1
kind: Secret
metadata:
  name: other-secret
data:
  TOKEN: keepme
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: my-config
data:
  key: value
";

/// Write an executable shell script that mimics `helm template` by
/// printing `output` to stdout, and return its path for use as HELM_BIN.
#[cfg(unix)]
pub fn write_fake_helm(dir: &Path, output: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-helm");
    let script = format!("#!/bin/sh\ncat <<'CHARTSNAP_EOF'\n{output}CHARTSNAP_EOF\n");
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Fake helm that exits non-zero with a message on stderr.
#[cfg(unix)]
pub fn write_failing_helm(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("failing-helm");
    fs::write(&path, "#!/bin/sh\necho 'template rendering broke' >&2\nexit 1\n").unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
