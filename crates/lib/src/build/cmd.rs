//! Isolated execution of the toolchain's build command.
//!
//! The command sees only what the build declares: the environment is cleared
//! and rebuilt from a fixed base plus the caller's variables.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use super::BuildError;

/// Unset `PATH` placeholder; fails fast if a command needs an undeclared tool.
pub const PATH_NOT_SET: &str = "/path-not-set";

/// 1980-01-01T00:00:00Z, the ZIP epoch.
pub const SOURCE_DATE_EPOCH: &str = "315532800";

/// Run `cmd` through the platform shell with an isolated environment.
///
/// - `cwd` is the source tree; `src` points at it as well
/// - `out` is the output directory; `TMPDIR` and friends point at `<out>/tmp`
/// - `vars` are applied last and may override the base (including `PATH`)
///
/// Returns trimmed stdout. A non-zero exit becomes
/// [`BuildError::CompilationFailure`] carrying stderr as written.
pub async fn run_build_command(
  cmd: &str,
  vars: &BTreeMap<String, String>,
  cwd: &Path,
  out_dir: &Path,
) -> Result<String, BuildError> {
  info!(cmd = %cmd, cwd = %cwd.display(), "running build command");

  let tmp_dir = out_dir.join("tmp");
  tokio::fs::create_dir_all(&tmp_dir).await?;

  let (shell, shell_args) = platform_shell();

  let mut command = Command::new(shell);
  command
    .args(shell_args)
    .arg(cmd)
    .current_dir(cwd)
    .env_clear()
    .env("PATH", PATH_NOT_SET)
    .env("HOME", "/homeless-shelter")
    .env("TMPDIR", &tmp_dir)
    .env("TMP", &tmp_dir)
    .env("TEMP", &tmp_dir)
    .env("TEMPDIR", &tmp_dir)
    .env("out", out_dir)
    .env("src", cwd)
    .env("LANG", "C")
    .env("LC_ALL", "C")
    .env("SOURCE_DATE_EPOCH", SOURCE_DATE_EPOCH);

  for (key, value) in vars {
    command.env(key, value);
  }

  debug!(shell = %shell, "spawning build process");
  let output = command.output().await?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);

  if !output.status.success() {
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "build stdout");
    }
    // Some toolchains report errors on stdout only
    let message = if stderr.trim().is_empty() { stdout } else { stderr };
    return Err(BuildError::CompilationFailure {
      code: output.status.code(),
      message: message.into_owned(),
    });
  }

  if !stderr.is_empty() {
    debug!(stderr = %stderr, "build stderr");
  }

  Ok(stdout.trim().to_string())
}

/// Always `/bin/sh` (or PowerShell), never `$SHELL`: login shells source
/// profiles that leak into the environment.
fn platform_shell() -> (&'static str, &'static [&'static str]) {
  #[cfg(unix)]
  let shell: (&'static str, &'static [&'static str]) = ("/bin/sh", &["-c"]);

  #[cfg(windows)]
  let shell: (&'static str, &'static [&'static str]) =
    ("powershell.exe", &["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command"]);

  shell
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use tempfile::TempDir;

  async fn run(cmd: &str, vars: &[(&str, &str)]) -> (TempDir, Result<String, BuildError>) {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    tokio::fs::create_dir_all(&out).await.unwrap();
    let vars: BTreeMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let result = run_build_command(cmd, &vars, temp.path(), &out).await;
    (temp, result)
  }

  #[tokio::test]
  async fn environment_is_isolated() {
    let (_t, path) = run("echo $PATH", &[]).await;
    assert_eq!(path.unwrap(), PATH_NOT_SET);

    let (_t, home) = run("echo $HOME", &[]).await;
    assert_eq!(home.unwrap(), "/homeless-shelter");

    let (_t, epoch) = run("echo $SOURCE_DATE_EPOCH", &[]).await;
    assert_eq!(epoch.unwrap(), SOURCE_DATE_EPOCH);
  }

  #[tokio::test]
  async fn caller_vars_override_base() {
    let (_t, result) = run("echo $PATH $LIBRARY_PATH", &[("PATH", "/tools/bin"), ("LIBRARY_PATH", "/a/lib")]).await;
    assert_eq!(result.unwrap(), "/tools/bin /a/lib");
  }

  #[tokio::test]
  async fn out_and_src_are_set() {
    let (temp, result) = run("echo $out; echo $src", &[]).await;
    let output = result.unwrap();
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines[0], temp.path().join("out").to_string_lossy());
    assert_eq!(lines[1], temp.path().to_string_lossy());
    assert!(temp.path().join("out/tmp").is_dir());
  }

  #[tokio::test]
  async fn failure_carries_stderr_verbatim() {
    let (_t, result) = run("echo 'error: could not compile `editor`' >&2; exit 101", &[]).await;
    match result {
      Err(BuildError::CompilationFailure { code, message }) => {
        assert_eq!(code, Some(101));
        assert_eq!(message, "error: could not compile `editor`\n");
      }
      other => panic!("expected CompilationFailure, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn failure_falls_back_to_stdout() {
    let (_t, result) = run("echo 'only on stdout'; exit 2", &[]).await;
    assert!(matches!(
      result,
      Err(BuildError::CompilationFailure { code: Some(2), ref message }) if message == "only on stdout\n"
    ));
  }
}
