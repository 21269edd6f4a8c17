//! Implementation of the `devshell shell` command.

use std::process::{Command, ExitCode};

use anyhow::{Context, Result};
use tracing::info;

use devshell_lib::platform::Platform;

use super::{Project, ProjectArgs, host_platform};

/// Spawn `$SHELL` (or `command`) with the environment applied and wait for it.
///
/// The session exits with the child's status.
pub fn cmd_shell(args: &ProjectArgs, platform: Option<Platform>, command: &[String]) -> Result<ExitCode> {
  let project = Project::load(args)?;
  let platform = host_platform(platform)?;
  let environment = project.assemble(platform)?;

  let host_path = std::env::var("PATH").ok();
  let vars = environment.session_vars(host_path.as_deref())?;

  let (program, rest) = match command.split_first() {
    Some((program, rest)) => (program.clone(), rest.to_vec()),
    None => (default_shell(), Vec::new()),
  };

  info!(program = %program, platform = %platform, "starting session");
  let status = Command::new(&program)
    .args(&rest)
    .current_dir(&project.root)
    .envs(vars)
    .status()
    .with_context(|| format!("Failed to start {}", program))?;

  Ok(match status.code() {
    Some(0) => ExitCode::SUCCESS,
    Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
    None => ExitCode::FAILURE,
  })
}

fn default_shell() -> String {
  match std::env::var("SHELL") {
    Ok(shell) if !shell.is_empty() => shell,
    _ if cfg!(windows) => "powershell.exe".to_string(),
    _ => "/bin/sh".to_string(),
  }
}
