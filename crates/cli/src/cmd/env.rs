//! Implementation of the `devshell env` command.

use anyhow::Result;

use devshell_lib::env::Shell;
use devshell_lib::platform::Platform;

use super::{Project, ProjectArgs, target_platform};
use crate::output::{OutputFormat, print_json};

/// Print the bindings for one platform.
///
/// With `--shell` the output is an export script suitable for `eval`; with
/// `--format json` it is the whole assembled environment.
pub fn cmd_env(args: &ProjectArgs, platform: Option<Platform>, shell: Option<Shell>, format: OutputFormat) -> Result<()> {
  let project = Project::load(args)?;
  let platform = target_platform(platform)?;
  let environment = project.assemble(platform)?;

  if let Some(shell) = shell {
    print!("{}", environment.render(shell)?);
    return Ok(());
  }

  if format.is_json() {
    return print_json(&environment);
  }

  for binding in &environment.bindings {
    println!("{}={}", binding.name, binding.value);
  }
  Ok(())
}
