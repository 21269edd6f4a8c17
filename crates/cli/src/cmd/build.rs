//! Implementation of the `devshell build` command.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};

use devshell_lib::build::{BuildError, BuildRequest, build};
use devshell_lib::platform::Platform;

use super::{Project, ProjectArgs, host_platform};
use crate::output::{OutputFormat, format_duration, print_error, print_json, print_stat, print_success};

/// Build the project's default package.
///
/// On a toolchain rejection the toolchain's own output goes to stderr
/// unchanged and the command exits non-zero.
pub fn cmd_build(args: &ProjectArgs, platform: Option<Platform>, format: OutputFormat) -> Result<ExitCode> {
  let project = Project::load(args)?;
  let platform = host_platform(platform)?;
  let environment = project.assemble_for_build(platform)?;
  let resolver = project.resolver_for(platform);

  let request = BuildRequest {
    name: &project.manifest.name,
    source_tree: &project.root,
    toolchain: &project.manifest.toolchain,
    platform,
    environment: Some(&environment),
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let start = Instant::now();

  let artifact = match rt.block_on(build(&request, &resolver)) {
    Ok(artifact) => artifact,
    Err(BuildError::CompilationFailure { code, message }) => {
      eprint!("{}", message);
      match code {
        Some(code) => print_error(&format!("Build failed (exit code {})", code)),
        None => print_error("Build failed"),
      }
      return Ok(ExitCode::FAILURE);
    }
    Err(e) => return Err(e).context("Build failed"),
  };

  if format.is_json() {
    print_json(&artifact)?;
  } else {
    if artifact.cached {
      print_success(&format!("{} is up to date", project.manifest.name));
    } else {
      print_success(&format!(
        "Built {} in {}",
        project.manifest.name,
        format_duration(start.elapsed())
      ));
    }
    print_stat("Output", &artifact.store_path.display().to_string());
    print_stat("Hash", &artifact.hash.0);
  }

  Ok(ExitCode::SUCCESS)
}
