//! Implementation of the `devshell check` command.
//!
//! Runs the assembler once per platform key found in the package index and
//! reports which keys produce a complete environment.

use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;

use super::{Project, ProjectArgs};
use crate::output::{OutputFormat, print_error, print_json, print_success, print_warning};

#[derive(Serialize)]
struct PlatformReport {
  platform: String,
  ok: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

pub fn cmd_check(args: &ProjectArgs, format: OutputFormat) -> Result<ExitCode> {
  let project = Project::load(args)?;
  let platforms = project.index.platforms();

  if platforms.is_empty() {
    print_warning("Package index maps no platforms");
    return Ok(ExitCode::FAILURE);
  }

  let reports: Vec<PlatformReport> = platforms
    .into_iter()
    .map(|platform| match project.assemble(platform) {
      Ok(_) => PlatformReport {
        platform: platform.triple(),
        ok: true,
        error: None,
      },
      Err(e) => PlatformReport {
        platform: platform.triple(),
        ok: false,
        error: Some(e.root_cause().to_string()),
      },
    })
    .collect();

  let failed = reports.iter().filter(|r| !r.ok).count();

  if format.is_json() {
    print_json(&reports)?;
  } else {
    for report in &reports {
      match &report.error {
        None => print_success(&report.platform),
        Some(error) => print_error(&format!("{}: {}", report.platform, error)),
      }
    }
  }

  Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
