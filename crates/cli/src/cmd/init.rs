//! Implementation of the `devshell init` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use devshell_lib::init::{InitOptions, init};

use crate::output::symbols;

/// Scaffold `devshell.toml` and `packages.toml` in `dir`.
///
/// Fails without writing anything if either file already exists.
pub fn cmd_init(dir: PathBuf, name: Option<String>) -> Result<()> {
  let result = init(&InitOptions { dir, name }).context("Failed to initialize project")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized devshell project!".green().bold()
  );
  println!();
  println!(
    "  {} Project directory: {}",
    symbols::INFO.cyan(),
    result.project_dir.display()
  );
  println!("  {} Manifest:          {}", symbols::INFO.cyan(), result.manifest.display());
  println!("  {} Package index:     {}", symbols::INFO.cyan(), result.index.display());
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Fill {} with the store paths of each package",
    result.index.display().to_string().cyan()
  );
  println!("  2. Run: {}", "devshell check".cyan());
  println!("  3. Run: {}", "devshell shell".cyan());

  Ok(())
}
