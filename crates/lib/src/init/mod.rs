//! Scaffold a new project for `devshell init`.

mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::{INDEX_FILE, MANIFEST_FILE};

pub use templates::{INDEX_TEMPLATE, MANIFEST_TEMPLATE};

#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

pub struct InitOptions {
  /// Project directory; created if missing.
  pub dir: PathBuf,
  /// Project name written into the manifest. Defaults to the directory name.
  pub name: Option<String>,
}

#[derive(Debug)]
pub struct InitResult {
  /// The project directory (canonicalized)
  pub project_dir: PathBuf,
  pub manifest: PathBuf,
  pub index: PathBuf,
}

/// Write `devshell.toml` and `packages.toml` into `options.dir`.
///
/// Nothing is written if either file already exists.
pub fn init(options: &InitOptions) -> Result<InitResult, InitError> {
  fs::create_dir_all(&options.dir).map_err(|source| InitError::CreateDir {
    path: options.dir.clone(),
    source,
  })?;

  let project_dir = dunce::canonicalize(&options.dir).map_err(|source| InitError::Canonicalize {
    path: options.dir.clone(),
    source,
  })?;

  let manifest = project_dir.join(MANIFEST_FILE);
  let index = project_dir.join(INDEX_FILE);

  for path in [&manifest, &index] {
    if path.exists() {
      return Err(InitError::PathExists { path: path.clone() });
    }
  }

  let name = options.name.clone().unwrap_or_else(|| project_name(&project_dir));
  write(&manifest, &MANIFEST_TEMPLATE.replace("{name}", &name))?;
  write(&index, INDEX_TEMPLATE)?;

  info!(dir = %project_dir.display(), name = %name, "initialized project");

  Ok(InitResult {
    project_dir,
    manifest,
    index,
  })
}

fn project_name(dir: &Path) -> String {
  dir
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .filter(|n| !n.is_empty())
    .unwrap_or_else(|| "project".to_string())
}

fn write(path: &Path, content: &str) -> Result<(), InitError> {
  fs::write(path, content).map_err(|source| InitError::WriteFile {
    path: path.to_path_buf(),
    source,
  })
}
