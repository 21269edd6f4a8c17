//! Project manifest (`devshell.toml`).
//!
//! The manifest is the only configuration surface: a pinned toolchain and an
//! ordered list of native dependencies, each with an explicit role.
//!
//! ```toml
//! name = "level-editor"
//!
//! [toolchain]
//! source = "rust-src"
//!
//! [[toolchain.tools]]
//! name = "cargo"
//! role = "build"
//!
//! [[dependencies]]
//! name = "alsa-lib"
//! role = "both"
//! platforms = ["x86_64-linux", "aarch64-linux"]
//! ```

mod types;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use types::*;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse manifest {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("invalid manifest: {0}")]
  Invalid(String),
}

impl ProjectManifest {
  /// Read, parse and validate a manifest file.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  /// Parse manifest text. `origin` only appears in error messages.
  pub fn parse(content: &str, origin: &Path) -> Result<Self, ManifestError> {
    let manifest: ProjectManifest = toml::from_str(content).map_err(|e| ManifestError::Parse {
      path: origin.to_path_buf(),
      message: e.to_string(),
    })?;
    manifest.validate()?;
    debug!(
      name = %manifest.name,
      dependencies = manifest.dependencies.len(),
      tools = manifest.toolchain.tools.len(),
      "loaded manifest"
    );
    Ok(manifest)
  }

  pub fn validate(&self) -> Result<(), ManifestError> {
    if self.name.trim().is_empty() {
      return Err(ManifestError::Invalid("project name is empty".to_string()));
    }
    if self.toolchain.source.trim().is_empty() {
      return Err(ManifestError::Invalid("toolchain source package is empty".to_string()));
    }
    if self.toolchain.command.trim().is_empty() {
      return Err(ManifestError::Invalid("toolchain build command is empty".to_string()));
    }

    check_unique("dependency", self.dependencies.iter().map(|d| d.name.as_str()))?;
    check_unique("tool", self.toolchain.tools.iter().map(|t| t.name.as_str()))?;
    Ok(())
  }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<(), ManifestError> {
  let mut seen = HashSet::new();
  for name in names {
    if name.trim().is_empty() {
      return Err(ManifestError::Invalid(format!("{} with empty name", kind)));
    }
    if !seen.insert(name) {
      return Err(ManifestError::Invalid(format!("{} '{}' declared more than once", kind, name)));
    }
  }
  Ok(())
}
