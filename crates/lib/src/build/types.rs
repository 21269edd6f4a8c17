use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::{Environment, PathJoinError};
use crate::manifest::Toolchain;
use crate::platform::Platform;
use crate::resolve::ResolveError;
use crate::util::hash::{ContentHash, DirHashError, Hashable, ObjectHash};

#[derive(Debug, Error)]
pub enum BuildError {
  /// The toolchain or one of its tools has no concrete location.
  #[error("resolution failure: {0}")]
  ResolutionFailure(#[from] ResolveError),

  /// The toolchain rejected the source tree. `message` is its output, verbatim.
  #[error("{message}")]
  CompilationFailure { code: Option<i32>, message: String },

  #[error("failed to hash build inputs: {0}")]
  Hash(#[from] DirHashError),

  #[error("failed to serialize build inputs: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error(transparent)]
  InvalidPath(#[from] PathJoinError),

  #[error("failed to lock {}: {source}", path.display())]
  Lock { path: PathBuf, source: std::io::Error },

  #[error("invalid completion marker: {message}")]
  Marker { message: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// What to build and with what.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
  pub name: &'a str,
  pub source_tree: &'a Path,
  pub toolchain: &'a Toolchain,
  pub platform: Platform,
  /// Search paths to expose to the compiler and linker. `None` builds with
  /// only the toolchain on `PATH`.
  pub environment: Option<&'a Environment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInput {
  pub name: String,
  pub store_path: String,
}

/// Everything that determines a build's output location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInputs {
  pub name: String,
  pub platform: Platform,
  pub source_hash: String,
  pub toolchain: Vec<ToolInput>,
  pub command: String,
  pub env: BTreeMap<String, String>,
  pub include_paths: Vec<String>,
  pub link_paths: Vec<String>,
  pub loader_paths: Vec<String>,
}

impl Hashable for BuildInputs {}

/// Content of the completion marker written into a finished build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMarker {
  pub version: u32,
  pub status: String,
  pub output_hash: String,
}

/// A finished build in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
  pub hash: ObjectHash,
  pub store_path: PathBuf,
  pub output_hash: ContentHash,
  /// Whether the location already held a complete build.
  pub cached: bool,
}
