//! Interface to the external package resolver.
//!
//! The resolver maps an abstract package name to concrete, immutable store
//! locations for one platform. [`PackageIndex`] reads the resolver's
//! materialized output from `packages.toml`; [`StaticResolver`] is an
//! in-memory map for embedders and tests.

mod index;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::platform::Platform;

pub use index::{IndexEntry, PackageIndex};

#[derive(Debug, Error)]
pub enum ResolveError {
  /// The package exists nowhere for this platform.
  #[error("package '{name}' has no mapping for platform {platform}")]
  NoMapping { name: String, platform: Platform },

  #[error("store path for '{name}' does not exist: {}", path.display())]
  MissingStorePath { name: String, path: PathBuf },

  #[error("failed to read package index {}: {source}", path.display())]
  ReadIndex { path: PathBuf, source: std::io::Error },

  #[error("failed to parse package index {}: {message}", path.display())]
  ParseIndex { path: PathBuf, message: String },
}

/// Concrete locations of one package on one platform.
///
/// Sub-locations are optional; a package only has the outputs it ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
  pub name: String,
  pub platform: Platform,
  pub store_path: PathBuf,
  pub include_dir: Option<PathBuf>,
  pub lib_dir: Option<PathBuf>,
  pub bin_dir: Option<PathBuf>,
  pub src_dir: Option<PathBuf>,
}

impl ResolvedPackage {
  pub fn new(name: &str, platform: Platform, store_path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.to_string(),
      platform,
      store_path: store_path.into(),
      include_dir: None,
      lib_dir: None,
      bin_dir: None,
      src_dir: None,
    }
  }

  /// Relative paths are taken under the store path; absolute ones are kept.
  fn sub(&self, path: impl AsRef<Path>) -> PathBuf {
    self.store_path.join(path)
  }

  pub fn with_include(mut self, path: impl AsRef<Path>) -> Self {
    self.include_dir = Some(self.sub(path));
    self
  }

  pub fn with_lib(mut self, path: impl AsRef<Path>) -> Self {
    self.lib_dir = Some(self.sub(path));
    self
  }

  pub fn with_bin(mut self, path: impl AsRef<Path>) -> Self {
    self.bin_dir = Some(self.sub(path));
    self
  }

  pub fn with_src(mut self, path: impl AsRef<Path>) -> Self {
    self.src_dir = Some(self.sub(path));
    self
  }
}

pub trait Resolver {
  /// Resolve `name` for `platform`. May block on I/O.
  fn resolve(&self, name: &str, platform: Platform) -> Result<ResolvedPackage, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
  fn resolve(&self, name: &str, platform: Platform) -> Result<ResolvedPackage, ResolveError> {
    (**self).resolve(name, platform)
  }
}

/// In-memory resolver keyed by (name, platform).
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
  packages: HashMap<(String, Platform), ResolvedPackage>,
}

impl StaticResolver {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, package: ResolvedPackage) {
    self
      .packages
      .insert((package.name.clone(), package.platform), package);
  }

  pub fn with(mut self, package: ResolvedPackage) -> Self {
    self.insert(package);
    self
  }
}

impl Resolver for StaticResolver {
  fn resolve(&self, name: &str, platform: Platform) -> Result<ResolvedPackage, ResolveError> {
    self
      .packages
      .get(&(name.to_string(), platform))
      .cloned()
      .ok_or_else(|| ResolveError::NoMapping {
        name: name.to_string(),
        platform,
      })
  }
}
