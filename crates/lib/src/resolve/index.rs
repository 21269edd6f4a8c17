//! File-backed resolver over `packages.toml`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ResolveError, ResolvedPackage, Resolver};
use crate::platform::Platform;

/// One package on one platform, as written by the external resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
  pub path: PathBuf,
  #[serde(default)]
  pub include: Option<PathBuf>,
  #[serde(default)]
  pub lib: Option<PathBuf>,
  #[serde(default)]
  pub bin: Option<PathBuf>,
  #[serde(default)]
  pub src: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawIndex {
  #[serde(default)]
  packages: BTreeMap<String, BTreeMap<String, IndexEntry>>,
}

#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
  packages: BTreeMap<String, BTreeMap<Platform, IndexEntry>>,
  /// Skip the on-disk existence check (for rendering environments of other hosts).
  trust_paths: bool,
}

impl PackageIndex {
  pub fn load(path: &Path) -> Result<Self, ResolveError> {
    let content = fs::read_to_string(path).map_err(|source| ResolveError::ReadIndex {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  pub fn parse(content: &str, origin: &Path) -> Result<Self, ResolveError> {
    let parse_err = |message: String| ResolveError::ParseIndex {
      path: origin.to_path_buf(),
      message,
    };

    let raw: RawIndex = toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;

    let mut packages = BTreeMap::new();
    for (name, by_platform) in raw.packages {
      let mut entries = BTreeMap::new();
      for (key, entry) in by_platform {
        let platform: Platform = key
          .parse()
          .map_err(|e: crate::platform::PlatformParseError| parse_err(format!("package '{}': {}", name, e)))?;
        if entries.insert(platform, entry).is_some() {
          return Err(parse_err(format!(
            "package '{}' maps platform {} more than once",
            name, platform
          )));
        }
      }
      packages.insert(name, entries);
    }

    debug!(path = %origin.display(), packages = packages.len(), "loaded package index");
    Ok(Self {
      packages,
      trust_paths: false,
    })
  }

  /// Resolve without checking that store paths exist on this machine.
  pub fn trusting_paths(mut self) -> Self {
    self.trust_paths = true;
    self
  }

  /// Every platform at least one package is mapped for, in key order.
  pub fn platforms(&self) -> Vec<Platform> {
    let set: BTreeSet<Platform> = self.packages.values().flat_map(|m| m.keys().copied()).collect();
    set.into_iter().collect()
  }
}

impl Resolver for PackageIndex {
  fn resolve(&self, name: &str, platform: Platform) -> Result<ResolvedPackage, ResolveError> {
    let entry = self
      .packages
      .get(name)
      .and_then(|m| m.get(&platform))
      .ok_or_else(|| ResolveError::NoMapping {
        name: name.to_string(),
        platform,
      })?;

    if !self.trust_paths && !entry.path.exists() {
      return Err(ResolveError::MissingStorePath {
        name: name.to_string(),
        path: entry.path.clone(),
      });
    }

    let mut package = ResolvedPackage::new(name, platform, &entry.path);
    if let Some(include) = &entry.include {
      package = package.with_include(include);
    }
    if let Some(lib) = &entry.lib {
      package = package.with_lib(lib);
    }
    if let Some(bin) = &entry.bin {
      package = package.with_bin(bin);
    }
    if let Some(src) = &entry.src {
      package = package.with_src(src);
    }
    Ok(package)
  }
}
