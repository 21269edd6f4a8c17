use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path {} contains the list separator '{separator}'", path.display())]
pub struct PathJoinError {
  pub path: PathBuf,
  pub separator: char,
}

/// Ordered list of directories with duplicates removed.
///
/// The first occurrence of a path keeps its position; later occurrences are
/// ignored. Paths compare by components, so `/a/lib/` and `/a/lib` are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathSet {
  entries: Vec<PathBuf>,
}

impl PathSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append `path` unless already present. Returns whether it was added.
  pub fn push(&mut self, path: impl Into<PathBuf>) -> bool {
    let path = path.into();
    if self.contains(&path) {
      return false;
    }
    self.entries.push(path);
    true
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.entries.iter().any(|p| p == path)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
    self.entries.iter()
  }

  pub fn as_slice(&self) -> &[PathBuf] {
    &self.entries
  }

  /// Serialize as a single search-path value.
  pub fn join(&self, separator: char) -> Result<String, PathJoinError> {
    let mut parts = Vec::with_capacity(self.entries.len());
    for path in &self.entries {
      let s = path.to_string_lossy();
      if s.contains(separator) {
        return Err(PathJoinError {
          path: path.clone(),
          separator,
        });
      }
      parts.push(s);
    }
    Ok(parts.join(&separator.to_string()))
  }
}

impl<P: Into<PathBuf>> Extend<P> for PathSet {
  fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
    for path in iter {
      self.push(path);
    }
  }
}

impl<P: Into<PathBuf>> FromIterator<P> for PathSet {
  fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
    let mut set = PathSet::new();
    set.extend(iter);
    set
  }
}

impl<'a> IntoIterator for &'a PathSet {
  type Item = &'a PathBuf;
  type IntoIter = std::slice::Iter<'a, PathBuf>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}
