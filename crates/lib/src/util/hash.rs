//! Hashing for content-addressed build outputs.
//!
//! - `ObjectHash`: truncated digest naming a store directory
//! - `ContentHash`: full digest of a file tree, recorded in completion markers
//! - `hash_directory()`: deterministic tree hashing with exclusions

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A content-addressed hash identifying a store object.
///
/// 20 lowercase hex characters of the SHA-256 of the JSON-serialized inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hex_digest(serialized.as_bytes());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// A full 64-character SHA-256 hash of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: String, message: String },
}

fn hex_digest(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  format!("{:x}", hasher.finalize())
}

/// Compute a deterministic hash of a directory's contents.
///
/// Covers file contents, directory structure and symlink targets; ignores
/// timestamps and permissions. Any entry whose file name is in `exclude` is
/// skipped together with everything beneath it.
pub fn hash_directory(path: &Path, exclude: &[&str]) -> Result<ContentHash, DirHashError> {
  let mut lines: Vec<String> = Vec::new();

  let walker = WalkDir::new(path)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || e.file_name().to_str().map(|n| !exclude.contains(&n)).unwrap_or(true));

  for entry in walker {
    let entry = entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() })?;
    if entry.depth() == 0 {
      continue;
    }

    let entry_path = entry.path();
    // Forward slashes so the digest matches across hosts
    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    let file_type = entry.file_type();
    let line = if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|e| DirHashError::ReadSymlink {
        path: entry_path.display().to_string(),
        message: e.to_string(),
      })?;
      format!("L:{}:{}", rel_path, hex_digest(target.to_string_lossy().as_bytes()))
    } else if file_type.is_file() {
      format!("F:{}:{}", rel_path, hash_file(entry_path)?.0)
    } else if file_type.is_dir() {
      format!("D:{}", rel_path)
    } else {
      continue;
    };

    lines.push(line);
  }

  lines.sort();

  let mut hasher = Sha256::new();
  for line in &lines {
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let read_err = |e: std::io::Error| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  };

  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[derive(Serialize)]
  struct Inputs<'a> {
    name: &'a str,
    paths: Vec<&'a str>,
  }

  impl Hashable for Inputs<'_> {}

  #[test]
  fn object_hash_is_truncated_and_stable() {
    let a = Inputs { name: "editor", paths: vec!["/a", "/b"] };
    let h1 = a.compute_hash().unwrap();
    let h2 = a.compute_hash().unwrap();
    assert_eq!(h1, h2);
    assert_eq!(h1.0.len(), OBJ_HASH_PREFIX_LEN);

    let reordered = Inputs { name: "editor", paths: vec!["/b", "/a"] };
    assert_ne!(h1, reordered.compute_hash().unwrap());
  }

  #[test]
  fn tree_hash_tracks_content_not_timestamps() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("Cargo.toml"), "[package]").unwrap();
    let before = hash_directory(temp.path(), &[]).unwrap();

    // Rewriting identical bytes only bumps mtime
    fs::write(temp.path().join("Cargo.toml"), "[package]").unwrap();
    assert_eq!(before, hash_directory(temp.path(), &[]).unwrap());

    fs::write(temp.path().join("Cargo.toml"), "[package]\nname = \"x\"").unwrap();
    assert_ne!(before, hash_directory(temp.path(), &[]).unwrap());
  }

  #[test]
  fn excluded_subtrees_do_not_affect_hash() {
    let temp = tempdir().unwrap();
    fs::create_dir(temp.path().join("src")).unwrap();
    fs::write(temp.path().join("src/main.rs"), "fn main() {}").unwrap();
    let clean = hash_directory(temp.path(), &["target", ".git"]).unwrap();

    fs::create_dir_all(temp.path().join("target/release")).unwrap();
    fs::write(temp.path().join("target/release/editor"), "binary").unwrap();
    fs::create_dir(temp.path().join(".git")).unwrap();

    assert_eq!(clean, hash_directory(temp.path(), &["target", ".git"]).unwrap());
    assert_ne!(clean, hash_directory(temp.path(), &[]).unwrap());
  }

  #[test]
  fn excluding_the_root_name_still_hashes_contents() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("target");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a"), "a").unwrap();
    let empty = tempdir().unwrap();

    assert_ne!(
      hash_directory(&root, &["target"]).unwrap(),
      hash_directory(empty.path(), &["target"]).unwrap()
    );
  }

  #[test]
  fn structure_is_part_of_the_hash() {
    let flat = tempdir().unwrap();
    fs::write(flat.path().join("file.txt"), "content").unwrap();

    let nested = tempdir().unwrap();
    fs::create_dir(nested.path().join("subdir")).unwrap();
    fs::write(nested.path().join("subdir/file.txt"), "content").unwrap();

    assert_ne!(
      hash_directory(flat.path(), &[]).unwrap(),
      hash_directory(nested.path(), &[]).unwrap()
    );
  }

  #[test]
  #[cfg(unix)]
  fn symlink_targets_are_hashed() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("a"), "a").unwrap();
    fs::write(temp.path().join("b"), "b").unwrap();
    std::os::unix::fs::symlink("a", temp.path().join("link")).unwrap();
    let to_a = hash_directory(temp.path(), &[]).unwrap();

    fs::remove_file(temp.path().join("link")).unwrap();
    std::os::unix::fs::symlink("b", temp.path().join("link")).unwrap();
    assert_ne!(to_a, hash_directory(temp.path(), &[]).unwrap());
  }
}
