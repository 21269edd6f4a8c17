//! Build output locations (`<store>/build/<hash>/`) and their locks
//! (`<store>/locks/<hash>.lock`).

use std::path::{Path, PathBuf};

use crate::util::hash::ObjectHash;

pub fn build_dir_in(store: &Path, hash: &ObjectHash) -> PathBuf {
  store.join("build").join(&hash.0)
}

pub fn lock_path_in(store: &Path, hash: &ObjectHash) -> PathBuf {
  store.join("locks").join(format!("{}.lock", hash.0))
}
