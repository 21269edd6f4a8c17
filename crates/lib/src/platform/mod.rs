//! Platform keys.
//!
//! Every resolution step is a pure function of a single [`Platform`]. The key
//! is written `<arch>-<os>` (e.g. `x86_64-linux`); `<os>-<arch>` and common
//! aliases (`macos`, `arm64`, `amd64`) are accepted when parsing.

pub mod arch;
pub mod os;
pub mod paths;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use arch::Arch;
pub use os::Os;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid platform '{value}': expected <arch>-<os>, e.g. x86_64-linux or aarch64-darwin")]
pub struct PlatformParseError {
  pub value: String,
}

/// Platform identifier combining architecture and OS (e.g., "aarch64-darwin")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  /// Every supported platform, ordered by OS then architecture.
  pub fn all() -> Vec<Self> {
    Os::ALL
      .iter()
      .flat_map(|os| Arch::ALL.iter().map(move |arch| Self::new(*arch, *os)))
      .collect()
  }

  /// Returns the platform triple string (e.g., "aarch64-darwin")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }

  pub fn path_list_separator(&self) -> char {
    self.os.path_list_separator()
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}

impl FromStr for Platform {
  type Err = PlatformParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || PlatformParseError { value: s.to_string() };
    let (first, second) = s.trim().split_once('-').ok_or_else(err)?;

    if let (Ok(arch), Ok(os)) = (first.parse::<Arch>(), second.parse::<Os>()) {
      return Ok(Self::new(arch, os));
    }
    if let (Ok(os), Ok(arch)) = (first.parse::<Os>(), second.parse::<Arch>()) {
      return Ok(Self::new(arch, os));
    }
    Err(err())
  }
}

impl From<Platform> for String {
  fn from(platform: Platform) -> Self {
    platform.triple()
  }
}

impl TryFrom<String> for Platform {
  type Error = PlatformParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// Returns the platform triple for the current system (e.g., "aarch64-darwin")
///
/// Returns `None` if the current platform is not supported
pub fn platform_triple() -> Option<String> {
  Platform::current().map(|p| p.triple())
}
