use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system variants a platform key can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  Linux,
  Darwin,
  Windows,
}

impl Os {
  pub const ALL: [Os; 3] = [Os::Linux, Os::Darwin, Os::Windows];

  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Darwin),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Darwin => "darwin",
      Self::Windows => "windows",
    }
  }

  /// Separator used when joining a list of directories into one variable.
  pub fn path_list_separator(&self) -> char {
    match self {
      Self::Windows => ';',
      Self::Linux | Self::Darwin => ':',
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Os {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "linux" => Ok(Self::Linux),
      "darwin" | "macos" | "osx" => Ok(Self::Darwin),
      "windows" | "win" => Ok(Self::Windows),
      _ => Err(()),
    }
  }
}
