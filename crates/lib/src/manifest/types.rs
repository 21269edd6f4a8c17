use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Which path sets a declared native package contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Headers and link-time libraries only.
  Build,
  /// Shared libraries loaded when the program runs.
  Runtime,
  Both,
}

impl Role {
  pub fn contributes_build(self) -> bool {
    matches!(self, Role::Build | Role::Both)
  }

  pub fn contributes_runtime(self) -> bool {
    matches!(self, Role::Runtime | Role::Both)
  }
}

/// A named native package plus the role it plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
  pub name: String,
  pub role: Role,
  /// Platforms this dependency is declared for. Empty means every platform.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub platforms: Vec<Platform>,
}

impl DependencyDescriptor {
  pub fn new(name: &str, role: Role) -> Self {
    Self {
      name: name.to_string(),
      role,
      platforms: Vec::new(),
    }
  }

  pub fn only_on(mut self, platforms: &[Platform]) -> Self {
    self.platforms = platforms.to_vec();
    self
  }

  pub fn declared_for(&self, platform: Platform) -> bool {
    self.platforms.is_empty() || self.platforms.contains(&platform)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolRole {
  /// Needed to build the package (compiler, linker, cargo).
  Build,
  /// Only useful in an interactive session (language server, formatter, linter, watcher).
  Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
  pub name: String,
  pub role: ToolRole,
}

impl Tool {
  pub fn new(name: &str, role: ToolRole) -> Self {
    Self {
      name: name.to_string(),
      role,
    }
  }
}

fn default_project_manifest() -> String {
  "Cargo.toml".to_string()
}

fn default_build_command() -> String {
  r#"CARGO_HOME="$TMPDIR/cargo" cargo build --release --target-dir "$out/target""#.to_string()
}

/// The pinned toolchain used for builds and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
  /// Package holding the toolchain's bundled library source.
  pub source: String,
  /// Project manifest file the toolchain recognizes in a source tree.
  #[serde(default = "default_project_manifest")]
  pub manifest: String,
  /// Shell command that builds the default package into `$out`.
  #[serde(default = "default_build_command")]
  pub command: String,
  /// Extra variables for the build command.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
  #[serde(default)]
  pub tools: Vec<Tool>,
}

impl Toolchain {
  pub fn new(source: &str) -> Self {
    Self {
      source: source.to_string(),
      manifest: default_project_manifest(),
      command: default_build_command(),
      env: BTreeMap::new(),
      tools: Vec::new(),
    }
  }

  pub fn with_tool(mut self, name: &str, role: ToolRole) -> Self {
    self.tools.push(Tool::new(name, role));
    self
  }

  pub fn with_command(mut self, command: &str) -> Self {
    self.command = command.to_string();
    self
  }

  pub fn build_tools(&self) -> impl Iterator<Item = &Tool> {
    self.tools.iter().filter(|t| t.role == ToolRole::Build)
  }

  /// This toolchain with interactive tools dropped, for non-interactive builds.
  pub fn for_build(&self) -> Toolchain {
    Toolchain {
      tools: self.build_tools().cloned().collect(),
      ..self.clone()
    }
  }
}

/// Contents of `devshell.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
  pub name: String,
  pub toolchain: Toolchain,
  #[serde(default)]
  pub dependencies: Vec<DependencyDescriptor>,
}
