//! Environment assembly.
//!
//! Given the declared native dependencies, the toolchain and one platform key,
//! [`assemble`] resolves every package and derives:
//! - the compile/link search paths (build-role packages)
//! - the dynamic loader search path (runtime-role packages)
//! - the session bindings `RUST_SRC_PATH` and `LD_LIBRARY_PATH`
//!
//! Assembly is all-or-nothing: any unresolvable declared package fails the
//! whole call and no bindings are produced.

mod binding;
mod pathset;
mod shell;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{LOADER_PATH_VAR, RUST_SRC_PATH_VAR};
use crate::manifest::{DependencyDescriptor, ToolRole, Toolchain};
use crate::platform::Platform;
use crate::resolve::{ResolveError, ResolvedPackage, Resolver};

pub use binding::{EnvBinding, EnvBindings};
pub use pathset::{PathJoinError, PathSet};
pub use shell::Shell;

#[derive(Debug, Error)]
pub enum AssembleError {
  /// A declared native library has no mapping for this platform.
  #[error("unresolved dependency '{name}' for platform {platform}")]
  UnresolvedDependency { name: String, platform: Platform },

  /// The toolchain, or a package's store location, could not be resolved.
  #[error("resolution failure: {0}")]
  ResolutionFailure(#[from] ResolveError),

  /// A package resolved but lacks the output its role needs.
  #[error("package '{name}' has no {output} directory, required by its role")]
  MissingOutput { name: String, output: &'static str },

  #[error(transparent)]
  InvalidPath(#[from] PathJoinError),
}

/// Everything one assembly produces for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
  pub platform: Platform,
  /// Include and library directories of build-role packages.
  pub compile_paths: PathSet,
  /// The include directories from `compile_paths` (`CPATH` for builds).
  pub include_paths: PathSet,
  /// The library directories from `compile_paths` (`LIBRARY_PATH` for builds).
  pub link_paths: PathSet,
  /// Library directories of runtime-role packages.
  pub loader_paths: PathSet,
  /// Bin directories of build-role tools.
  pub build_tool_paths: PathSet,
  /// Bin directories of every tool, for the session `PATH`.
  pub tool_paths: PathSet,
  pub bindings: EnvBindings,
}

/// Resolve `dependencies` and `toolchain` for `platform` and build the environment.
pub fn assemble(
  dependencies: &[DependencyDescriptor],
  toolchain: &Toolchain,
  platform: Platform,
  resolver: &dyn Resolver,
) -> Result<Environment, AssembleError> {
  let declared: Vec<&DependencyDescriptor> = dependencies.iter().filter(|d| d.declared_for(platform)).collect();

  // Resolve everything before computing anything
  let mut resolved = Vec::with_capacity(declared.len());
  for descriptor in &declared {
    let package = resolver.resolve(&descriptor.name, platform).map_err(|e| match e {
      ResolveError::NoMapping { name, platform } => AssembleError::UnresolvedDependency { name, platform },
      other => AssembleError::ResolutionFailure(other),
    })?;
    debug!(name = %package.name, path = %package.store_path.display(), role = ?descriptor.role, "resolved dependency");
    resolved.push((*descriptor, package));
  }

  let source = resolver.resolve(&toolchain.source, platform)?;
  let mut tools = Vec::with_capacity(toolchain.tools.len());
  for tool in &toolchain.tools {
    tools.push((tool.role, resolver.resolve(&tool.name, platform)?));
  }

  let mut compile_paths = PathSet::new();
  let mut include_paths = PathSet::new();
  let mut link_paths = PathSet::new();
  let mut loader_paths = PathSet::new();

  for (descriptor, package) in &resolved {
    if descriptor.role.contributes_build() {
      if package.include_dir.is_none() && package.lib_dir.is_none() {
        return Err(missing(package, "include or lib"));
      }
      compile_paths.extend(package.include_dir.iter().cloned());
      compile_paths.extend(package.lib_dir.iter().cloned());
      include_paths.extend(package.include_dir.iter().cloned());
      link_paths.extend(package.lib_dir.iter().cloned());
    }
    if descriptor.role.contributes_runtime() {
      let lib_dir = package.lib_dir.as_ref().ok_or_else(|| missing(package, "lib"))?;
      loader_paths.push(lib_dir.clone());
    }
  }

  let mut build_tool_paths = PathSet::new();
  let mut tool_paths = PathSet::new();
  for (role, package) in &tools {
    let bin_dir = package.bin_dir.as_ref().ok_or_else(|| missing(package, "bin"))?;
    if *role == ToolRole::Build {
      build_tool_paths.push(bin_dir.clone());
    }
    tool_paths.push(bin_dir.clone());
  }

  let separator = platform.path_list_separator();
  let source_dir = source.src_dir.as_ref().unwrap_or(&source.store_path);

  let mut bindings = EnvBindings::default();
  bindings.push(EnvBinding::new(RUST_SRC_PATH_VAR, source_dir.to_string_lossy()));
  bindings.push(EnvBinding::new(LOADER_PATH_VAR, loader_paths.join(separator)?));

  info!(
    platform = %platform,
    dependencies = resolved.len(),
    compile_paths = compile_paths.len(),
    loader_paths = loader_paths.len(),
    "assembled environment"
  );

  Ok(Environment {
    platform,
    compile_paths,
    include_paths,
    link_paths,
    loader_paths,
    build_tool_paths,
    tool_paths,
    bindings,
  })
}

fn missing(package: &ResolvedPackage, output: &'static str) -> AssembleError {
  AssembleError::MissingOutput {
    name: package.name.clone(),
    output,
  }
}

impl Environment {
  /// Render an export script for `shell`: both bindings, then tools on `PATH`.
  pub fn render(&self, shell: Shell) -> Result<String, PathJoinError> {
    let mut lines = vec![shell.comment(&format!("devshell environment for {}", self.platform))];
    for binding in &self.bindings {
      lines.push(shell.export_var(&binding.name, &binding.value));
    }
    if !self.tool_paths.is_empty() {
      lines.push(shell.prepend_path("PATH", &self.tool_paths.join(self.platform.path_list_separator())?));
    }
    lines.push(String::new());
    Ok(lines.join("\n"))
  }

  /// Variables to set on a child session process.
  ///
  /// `host_path` is the launcher's own `PATH`; tool directories go in front of it.
  pub fn session_vars(&self, host_path: Option<&str>) -> Result<Vec<(String, String)>, PathJoinError> {
    let mut vars: Vec<(String, String)> = self
      .bindings
      .iter()
      .map(|b| (b.name.clone(), b.value.clone()))
      .collect();

    if !self.tool_paths.is_empty() {
      let separator = self.platform.path_list_separator();
      let mut path = self.tool_paths.join(separator)?;
      if let Some(host) = host_path.filter(|p| !p.is_empty()) {
        path.push(separator);
        path.push_str(host);
      }
      vars.push(("PATH".to_string(), path));
    }
    Ok(vars)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::Role;
  use crate::platform::{Arch, Os};
  use crate::resolve::StaticResolver;
  use std::path::PathBuf;
  use tracing_test::traced_test;

  fn linux() -> Platform {
    "linux-x86_64".parse().unwrap()
  }

  fn mac() -> Platform {
    "macos-arm64".parse().unwrap()
  }

  fn toolchain() -> Toolchain {
    Toolchain::new("rust-src")
      .with_tool("cargo", ToolRole::Build)
      .with_tool("rust-analyzer", ToolRole::Interactive)
  }

  fn scenario() -> Vec<DependencyDescriptor> {
    vec![
      DependencyDescriptor::new("compiler", Role::Build),
      DependencyDescriptor::new("graphics", Role::Both),
      DependencyDescriptor::new("windowing", Role::Runtime),
    ]
  }

  fn resolver() -> StaticResolver {
    resolver_without(None)
  }

  fn resolver_without(skip: Option<&str>) -> StaticResolver {
    let mut r = StaticResolver::new();
    for p in [linux(), mac()] {
      r.insert(ResolvedPackage::new("rust-src", p, "/store/rust-src").with_src("lib/rustlib/src/rust/library"));
      r.insert(ResolvedPackage::new("cargo", p, "/store/cargo").with_bin("bin"));
      if skip != Some("rust-analyzer") {
        r.insert(ResolvedPackage::new("rust-analyzer", p, "/store/ra").with_bin("bin"));
      }
      r.insert(ResolvedPackage::new("compiler", p, "/store/cc").with_include("include"));
      r.insert(ResolvedPackage::new("graphics", p, "/store/gfx").with_lib("lib"));
    }
    r.insert(ResolvedPackage::new("windowing", linux(), "/store/win").with_lib("lib"));
    r
  }

  fn paths(set: &PathSet) -> Vec<&str> {
    set.iter().map(|p| p.to_str().unwrap()).collect()
  }

  #[test]
  fn linux_scenario_partitions_by_role() {
    let env = assemble(&scenario(), &toolchain(), linux(), &resolver()).unwrap();

    assert_eq!(paths(&env.loader_paths), vec!["/store/gfx/lib", "/store/win/lib"]);
    assert_eq!(paths(&env.compile_paths), vec!["/store/cc/include", "/store/gfx/lib"]);
    assert_eq!(env.bindings.get(LOADER_PATH_VAR), Some("/store/gfx/lib:/store/win/lib"));
    assert_eq!(
      env.bindings.get(RUST_SRC_PATH_VAR),
      Some("/store/rust-src/lib/rustlib/src/rust/library")
    );
  }

  #[test]
  fn include_and_library_dirs_split_for_builds() {
    let env = assemble(&scenario(), &toolchain(), linux(), &resolver()).unwrap();

    assert_eq!(paths(&env.include_paths), vec!["/store/cc/include"]);
    assert_eq!(paths(&env.link_paths), vec!["/store/gfx/lib"]);
  }

  #[test]
  fn build_toolchain_skips_unmapped_interactive_tools() {
    let r = resolver_without(Some("rust-analyzer"));

    let err = assemble(&scenario(), &toolchain(), linux(), &r).unwrap_err();
    assert!(matches!(err, AssembleError::UnresolvedDependency { ref name, .. } if name == "rust-analyzer"));

    let env = assemble(&scenario(), &toolchain().for_build(), linux(), &r).unwrap();
    assert_eq!(paths(&env.build_tool_paths), vec!["/store/cargo/bin"]);
    assert_eq!(paths(&env.tool_paths), vec!["/store/cargo/bin"]);
  }

  #[test]
  fn missing_mapping_is_unresolved_dependency() {
    let err = assemble(&scenario(), &toolchain(), mac(), &resolver()).unwrap_err();
    match err {
      AssembleError::UnresolvedDependency { name, platform } => {
        assert_eq!(name, "windowing");
        assert_eq!(platform, mac());
      }
      other => panic!("expected UnresolvedDependency, got {other:?}"),
    }
  }

  #[test]
  fn repeated_assembly_is_identical() {
    let r = resolver();
    let a = assemble(&scenario(), &toolchain(), linux(), &r).unwrap();
    let b = assemble(&scenario(), &toolchain(), linux(), &r).unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_vec(&a).unwrap(), serde_json::to_vec(&b).unwrap());
  }

  #[test]
  fn shared_lib_dirs_are_deduplicated() {
    let mut r = resolver();
    // Two packages that install into the same prefix
    r.insert(ResolvedPackage::new("xcursor", linux(), "/store/x11").with_lib("lib"));
    r.insert(ResolvedPackage::new("xrandr", linux(), "/store/x11").with_lib("lib"));
    let deps = vec![
      DependencyDescriptor::new("xcursor", Role::Runtime),
      DependencyDescriptor::new("graphics", Role::Both),
      DependencyDescriptor::new("xrandr", Role::Runtime),
    ];

    let env = assemble(&deps, &toolchain(), linux(), &r).unwrap();
    assert_eq!(paths(&env.loader_paths), vec!["/store/x11/lib", "/store/gfx/lib"]);
  }

  #[test]
  fn undeclared_platforms_skip_the_descriptor() {
    let deps = vec![
      DependencyDescriptor::new("graphics", Role::Both),
      DependencyDescriptor::new("windowing", Role::Runtime).only_on(&[linux()]),
    ];
    let env = assemble(&deps, &toolchain(), mac(), &resolver()).unwrap();
    assert_eq!(paths(&env.loader_paths), vec!["/store/gfx/lib"]);
  }

  #[test]
  fn unresolvable_toolchain_is_resolution_failure() {
    let r = resolver();
    let bad = Toolchain::new("rust-src").with_tool("rustfmt", ToolRole::Interactive);
    let err = assemble(&scenario(), &bad, linux(), &r).unwrap_err();
    assert!(matches!(
      err,
      AssembleError::ResolutionFailure(ResolveError::NoMapping { ref name, .. }) if name == "rustfmt"
    ));
  }

  #[test]
  fn runtime_role_without_lib_dir_fails() {
    let deps = vec![DependencyDescriptor::new("compiler", Role::Runtime)];
    let err = assemble(&deps, &toolchain(), linux(), &resolver()).unwrap_err();
    assert!(matches!(err, AssembleError::MissingOutput { output: "lib", .. }));
  }

  #[test]
  fn tool_paths_split_by_role() {
    let env = assemble(&[], &toolchain(), linux(), &resolver()).unwrap();
    assert_eq!(paths(&env.build_tool_paths), vec!["/store/cargo/bin"]);
    assert_eq!(paths(&env.tool_paths), vec!["/store/cargo/bin", "/store/ra/bin"]);
    assert_eq!(env.bindings.get(LOADER_PATH_VAR), Some(""));
    assert_eq!(env.bindings.len(), 2);
  }

  #[test]
  fn windows_joins_with_semicolons() {
    let win = Platform::new(Arch::X86_64, Os::Windows);
    let r = StaticResolver::new()
      .with(ResolvedPackage::new("rust-src", win, r"C:\store\rust-src"))
      .with(ResolvedPackage::new("a", win, r"C:\store\a").with_lib("lib"))
      .with(ResolvedPackage::new("b", win, r"C:\store\b").with_lib("lib"));
    let deps = vec![
      DependencyDescriptor::new("a", Role::Runtime),
      DependencyDescriptor::new("b", Role::Runtime),
    ];

    let env = assemble(&deps, &Toolchain::new("rust-src"), win, &r).unwrap();
    let value = env.bindings.get(LOADER_PATH_VAR).unwrap();
    assert_eq!(value.matches(';').count(), 1);
    // No src dir: the store path itself is the source location
    assert_eq!(env.bindings.get(RUST_SRC_PATH_VAR), Some(r"C:\store\rust-src"));
  }

  #[test]
  fn render_exports_bindings_then_path() {
    let env = assemble(&scenario(), &toolchain(), linux(), &resolver()).unwrap();
    let script = env.render(Shell::Bash).unwrap();
    let lines: Vec<_> = script.lines().collect();

    assert_eq!(lines[1], "export RUST_SRC_PATH='/store/rust-src/lib/rustlib/src/rust/library'");
    assert_eq!(lines[2], "export LD_LIBRARY_PATH='/store/gfx/lib:/store/win/lib'");
    assert!(lines[3].starts_with("export PATH='/store/cargo/bin:/store/ra/bin'"));
  }

  #[test]
  fn session_vars_prefix_host_path() {
    let env = assemble(&scenario(), &toolchain(), linux(), &resolver()).unwrap();
    let vars = env.session_vars(Some("/usr/bin")).unwrap();
    let path = vars.iter().find(|(k, _)| k == "PATH").map(|(_, v)| v.as_str());
    assert_eq!(path, Some("/store/cargo/bin:/store/ra/bin:/usr/bin"));
    assert_eq!(vars[0].0, RUST_SRC_PATH_VAR);
    assert_eq!(vars[1].0, LOADER_PATH_VAR);
  }

  #[test]
  #[traced_test]
  fn assembly_is_logged() {
    assemble(&scenario(), &toolchain(), linux(), &resolver()).unwrap();
    assert!(logs_contain("assembled environment"));
  }

  #[test]
  fn include_dirs_precede_lib_dirs_per_package() {
    let r = resolver().with(
      ResolvedPackage::new("alsa-lib", linux(), "/store/alsa")
        .with_lib("lib")
        .with_include(PathBuf::from("/store/alsa-dev/include")),
    );
    let deps = vec![DependencyDescriptor::new("alsa-lib", Role::Build)];
    let env = assemble(&deps, &toolchain(), linux(), &r).unwrap();
    assert_eq!(paths(&env.compile_paths), vec!["/store/alsa-dev/include", "/store/alsa/lib"]);
    assert!(env.loader_paths.is_empty());
  }
}
