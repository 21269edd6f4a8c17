//! End-to-end assembly over the scaffolded manifest and a file-backed index.

use std::fmt::Write;
use std::path::Path;

use devshell_lib::consts::{LOADER_PATH_VAR, RUST_SRC_PATH_VAR};
use devshell_lib::env::{AssembleError, Shell, assemble};
use devshell_lib::init::MANIFEST_TEMPLATE;
use devshell_lib::manifest::ProjectManifest;
use devshell_lib::platform::Platform;
use devshell_lib::resolve::PackageIndex;

const LINUX_LIBS: &[&str] = &[
  "alsa-lib",
  "udev",
  "vulkan-loader",
  "wayland",
  "libxkbcommon",
  "libX11",
  "libXcursor",
  "libXi",
  "libXrandr",
];

const TOOLS: &[&str] = &["rustc", "cargo", "rust-analyzer", "rustfmt", "clippy", "bacon"];

fn manifest() -> ProjectManifest {
  ProjectManifest::parse(&MANIFEST_TEMPLATE.replace("{name}", "level-editor"), Path::new("devshell.toml")).unwrap()
}

/// An index mapping the toolchain and pkg-config everywhere, and the native
/// libraries on linux only.
fn index() -> PackageIndex {
  let mut content = String::new();
  for platform in ["x86_64-linux", "aarch64-linux", "aarch64-darwin"] {
    writeln!(content, "[packages.rust-src.{platform}]\npath = \"/store/{platform}/rust-src\"\nsrc = \"library\"\n").unwrap();
    writeln!(content, "[packages.pkg-config.{platform}]\npath = \"/store/{platform}/pkg-config\"\nlib = \"lib\"\n").unwrap();
    for tool in TOOLS {
      writeln!(content, "[packages.{tool}.{platform}]\npath = \"/store/{platform}/{tool}\"\nbin = \"bin\"\n").unwrap();
    }
    if platform.ends_with("linux") {
      for lib in LINUX_LIBS {
        writeln!(
          content,
          "[packages.{lib}.{platform}]\npath = \"/store/{platform}/{lib}\"\ninclude = \"include\"\nlib = \"lib\"\n"
        )
        .unwrap();
      }
    }
  }
  PackageIndex::parse(&content, Path::new("packages.toml"))
    .unwrap()
    .trusting_paths()
}

#[cfg(unix)]
#[test]
fn linux_environment_covers_every_native_library() {
  let manifest = manifest();
  let platform: Platform = "x86_64-linux".parse().unwrap();

  let env = assemble(&manifest.dependencies, &manifest.toolchain, platform, &index()).unwrap();

  // pkg-config lib, then include+lib for alsa-lib and udev
  assert_eq!(env.compile_paths.len(), 5);
  assert_eq!(env.loader_paths.len(), LINUX_LIBS.len());
  assert_eq!(env.tool_paths.len(), TOOLS.len());
  assert_eq!(env.build_tool_paths.len(), 2);

  assert_eq!(
    env.bindings.get(RUST_SRC_PATH_VAR),
    Some("/store/x86_64-linux/rust-src/library")
  );
  let loader = env.bindings.get(LOADER_PATH_VAR).unwrap();
  assert!(loader.starts_with("/store/x86_64-linux/alsa-lib/lib:/store/x86_64-linux/udev/lib:"));
  assert!(loader.ends_with("/store/x86_64-linux/libXrandr/lib"));
}

#[cfg(unix)]
#[test]
fn darwin_declares_no_linux_libraries() {
  let manifest = manifest();
  let platform: Platform = "aarch64-darwin".parse().unwrap();

  let env = assemble(&manifest.dependencies, &manifest.toolchain, platform, &index()).unwrap();

  assert!(env.loader_paths.is_empty());
  assert_eq!(env.bindings.get(LOADER_PATH_VAR), Some(""));
  assert_eq!(env.compile_paths.len(), 1);
}

#[test]
fn platform_absent_from_index_fails_whole_assembly() {
  let manifest = manifest();
  let platform: Platform = "x86_64-darwin".parse().unwrap();

  let err = assemble(&manifest.dependencies, &manifest.toolchain, platform, &index()).unwrap_err();
  match err {
    AssembleError::UnresolvedDependency { name, platform: p } => {
      assert_eq!(name, "pkg-config");
      assert_eq!(p, platform);
    }
    other => panic!("expected UnresolvedDependency, got {other:?}"),
  }
}

#[cfg(unix)]
#[test]
fn same_inputs_render_identical_scripts() {
  let manifest = manifest();
  let platform: Platform = "aarch64-linux".parse().unwrap();

  let first = assemble(&manifest.dependencies, &manifest.toolchain, platform, &index()).unwrap();
  let second = assemble(&manifest.dependencies, &manifest.toolchain, platform, &index()).unwrap();

  assert_eq!(first, second);
  assert_eq!(first.render(Shell::Bash).unwrap(), second.render(Shell::Bash).unwrap());
}
