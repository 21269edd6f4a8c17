//! Template content for `devshell init`.

/// Starting `devshell.toml`: a Rust toolchain plus the native libraries a
/// windowed, audio-capable game editor links and loads on Linux.
pub const MANIFEST_TEMPLATE: &str = r#"# devshell project manifest
#
# `devshell env` prints the environment for this project, `devshell shell`
# opens a session with it, and `devshell build` builds the default package.

name = "{name}"

[toolchain]
# Package holding the toolchain's bundled library source (RUST_SRC_PATH).
source = "rust-src"
manifest = "Cargo.toml"
command = 'CARGO_HOME="$TMPDIR/cargo" cargo build --release --target-dir "$out/target"'

[[toolchain.tools]]
name = "rustc"
role = "build"

[[toolchain.tools]]
name = "cargo"
role = "build"

[[toolchain.tools]]
name = "rust-analyzer"
role = "interactive"

[[toolchain.tools]]
name = "rustfmt"
role = "interactive"

[[toolchain.tools]]
name = "clippy"
role = "interactive"

[[toolchain.tools]]
name = "bacon"
role = "interactive"

# Roles: "build" feeds compile and link paths, "runtime" feeds the dynamic
# loader path, "both" feeds both.

[[dependencies]]
name = "pkg-config"
role = "build"

[[dependencies]]
name = "alsa-lib"
role = "both"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "udev"
role = "both"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "vulkan-loader"
role = "runtime"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "wayland"
role = "runtime"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "libxkbcommon"
role = "runtime"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "libX11"
role = "runtime"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "libXcursor"
role = "runtime"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "libXi"
role = "runtime"
platforms = ["x86_64-linux", "aarch64-linux"]

[[dependencies]]
name = "libXrandr"
role = "runtime"
platforms = ["x86_64-linux", "aarch64-linux"]
"#;

/// Starting `packages.toml`. Entries are normally written by the package
/// manager that pins the revisions; the example is left commented out.
pub const INDEX_TEMPLATE: &str = r#"# devshell package index
#
# One table per package and platform key. `path` must exist on disk; the
# optional sub-locations are relative to it or absolute.
#
# [packages.alsa-lib.x86_64-linux]
# path = "/nix/store/...-alsa-lib-1.2.12"
# include = "/nix/store/...-alsa-lib-1.2.12-dev/include"
# lib = "lib"
#
# [packages.cargo.x86_64-linux]
# path = "/nix/store/...-cargo-1.82.0"
# bin = "bin"
#
# [packages.rust-src.x86_64-linux]
# path = "/nix/store/...-rust-src-1.82.0"
# src = "lib/rustlib/src/rust/library"

[packages]
"#;
