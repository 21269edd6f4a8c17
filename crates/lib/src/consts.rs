//! Names and constants shared across the crate.
//!
//! The environment variable names here are consumed by editors and linkers
//! outside this project and must not change.

pub const APP_NAME: &str = "devshell";

/// Length of the truncated hex digest used for store directory names.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Binding holding the toolchain's bundled library source (for rust-analyzer).
pub const RUST_SRC_PATH_VAR: &str = "RUST_SRC_PATH";

/// Binding holding the dynamic loader search path.
pub const LOADER_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Default project manifest file name.
pub const MANIFEST_FILE: &str = "devshell.toml";

/// Default package index file name, looked up next to the manifest.
pub const INDEX_FILE: &str = "packages.toml";

/// Overrides the store root.
pub const STORE_ENV: &str = "DEVSHELL_STORE";

/// Overrides the package index location.
pub const INDEX_ENV: &str = "DEVSHELL_INDEX";

/// Marker written into a build output once it is complete.
pub const BUILD_COMPLETE_MARKER: &str = ".devshell-complete";
