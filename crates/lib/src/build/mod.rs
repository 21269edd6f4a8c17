//! Package builds.
//!
//! A build runs the toolchain's command over a source tree and writes the
//! result to `<store>/build/<hash>/`, where the hash covers every input: the
//! source tree contents, the resolved toolchain, the command and the search
//! paths. Identical inputs always land at the same location, and a completed
//! location is reused instead of rebuilt.
//!
//! # Submodules
//!
//! - [`cmd`] - isolated execution of the build command
//! - [`execute`] - the build entry point
//! - [`lock`] - per-output locks serializing identical builds
//! - [`store`] - output location in the store

pub mod cmd;
pub mod execute;
pub mod lock;
pub mod store;
mod types;

pub use execute::build;
pub use types::*;
