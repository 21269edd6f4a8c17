//! devshell-lib: environment resolution and package builds for devshell
//!
//! This crate provides the pieces behind the `devshell` CLI:
//! - `Platform`: the (arch, os) key every resolution step is a pure function of
//! - `ProjectManifest`: the declared toolchain and native dependency list
//! - `Resolver`: the interface to the external package resolver
//! - `Environment`: compile/link and loader path sets plus session bindings
//! - `build`: content-addressed builds of the default package

pub mod build;
pub mod consts;
pub mod env;
pub mod init;
pub mod manifest;
pub mod platform;
pub mod resolve;
pub mod util;
