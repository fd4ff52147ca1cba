//! Bunch - npm-like dependency management for Go workspaces
//!
//! This crate provides the core library functionality for Bunch: the
//! Bunchfile and lockfile formats, version resolution against VCS
//! checkouts, and the install, uninstall and prune pipelines.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod toolchain;
pub mod util;
pub mod vcs;

/// Test utilities and mocks for Bunch unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides in-memory VCS and toolchain adapters.
#[cfg(test)]
pub mod test_support;

pub use core::{Lockfile, Manifest, Package, Workspace};

pub use resolver::VersionResolver;
pub use util::context::GlobalContext;
