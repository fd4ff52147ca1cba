//! Toolchain adapters.
//!
//! The toolchain fetches, builds and installs packages and reports their
//! dependencies. Every call receives the [`ExecContext`] it must run in.

pub mod go;

use std::path::Path;

use anyhow::Result;

use crate::util::env::ExecContext;

pub use go::GoToolchain;

/// Dependencies reported for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    /// Import path of the listed package, when the toolchain knows it
    pub import_path: Option<String>,

    /// Full transitive dependency list
    pub deps: Vec<String>,

    /// Imports only needed by tests
    pub test_deps: Vec<String>,
}

impl DependencyList {
    /// Regular and test dependencies together.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.deps
            .iter()
            .chain(self.test_deps.iter())
            .map(String::as_str)
    }
}

/// Build-tool operations on packages in a workspace.
pub trait Toolchain {
    /// Download a package's source without building it.
    fn fetch_source(&self, ctx: &ExecContext, import_path: &str) -> Result<()>;

    /// Download everything a package (and its sub-packages) imports.
    fn fetch_transitive_deps(&self, ctx: &ExecContext, import_path: &str, dir: &Path)
        -> Result<()>;

    /// Compile a package.
    fn build(&self, ctx: &ExecContext, import_path: &str) -> Result<()>;

    /// Install a package's archive or binary into the workspace.
    fn install(&self, ctx: &ExecContext, import_path: &str) -> Result<()>;

    /// List a package's dependencies. `target` is an import path or a
    /// relative pattern such as `.`, resolved from `dir`.
    fn list_dependencies(&self, ctx: &ExecContext, target: &str, dir: &Path)
        -> Result<DependencyList>;
}

/// Whether an import path belongs to the standard library.
///
/// Third-party import paths start with a host name; standard ones never
/// contain a dot in their first segment.
pub fn is_standard_import(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or_default();
    !first.contains('.')
}
