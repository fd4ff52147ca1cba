//! Implementation of `bunch generate`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::core::package::SELF_MARKER;
use crate::core::{Manifest, Package};
use crate::ops::graph::is_within;
use crate::toolchain::{is_standard_import, Toolchain};
use crate::util::env::ExecContext;

/// Build a manifest for the package in `dir` from what it imports.
///
/// The package itself becomes a `!self` entry, followed by one entry per
/// third-party base import path.
pub fn generate(toolchain: &dyn Toolchain, ctx: &ExecContext, dir: &Path) -> Result<Manifest> {
    let listing = toolchain
        .list_dependencies(ctx, ".", dir)
        .with_context(|| format!("failed listing imports of {}", dir.display()))?;

    let self_path = match listing.import_path.clone() {
        // Directories outside every GOPATH list as `_/<absolute path>`.
        Some(path) if !path.starts_with("_/") => path,
        _ => bail!("{} is not a package inside a GOPATH workspace", dir.display()),
    };

    let mut manifest = Manifest::new(dir);
    manifest.add_package(Package::from_spec(self_path.as_str(), SELF_MARKER, dir));

    let imports: Vec<&str> = listing
        .all()
        .filter(|import| !is_standard_import(import))
        .collect();
    for base in filter_common_base_packages(&imports, &self_path) {
        debug!("adding {}", base);
        manifest.add_package(Package::new(base, ""));
    }

    Ok(manifest)
}

/// Reduce import paths to their common bases.
///
/// Paths inside `self_base` are dropped, as is any path nested under another
/// listed path. Order of first appearance is kept.
pub fn filter_common_base_packages(imports: &[&str], self_base: &str) -> Vec<String> {
    let mut bases: Vec<String> = Vec::new();

    for import in imports {
        if is_within(import, self_base) || bases.iter().any(|base| base == import) {
            continue;
        }

        let nested = imports
            .iter()
            .any(|other| other != import && is_within(import, other));
        if !nested {
            bases.push(import.to_string());
        }
    }

    bases
}
