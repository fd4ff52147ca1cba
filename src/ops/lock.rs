//! Implementation of `bunch lock`.

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::{Lockfile, Manifest};
use crate::resolver::VersionResolver;

/// Result of locking a manifest.
#[derive(Debug, Clone, Default)]
pub struct LockReport {
    pub lockfile: Lockfile,

    /// Packages locked to their spec because they are not checked out
    pub not_installed: Vec<String>,
}

/// Pin every non-link package in the manifest to the revision its spec
/// resolves to right now.
pub fn lock(manifest: &Manifest, resolver: &VersionResolver<'_>) -> Result<LockReport> {
    let mut report = LockReport::default();

    for pkg in manifest.packages() {
        if pkg.is_link() {
            debug!("not locking link {}", pkg.repo);
            continue;
        }

        if !resolver.workspace().contains(&pkg.repo) {
            report.not_installed.push(pkg.repo.clone());
        }

        let revision = resolver
            .resolve(&pkg.repo, &pkg.version_spec)
            .with_context(|| format!("failed locking package {}", pkg.repo))?;
        report.lockfile.insert(pkg.repo.clone(), revision);
    }

    Ok(report)
}
