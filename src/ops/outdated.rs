//! Implementation of `bunch outdated`.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::Manifest;
use crate::resolver::{RecencyInfo, VersionResolver};

/// Options for an outdated check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutdatedOptions {
    /// Fetch upstream history before comparing
    pub fetch: bool,
}

impl Default for OutdatedOptions {
    fn default() -> Self {
        OutdatedOptions { fetch: true }
    }
}

/// Recency of one manifest package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedEntry {
    pub repo: String,
    pub installed: bool,
    pub needs_update: bool,
    pub info: RecencyInfo,
}

impl OutdatedEntry {
    /// Whether the package is stale or behind its upstream tip.
    pub fn is_outdated(&self) -> bool {
        self.needs_update || self.info.commits_behind_upstream > 0
    }
}

/// Check every non-link manifest package against its spec and upstream.
pub fn outdated(
    manifest: &Manifest,
    resolver: &VersionResolver<'_>,
    opts: &OutdatedOptions,
) -> Result<Vec<OutdatedEntry>> {
    let mut entries = Vec::new();

    for pkg in manifest.packages().filter(|pkg| !pkg.is_link()) {
        let installed = resolver.workspace().contains(&pkg.repo);

        if opts.fetch {
            if let Some((root, vcs)) = resolver.repository_root(&pkg.repo) {
                info!("fetching {}", pkg.repo);
                vcs.fetch(&root)
                    .with_context(|| format!("failed fetching package {}", pkg.repo))?;
            }
        }

        let (needs_update, info) = resolver
            .check_recency(pkg)
            .with_context(|| format!("failed checking package {}", pkg.repo))?;
        debug!("{}: outdated check done, needs update: {}", pkg.repo, needs_update);

        entries.push(OutdatedEntry {
            repo: pkg.repo.clone(),
            installed,
            needs_update,
            info,
        });
    }

    Ok(entries)
}
