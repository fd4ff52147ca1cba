//! Implementation of `bunch install`, `bunch update` and `bunch rebuild`.
//!
//! Installation runs in two passes over the package list. The first pass
//! materializes links and fetches whatever is stale; the second pins each
//! flagged checkout to its final revision and builds and installs it.
//! The first failure aborts the run; nothing is rolled back.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::{Package, Workspace};
use crate::resolver::VersionResolver;
use crate::toolchain::Toolchain;
use crate::util::env::ExecContext;
use crate::util::fs;
use crate::vcs::VcsDetect;

/// Options for an install run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstallOptions {
    /// Reinstall every package, current or not
    pub force_update: bool,

    /// Fetch stale packages from upstream before building
    pub check_upstream: bool,

    /// Prefer lockfile revisions over spec resolution
    pub respect_lock: bool,
}

impl InstallOptions {
    /// `bunch install`: only stale packages, honoring the lockfile.
    pub fn install() -> Self {
        InstallOptions {
            force_update: false,
            check_upstream: true,
            respect_lock: true,
        }
    }

    /// `bunch update`: everything, re-resolved from specs.
    pub fn update() -> Self {
        InstallOptions {
            force_update: true,
            check_upstream: true,
            respect_lock: false,
        }
    }

    /// `bunch rebuild`: everything, from what is already on disk.
    pub fn rebuild() -> Self {
        InstallOptions {
            force_update: true,
            check_upstream: false,
            respect_lock: true,
        }
    }
}

/// Furthest state a package reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstallState {
    Absent,
    Fetched,
    VersionPinned,
    Built,
    Installed,
    Linked,
}

/// Result for a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    pub repo: String,
    pub state: InstallState,

    /// Revision checked out in pass 2
    pub revision: Option<String>,

    /// Whether the package was flagged for (re)installation
    pub updated: bool,

    /// Whether a link was created in this run
    pub link_created: bool,
}

/// Result of an install run.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub packages: Vec<PackageOutcome>,
}

impl InstallReport {
    /// Packages that went through pass 2.
    pub fn updated(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.packages.iter().filter(|p| p.updated)
    }

    /// Whether nothing needed doing.
    pub fn is_up_to_date(&self) -> bool {
        self.packages
            .iter()
            .all(|p| !p.updated && !p.link_created)
    }

    pub fn get(&self, repo: &str) -> Option<&PackageOutcome> {
        self.packages.iter().find(|p| p.repo == repo)
    }
}

/// Drives fetch, pin, build and install through the adapters.
pub struct Installer<'a> {
    ws: &'a Workspace,
    vcs: &'a dyn VcsDetect,
    toolchain: &'a dyn Toolchain,
    ctx: &'a ExecContext,
}

impl<'a> Installer<'a> {
    pub fn new(
        ws: &'a Workspace,
        vcs: &'a dyn VcsDetect,
        toolchain: &'a dyn Toolchain,
        ctx: &'a ExecContext,
    ) -> Self {
        Installer {
            ws,
            vcs,
            toolchain,
            ctx,
        }
    }

    /// Install `packages` into the workspace.
    pub fn install(&self, packages: &[Package], opts: &InstallOptions) -> Result<InstallReport> {
        self.ws.ensure_layout()?;
        let resolver = VersionResolver::new(self.ws, self.vcs);

        let mut outcomes = Vec::with_capacity(packages.len());
        for pkg in packages {
            let outcome = self
                .fetch_pass(&resolver, pkg, opts)
                .with_context(|| format!("failed fetching package {}", pkg.repo))?;
            outcomes.push(outcome);
        }

        for (pkg, outcome) in packages.iter().zip(outcomes.iter_mut()) {
            if !outcome.updated {
                debug!("{} is up to date", pkg.repo);
                continue;
            }
            self.install_pass(&resolver, pkg, outcome, opts)
                .with_context(|| format!("failed installing package {}", pkg.repo))?;
        }

        Ok(InstallReport { packages: outcomes })
    }

    fn fetch_pass(
        &self,
        resolver: &VersionResolver<'_>,
        pkg: &Package,
        opts: &InstallOptions,
    ) -> Result<PackageOutcome> {
        let mut outcome = PackageOutcome {
            repo: pkg.repo.clone(),
            state: InstallState::Absent,
            revision: None,
            updated: false,
            link_created: false,
        };

        if pkg.is_link() {
            outcome.link_created = self.materialize_link(pkg)?;
            outcome.state = InstallState::Linked;
            outcome.updated = !pkg.is_self() && (outcome.link_created || opts.force_update);
            return Ok(outcome);
        }

        let (needs_update, _) = resolver.check_recency(pkg)?;
        outcome.updated = needs_update || opts.force_update;
        if self.ws.contains(&pkg.repo) {
            outcome.state = InstallState::Fetched;
        }

        if outcome.updated && opts.check_upstream {
            self.fetch(resolver, pkg)?;
            outcome.state = InstallState::Fetched;
        }

        Ok(outcome)
    }

    /// Create the workspace symlink for a link package. Returns whether it
    /// was created.
    fn materialize_link(&self, pkg: &Package) -> Result<bool> {
        let Some(target) = pkg.link_target() else {
            return Ok(false);
        };

        let dest = self.ws.package_dir(&pkg.repo);
        if fs::exists_no_follow(&dest) {
            return Ok(false);
        }

        if let Some(parent) = dest.parent() {
            fs::ensure_dir(parent)?;
        }
        fs::symlink_dir(target, &dest).with_context(|| {
            format!(
                "failed to link {} to {}",
                dest.display(),
                target.display()
            )
        })?;
        info!("linked {} -> {}", pkg.repo, target.display());
        Ok(true)
    }

    fn fetch(&self, resolver: &VersionResolver<'_>, pkg: &Package) -> Result<()> {
        if !self.ws.contains(&pkg.repo) {
            info!("fetching {}", pkg.repo);
            self.toolchain.fetch_source(self.ctx, &pkg.repo)?;
        } else if let Some((root, vcs)) = resolver.repository_root(&pkg.repo) {
            info!("refreshing {} ({})", pkg.repo, vcs.kind());
            vcs.fetch(&root)?;
        } else {
            debug!("{} has no repository to refresh", pkg.repo);
        }

        self.toolchain
            .fetch_transitive_deps(self.ctx, &pkg.repo, &self.ws.package_dir(&pkg.repo))
    }

    fn install_pass(
        &self,
        resolver: &VersionResolver<'_>,
        pkg: &Package,
        outcome: &mut PackageOutcome,
        opts: &InstallOptions,
    ) -> Result<()> {
        if pkg.is_self() {
            return Ok(());
        }

        if !pkg.is_link() {
            let revision = match (&pkg.locked_revision, opts.respect_lock) {
                (Some(locked), true) => locked.clone(),
                _ => resolver.resolve(&pkg.repo, &pkg.version_spec)?,
            };

            match resolver.repository_root(&pkg.repo) {
                Some((root, vcs)) if !revision.is_empty() => {
                    debug!("pinning {} to {}", pkg.repo, revision);
                    vcs.set_revision(&root, &revision)?;
                    outcome.revision = Some(revision);
                    outcome.state = InstallState::VersionPinned;
                }
                _ => debug!("{} has no checkout to pin", pkg.repo),
            }
        }

        info!("installing {}", pkg.repo);
        self.toolchain.build(self.ctx, &pkg.repo)?;
        outcome.state = InstallState::Built;
        self.toolchain.install(self.ctx, &pkg.repo)?;
        outcome.state = InstallState::Installed;
        Ok(())
    }
}
