//! Staleness detection for installed packages.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::core::Package;
use crate::resolver::VersionResolver;
use crate::vcs::Vcs;

/// What is known about an installed package's revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecencyInfo {
    /// Revision the version spec resolves to
    pub resolved_revision: Option<String>,

    /// Revision of the upstream tip
    pub upstream_tip_revision: Option<String>,

    /// Revision currently checked out
    pub installed_revision: Option<String>,

    /// Commits between the checkout and the upstream tip
    pub commits_behind_upstream: u64,

    /// Commits between the checkout and the resolved revision
    pub commits_behind_resolved: u64,
}

impl VersionResolver<'_> {
    /// Decide whether a package needs (re)installing.
    ///
    /// A package whose checkout matches its lockfile pin is current even if
    /// its spec would now resolve elsewhere. A missing compiled artifact
    /// always needs an update.
    pub fn check_recency(&self, pkg: &Package) -> Result<(bool, RecencyInfo)> {
        let ws = self.workspace();
        if !ws.contains(&pkg.repo) {
            debug!("{} is not installed", pkg.repo);
            return Ok((true, RecencyInfo::default()));
        }

        let Some((root, vcs)) = self.repository_root(&pkg.repo) else {
            debug!("{} has no repository root", pkg.repo);
            return Ok((true, RecencyInfo::default()));
        };

        let resolved = self.resolve(&pkg.repo, &pkg.version_spec)?;
        let installed = vcs.current_revision(&root)?;
        let upstream = vcs.upstream_revision(&root)?;

        let info = RecencyInfo {
            commits_behind_upstream: upstream
                .as_deref()
                .map_or(0, |tip| count(vcs, &root, &installed, tip)),
            commits_behind_resolved: count(vcs, &root, &installed, &resolved),
            resolved_revision: Some(resolved),
            upstream_tip_revision: upstream,
            installed_revision: Some(installed),
        };

        let locked = pkg.locked_revision.as_deref();
        let installed = info.installed_revision.as_deref();
        let needs_update = if !ws.has_artifact(&pkg.repo) {
            debug!("{} has no compiled artifact", pkg.repo);
            true
        } else if installed != info.resolved_revision.as_deref() {
            locked != installed
        } else {
            locked.is_some_and(|locked| Some(locked) != installed)
        };

        debug!(
            "{}: installed {:?}, resolved {:?}, needs update: {}",
            pkg.repo, installed, info.resolved_revision, needs_update
        );
        Ok((needs_update, info))
    }
}

fn count(vcs: &dyn Vcs, root: &Path, from: &str, to: &str) -> u64 {
    vcs.diff_count(root, from, to).ok().flatten().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockVcs, WorkspaceFixture};

    const REPO: &str = "example.org/lib";

    /// A checked-out repository with history r1..r3, tags v1.0.0 (r1) and
    /// v1.1.0 (r2), checked out at r1 with a compiled archive.
    fn setup() -> (WorkspaceFixture, MockVcs) {
        let fixture = WorkspaceFixture::new();
        let vcs = MockVcs::new();
        let root = fixture.ws.package_dir(REPO);
        vcs.add_repo(&root);
        vcs.commit(&root, "r1");
        vcs.tag(&root, "v1.0.0", "r1");
        vcs.commit(&root, "r2");
        vcs.tag(&root, "v1.1.0", "r2");
        vcs.commit(&root, "r3");
        vcs.set_head(&root, "r1");
        fixture.add_artifact(REPO);
        (fixture, vcs)
    }

    #[test]
    fn test_absent_package_needs_update() {
        let fixture = WorkspaceFixture::new();
        let vcs = MockVcs::new();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let (needs, info) = resolver.check_recency(&Package::new(REPO, "")).unwrap();
        assert!(needs);
        assert_eq!(info, RecencyInfo::default());
    }

    #[test]
    fn test_package_without_vcs_needs_update() {
        let fixture = WorkspaceFixture::new();
        std::fs::create_dir_all(fixture.ws.package_dir(REPO)).unwrap();
        fixture.add_artifact(REPO);
        let vcs = MockVcs::new();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let (needs, _) = resolver.check_recency(&Package::new(REPO, "")).unwrap();
        assert!(needs);
    }

    #[test]
    fn test_current_package_is_up_to_date() {
        let (fixture, vcs) = setup();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let (needs, info) = resolver.check_recency(&Package::new(REPO, "v1.0.0")).unwrap();

        assert!(!needs);
        assert_eq!(info.installed_revision.as_deref(), Some("r1"));
        assert_eq!(info.resolved_revision.as_deref(), Some("r1"));
        assert_eq!(info.upstream_tip_revision.as_deref(), Some("r3"));
        assert_eq!(info.commits_behind_upstream, 2);
        assert_eq!(info.commits_behind_resolved, 0);
    }

    #[test]
    fn test_spec_moved_needs_update() {
        let (fixture, vcs) = setup();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let (needs, info) = resolver.check_recency(&Package::new(REPO, "~> 1.0")).unwrap();

        assert!(needs);
        assert_eq!(info.resolved_revision.as_deref(), Some("r2"));
        assert_eq!(info.commits_behind_resolved, 1);
    }

    #[test]
    fn test_lock_matching_installed_is_never_stale() {
        let (fixture, vcs) = setup();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let mut pkg = Package::new(REPO, "~> 1.0");
        pkg.locked_revision = Some("r1".to_string());

        let (needs, info) = resolver.check_recency(&pkg).unwrap();
        assert!(!needs);
        assert_eq!(info.resolved_revision.as_deref(), Some("r2"));
    }

    #[test]
    fn test_lock_differing_from_installed_needs_update() {
        let (fixture, vcs) = setup();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let mut pkg = Package::new(REPO, "v1.0.0");
        pkg.locked_revision = Some("r2".to_string());

        let (needs, _) = resolver.check_recency(&pkg).unwrap();
        assert!(needs);
    }

    #[test]
    fn test_missing_artifact_needs_update() {
        let (fixture, vcs) = setup();
        std::fs::remove_file(fixture.ws.artifact_path(REPO)).unwrap();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let mut pkg = Package::new(REPO, "v1.0.0");
        pkg.locked_revision = Some("r1".to_string());

        let (needs, _) = resolver.check_recency(&pkg).unwrap();
        assert!(needs);
    }

    #[test]
    fn test_uncomputable_diff_counts_default_to_zero() {
        let (fixture, vcs) = setup();
        let root = fixture.ws.package_dir(REPO);
        vcs.set_upstream(&root, Some("detached"));
        let resolver = VersionResolver::new(&fixture.ws, &vcs);

        let (_, info) = resolver.check_recency(&Package::new(REPO, "v1.0.0")).unwrap();
        assert_eq!(info.upstream_tip_revision.as_deref(), Some("detached"));
        assert_eq!(info.commits_behind_upstream, 0);
    }

    #[test]
    fn test_branch_is_stale_only_after_fetch() {
        let fixture = WorkspaceFixture::new();
        let vcs = MockVcs::new();
        let root = fixture.ws.package_dir(REPO);
        vcs.add_repo(&root);
        vcs.commit(&root, "r1");
        fixture.add_artifact(REPO);
        vcs.push_upstream(&root, "r2");
        let resolver = VersionResolver::new(&fixture.ws, &vcs);
        let pkg = Package::new(REPO, "");

        let (needs, info) = resolver.check_recency(&pkg).unwrap();
        assert!(!needs);
        assert_eq!(info.upstream_tip_revision.as_deref(), Some("r1"));

        vcs.fetch(&root).unwrap();

        let (needs, info) = resolver.check_recency(&pkg).unwrap();
        assert!(needs);
        assert_eq!(info.installed_revision.as_deref(), Some("r1"));
        assert_eq!(info.resolved_revision.as_deref(), Some("r2"));
        assert_eq!(info.upstream_tip_revision.as_deref(), Some("r2"));
        assert_eq!(info.commits_behind_upstream, 1);
        assert_eq!(info.commits_behind_resolved, 1);
    }

    #[test]
    fn test_check_recency_is_idempotent() {
        let (fixture, vcs) = setup();
        let resolver = VersionResolver::new(&fixture.ws, &vcs);
        let pkg = Package::new(REPO, "~> 1.0");

        let first = resolver.check_recency(&pkg).unwrap();
        let second = resolver.check_recency(&pkg).unwrap();
        assert_eq!(first, second);
    }
}
