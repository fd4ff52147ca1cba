//! Test utilities and mocks for Bunch unit tests.
//!
//! The mocks stand in for the version-control and toolchain adapters so the
//! resolver, install pipeline and pruner can be exercised against a real
//! temporary workspace without running `git` or `go`.
//!
//! # Example
//!
//! ```rust,ignore
//! use bunch::test_support::{MockToolchain, MockVcs, WorkspaceFixture};
//!
//! #[test]
//! fn test_example() {
//!     let fixture = WorkspaceFixture::new();
//!     let vcs = MockVcs::new();
//!     vcs.add_repo(&fixture.ws.package_dir("example.org/lib"));
//!     vcs.commit(&fixture.ws.package_dir("example.org/lib"), "r1");
//!
//!     let toolchain = MockToolchain::new().with_deps("example.org/app", &["example.org/lib"]);
//!     // Drive the pipeline with &vcs and &toolchain...
//! }
//! ```

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};

use crate::core::Workspace;
use crate::toolchain::{DependencyList, Toolchain};
use crate::util::env::ExecContext;
use crate::vcs::{Vcs, VcsDetect, VcsKind};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Revision given to repositories the mock discovers on disk.
pub const DISCOVERED_REVISION: &str = "initial";

/// In-memory state of one mock repository.
#[derive(Debug, Clone, Default)]
struct MockRepo {
    /// Linear history, oldest first
    history: Vec<String>,
    head: Option<String>,
    /// Remote-tracking tip as of the last fetch
    upstream: Option<String>,
    branches: HashMap<String, String>,
    remote_branches: HashMap<String, String>,
    /// Commits on the remote that have not been fetched yet
    unfetched: Vec<String>,
    tags: Vec<(String, String)>,
    fetches: usize,
    tag_listings: usize,
    checkouts: Vec<String>,
}

impl MockRepo {
    fn discovered() -> Self {
        let mut repo = MockRepo::default();
        repo.commit(DISCOVERED_REVISION);
        repo
    }

    fn commit(&mut self, rev: &str) {
        self.history.push(rev.to_string());
        self.head = Some(rev.to_string());
        self.branches.insert("master".to_string(), rev.to_string());
        self.track(rev);
    }

    fn track(&mut self, rev: &str) {
        self.upstream = Some(rev.to_string());
        self.remote_branches
            .insert("master".to_string(), rev.to_string());
    }

    fn fetch(&mut self) {
        self.fetches += 1;
        for rev in std::mem::take(&mut self.unfetched) {
            self.history.push(rev.clone());
            self.track(&rev);
        }
    }

    fn lookup(&self, reference: &str) -> Option<String> {
        if let Some((_, rev)) = self.tags.iter().find(|(name, _)| name == reference) {
            return Some(rev.clone());
        }
        if let Some(rev) = self.remote_branches.get(reference) {
            return Some(rev.clone());
        }
        if let Some(rev) = self.branches.get(reference) {
            return Some(rev.clone());
        }
        self.history.iter().find(|rev| *rev == reference).cloned()
    }
}

/// Mock version-control backend.
///
/// Repositories are keyed by root directory. Registering one also creates
/// its `.git` marker on disk; unregistered directories that carry a marker
/// are adopted with a single [`DISCOVERED_REVISION`] commit.
#[derive(Debug, Default)]
pub struct MockVcs {
    repos: Mutex<HashMap<PathBuf, MockRepo>>,
}

impl MockVcs {
    /// Create a mock with no repositories.
    pub fn new() -> Self {
        MockVcs::default()
    }

    /// Register an empty repository rooted at `root`.
    pub fn add_repo(&self, root: &Path) {
        std::fs::create_dir_all(root.join(VcsKind::Git.marker())).unwrap();
        self.repos
            .lock()
            .unwrap()
            .insert(root.to_path_buf(), MockRepo::default());
    }

    fn with_repo<R>(&self, root: &Path, f: impl FnOnce(&mut MockRepo) -> R) -> Result<R> {
        let mut repos = self.repos.lock().unwrap();
        let repo = repos
            .get_mut(root)
            .ok_or_else(|| anyhow!("not a repository: {}", root.display()))?;
        Ok(f(repo))
    }

    /// Append a commit on `master` and move the checkout and upstream to it.
    pub fn commit(&self, root: &Path, rev: &str) {
        self.with_repo(root, |repo| repo.commit(rev)).unwrap();
    }

    /// Add a commit to the remote's `master` only. It becomes visible,
    /// without moving the local branch or checkout, on the next fetch.
    pub fn push_upstream(&self, root: &Path, rev: &str) {
        self.with_repo(root, |repo| repo.unfetched.push(rev.to_string()))
            .unwrap();
    }

    /// Tag an existing revision.
    pub fn tag(&self, root: &Path, name: &str, rev: &str) {
        self.with_repo(root, |repo| repo.tags.push((name.to_string(), rev.to_string())))
            .unwrap();
    }

    /// Move the checkout without touching the upstream tip.
    pub fn set_head(&self, root: &Path, rev: &str) {
        self.with_repo(root, |repo| repo.head = Some(rev.to_string()))
            .unwrap();
    }

    /// Override the upstream tip.
    pub fn set_upstream(&self, root: &Path, rev: Option<&str>) {
        self.with_repo(root, |repo| repo.upstream = rev.map(str::to_string))
            .unwrap();
    }

    /// Revision currently checked out.
    pub fn head(&self, root: &Path) -> Option<String> {
        self.with_repo(root, |repo| repo.head.clone()).ok().flatten()
    }

    /// Number of fetches performed.
    pub fn fetches(&self, root: &Path) -> usize {
        self.with_repo(root, |repo| repo.fetches).unwrap_or(0)
    }

    /// Number of times tags were listed.
    pub fn tag_listings(&self, root: &Path) -> usize {
        self.with_repo(root, |repo| repo.tag_listings).unwrap_or(0)
    }

    /// Revisions checked out, in order.
    pub fn checkouts(&self, root: &Path) -> Vec<String> {
        self.with_repo(root, |repo| repo.checkouts.clone())
            .unwrap_or_default()
    }
}

impl Vcs for MockVcs {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn default_branch(&self, _dir: &Path) -> Result<String> {
        Ok("master".to_string())
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        self.with_repo(dir, MockRepo::fetch)
    }

    fn current_revision(&self, dir: &Path) -> Result<String> {
        self.with_repo(dir, |repo| repo.head.clone())?
            .ok_or_else(|| anyhow!("no commits in {}", dir.display()))
    }

    fn upstream_revision(&self, dir: &Path) -> Result<Option<String>> {
        self.with_repo(dir, |repo| repo.upstream.clone())
    }

    fn resolve_ref(&self, dir: &Path, reference: &str) -> Result<Option<String>> {
        self.with_repo(dir, |repo| repo.lookup(reference))
    }

    fn list_tags(&self, dir: &Path) -> Result<Vec<String>> {
        self.with_repo(dir, |repo| {
            repo.tag_listings += 1;
            repo.tags.iter().map(|(name, _)| name.clone()).collect()
        })
    }

    fn set_revision(&self, dir: &Path, revision: &str) -> Result<()> {
        self.with_repo(dir, |repo| match repo.lookup(revision) {
            Some(rev) => {
                repo.head = Some(rev);
                repo.checkouts.push(revision.to_string());
                Ok(())
            }
            None => Err(anyhow!("unknown revision {}", revision)),
        })?
    }

    fn diff_count(&self, dir: &Path, from: &str, to: &str) -> Result<Option<u64>> {
        self.with_repo(dir, |repo| {
            let from = repo.history.iter().position(|rev| rev == from)?;
            let to = repo.history.iter().position(|rev| rev == to)?;
            Some(to.saturating_sub(from) as u64)
        })
    }
}

impl VcsDetect for MockVcs {
    fn detect(&self, dir: &Path) -> Option<&dyn Vcs> {
        let mut repos = self.repos.lock().unwrap();
        if !repos.contains_key(dir) {
            if !dir.join(VcsKind::Git.marker()).is_dir() {
                return None;
            }
            repos.insert(dir.to_path_buf(), MockRepo::discovered());
        }
        Some(self)
    }
}

/// Mock toolchain.
///
/// Records every call as `"<operation> <import path>"`. Fetching creates the
/// package directory with a `.git` marker; installing creates its archive.
#[derive(Debug, Default)]
pub struct MockToolchain {
    deps: HashMap<String, DependencyList>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockToolchain {
    /// Create a toolchain with no dependency information.
    pub fn new() -> Self {
        MockToolchain::default()
    }

    /// Report `deps` as the dependencies of `import_path`.
    pub fn with_deps(mut self, import_path: &str, deps: &[&str]) -> Self {
        self.deps.entry(import_path.to_string()).or_default().deps =
            deps.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Report `path` as the import path `target` lists as.
    pub fn with_import_path(mut self, target: &str, path: &str) -> Self {
        self.deps.entry(target.to_string()).or_default().import_path = Some(path.to_string());
        self
    }

    /// Report `deps` as the test-only dependencies of `import_path`.
    pub fn with_test_deps(mut self, import_path: &str, deps: &[&str]) -> Self {
        self.deps.entry(import_path.to_string()).or_default().test_deps =
            deps.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Make a call (e.g. `"build example.org/lib"`) fail.
    pub fn fail_on(mut self, call: &str) -> Self {
        self.failing.insert(call.to_string());
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls for one import path, without the path.
    pub fn calls_for(&self, import_path: &str) -> Vec<String> {
        let suffix = format!(" {}", import_path);
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_suffix(&suffix).map(str::to_string))
            .collect()
    }

    fn record(&self, operation: &str, import_path: &str) -> Result<()> {
        let call = format!("{} {}", operation, import_path);
        self.calls.lock().unwrap().push(call.clone());
        if self.failing.contains(&call) {
            bail!("mock failure: {}", call);
        }
        Ok(())
    }
}

impl Toolchain for MockToolchain {
    fn fetch_source(&self, ctx: &ExecContext, import_path: &str) -> Result<()> {
        self.record("fetch", import_path)?;
        let ws = Workspace::new(ctx.workspace_root());
        std::fs::create_dir_all(ws.package_dir(import_path).join(VcsKind::Git.marker()))?;
        Ok(())
    }

    fn fetch_transitive_deps(
        &self,
        _ctx: &ExecContext,
        import_path: &str,
        _dir: &Path,
    ) -> Result<()> {
        self.record("fetch-deps", import_path)
    }

    fn build(&self, _ctx: &ExecContext, import_path: &str) -> Result<()> {
        self.record("build", import_path)
    }

    fn install(&self, ctx: &ExecContext, import_path: &str) -> Result<()> {
        self.record("install", import_path)?;
        let ws = Workspace::new(ctx.workspace_root());
        let artifact = ws.artifact_path(import_path);
        if let Some(parent) = artifact.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(artifact, "")?;
        Ok(())
    }

    fn list_dependencies(
        &self,
        _ctx: &ExecContext,
        target: &str,
        _dir: &Path,
    ) -> Result<DependencyList> {
        self.record("list", target)?;
        Ok(self.deps.get(target).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_vcs_history() {
        let fixture = WorkspaceFixture::new();
        let root = fixture.ws.package_dir("example.org/lib");
        let vcs = MockVcs::new();
        vcs.add_repo(&root);
        vcs.commit(&root, "a");
        vcs.commit(&root, "b");
        vcs.tag(&root, "v1.0.0", "a");

        assert_eq!(vcs.resolve_ref(&root, "v1.0.0").unwrap().as_deref(), Some("a"));
        assert_eq!(vcs.resolve_ref(&root, "master").unwrap().as_deref(), Some("b"));
        assert_eq!(vcs.diff_count(&root, "a", "b").unwrap(), Some(1));

        vcs.set_revision(&root, "v1.0.0").unwrap();
        assert_eq!(vcs.head(&root).as_deref(), Some("a"));
        assert!(vcs.set_revision(&root, "zzz").is_err());
    }

    #[test]
    fn test_mock_vcs_adopts_marked_directories() {
        let fixture = WorkspaceFixture::new();
        let dir = fixture.ws.package_dir("example.org/found");
        let vcs = MockVcs::new();

        assert!(vcs.detect(&dir).is_none());
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        assert!(vcs.detect(&dir).is_some());
        assert_eq!(vcs.current_revision(&dir).unwrap(), DISCOVERED_REVISION);
    }

    #[test]
    fn test_mock_toolchain_records_and_fails() {
        let fixture = WorkspaceFixture::new();
        let ctx = fixture.ctx();
        let toolchain = MockToolchain::new().fail_on("build example.org/bad");

        toolchain.fetch_source(&ctx, "example.org/good").unwrap();
        toolchain.install(&ctx, "example.org/good").unwrap();
        assert!(toolchain.build(&ctx, "example.org/bad").is_err());

        assert!(fixture.ws.contains("example.org/good"));
        assert!(fixture.ws.has_artifact("example.org/good"));
        assert_eq!(toolchain.calls_for("example.org/good"), vec!["fetch", "install"]);
    }
}
