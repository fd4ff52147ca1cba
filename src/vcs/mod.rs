//! Version-control adapters.
//!
//! Backends shell out to the `git` and `hg` command-line clients. A
//! directory's backend is picked by its marker directory (`.git`, `.hg`);
//! a directory with neither has no backend.

pub mod git;
pub mod hg;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::config::Config;
use crate::util::process::resolve_program;

pub use git::Git;
pub use hg::Mercurial;

/// Supported version-control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsKind {
    Git,
    Mercurial,
}

impl VcsKind {
    /// All kinds, in detection order.
    pub const ALL: [VcsKind; 2] = [VcsKind::Git, VcsKind::Mercurial];

    /// Marker directory identifying a repository root.
    pub fn marker(&self) -> &'static str {
        match self {
            VcsKind::Git => ".git",
            VcsKind::Mercurial => ".hg",
        }
    }

    /// Detect the repository kind rooted at exactly `dir`.
    pub fn detect(dir: &Path) -> Option<VcsKind> {
        VcsKind::ALL
            .into_iter()
            .find(|kind| dir.join(kind.marker()).exists())
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsKind::Git => write!(f, "git"),
            VcsKind::Mercurial => write!(f, "hg"),
        }
    }
}

/// Operations on a checked-out repository.
///
/// Every method takes the repository root; commands run with it as their
/// working directory.
pub trait Vcs {
    /// Which system this backend drives.
    fn kind(&self) -> VcsKind;

    /// Name of the branch an empty version spec means.
    fn default_branch(&self, dir: &Path) -> Result<String>;

    /// Pull all remote history and tags.
    fn fetch(&self, dir: &Path) -> Result<()>;

    /// Revision of the current checkout.
    fn current_revision(&self, dir: &Path) -> Result<String>;

    /// Revision of the upstream tip, if the repository tracks one.
    fn upstream_revision(&self, dir: &Path) -> Result<Option<String>>;

    /// Resolve a hash, branch or tag to a revision. Unknown refs are `None`.
    fn resolve_ref(&self, dir: &Path, reference: &str) -> Result<Option<String>>;

    /// All tag names.
    fn list_tags(&self, dir: &Path) -> Result<Vec<String>>;

    /// Check out a revision.
    fn set_revision(&self, dir: &Path, revision: &str) -> Result<()>;

    /// Number of commits reachable from `to` but not from `from`.
    fn diff_count(&self, dir: &Path, from: &str, to: &str) -> Result<Option<u64>>;
}

/// Picks the backend for a directory.
pub trait VcsDetect {
    /// Backend for a repository rooted at exactly `dir`.
    fn detect(&self, dir: &Path) -> Option<&dyn Vcs>;

    /// Walk up from `start` to the nearest repository root strictly below `stop`.
    fn find_root(&self, start: &Path, stop: &Path) -> Option<(PathBuf, &dyn Vcs)> {
        for dir in start.ancestors() {
            if dir == stop || !dir.starts_with(stop) {
                break;
            }
            if let Some(vcs) = self.detect(dir) {
                return Some((dir.to_path_buf(), vcs));
            }
        }
        None
    }
}

/// The command-line backends, configured from `[tools]`.
#[derive(Debug, Clone)]
pub struct VcsBackends {
    git: Git,
    hg: Mercurial,
}

impl VcsBackends {
    /// Backends using configured tool paths, falling back to `PATH`.
    pub fn new(config: &Config) -> Self {
        VcsBackends {
            git: Git::new(resolve_program(config.tools.git.as_deref(), "git")),
            hg: Mercurial::new(resolve_program(config.tools.hg.as_deref(), "hg")),
        }
    }
}

impl Default for VcsBackends {
    fn default() -> Self {
        VcsBackends::new(&Config::default())
    }
}

impl VcsDetect for VcsBackends {
    fn detect(&self, dir: &Path) -> Option<&dyn Vcs> {
        match VcsKind::detect(dir)? {
            VcsKind::Git => Some(&self.git),
            VcsKind::Mercurial => Some(&self.hg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_by_marker() {
        let tmp = TempDir::new().unwrap();
        let git_repo = tmp.path().join("a");
        let hg_repo = tmp.path().join("b");
        let plain = tmp.path().join("c");
        std::fs::create_dir_all(git_repo.join(".git")).unwrap();
        std::fs::create_dir_all(hg_repo.join(".hg")).unwrap();
        std::fs::create_dir_all(&plain).unwrap();

        assert_eq!(VcsKind::detect(&git_repo), Some(VcsKind::Git));
        assert_eq!(VcsKind::detect(&hg_repo), Some(VcsKind::Mercurial));
        assert_eq!(VcsKind::detect(&plain), None);

        let backends = VcsBackends::default();
        assert_eq!(backends.detect(&hg_repo).unwrap().kind(), VcsKind::Mercurial);
        assert!(backends.detect(&plain).is_none());
    }

    #[test]
    fn test_find_root_stops_at_boundary() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let repo = src.join("example.org/user/lib");
        let nested = repo.join("sub/pkg");
        std::fs::create_dir_all(repo.join(".git")).unwrap();
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();

        let backends = VcsBackends::default();
        let (root, vcs) = backends.find_root(&nested, &src).unwrap();
        assert_eq!(root, repo);
        assert_eq!(vcs.kind(), VcsKind::Git);

        let other = src.join("example.org/other");
        std::fs::create_dir_all(&other).unwrap();
        assert!(backends.find_root(&other, &src).is_none());
    }
}
