//! Version resolution.
//!
//! Turns a package's version spec into a concrete revision of its checkout
//! in the workspace. Specs are tried as a revision, branch or tag first and
//! only then as a constraint over the repository's tags.

pub mod errors;
pub mod recency;
pub mod version;

pub use errors::{ConstraintError, ResolveError};
pub use recency::RecencyInfo;
pub use version::{parse_tag_version, select_tag, Constraint};

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::core::Workspace;
use crate::vcs::{Vcs, VcsDetect};

/// Branch an empty spec means while the package is not checked out.
pub const DEFAULT_BRANCH: &str = "master";

/// Resolves version specs against checkouts in a workspace.
pub struct VersionResolver<'a> {
    ws: &'a Workspace,
    vcs: &'a dyn VcsDetect,
}

impl<'a> VersionResolver<'a> {
    pub fn new(ws: &'a Workspace, vcs: &'a dyn VcsDetect) -> Self {
        VersionResolver { ws, vcs }
    }

    /// The workspace being resolved against.
    pub fn workspace(&self) -> &Workspace {
        self.ws
    }

    /// Nearest repository root at or above a package's directory, with its
    /// backend.
    pub fn repository_root(&self, repo: &str) -> Option<(PathBuf, &dyn Vcs)> {
        self.vcs
            .find_root(&self.ws.package_dir(repo), &self.ws.src_dir())
    }

    /// Resolve `spec` for `repo` to a revision.
    ///
    /// Packages that are not checked out, or have no repository root, return
    /// the spec as given (an empty spec becomes [`DEFAULT_BRANCH`]).
    pub fn resolve(&self, repo: &str, spec: &str) -> Result<String> {
        if !self.ws.contains(repo) {
            debug!("{} is not installed, keeping spec `{}`", repo, spec);
            return Ok(if spec.is_empty() {
                DEFAULT_BRANCH.to_string()
            } else {
                spec.to_string()
            });
        }

        let Some((root, vcs)) = self.repository_root(repo) else {
            debug!("{} has no repository root, keeping spec `{}`", repo, spec);
            return Ok(spec.to_string());
        };

        let spec = if spec.is_empty() {
            vcs.default_branch(&root)?
        } else {
            spec.to_string()
        };

        if let Some(rev) = vcs.resolve_ref(&root, &spec)? {
            debug!("{} `{}` is revision {}", repo, spec, rev);
            return Ok(rev);
        }

        let constraint: Constraint =
            spec.parse()
                .map_err(|source| ResolveError::InvalidConstraint {
                    repo: repo.to_string(),
                    source,
                })?;

        let tags = vcs.list_tags(&root)?;
        let tag = select_tag(&constraint, &tags).ok_or_else(|| ResolveError::NoMatchingVersion {
            repo: repo.to_string(),
            constraint: constraint.to_string(),
            available: tags.clone(),
        })?;
        debug!("{} `{}` selected tag {}", repo, constraint, tag);

        vcs.resolve_ref(&root, tag)?
            .ok_or_else(|| anyhow!("tag `{}` of {} does not point at a revision", tag, repo))
    }
}
