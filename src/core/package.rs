//! Package - one dependency entry.

use std::fmt;
use std::path::{Path, PathBuf};

/// Version-spec prefix marking a package linked from a local directory.
pub const LINK_MARKER: &str = "!link";

/// Version-spec prefix marking the project's own package.
pub const SELF_MARKER: &str = "!self";

/// A package materialized as a symlink instead of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Directory the workspace entry points at
    pub target: PathBuf,

    /// Whether this is the project's own package
    pub is_self: bool,

    /// Whether the target was spelled out (`!link:<path>`)
    explicit_target: bool,
}

/// A single dependency, keyed by import path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Package {
    /// Canonical import path (unique within a manifest)
    pub repo: String,

    /// Raw version specifier: empty, revision, branch/tag or constraint
    pub version_spec: String,

    /// Revision pinned by the lockfile
    pub locked_revision: Option<String>,

    /// Link materialization, for `!link` and `!self` entries
    pub link: Option<Link>,
}

impl Package {
    /// Create a package with an optional version spec.
    pub fn new(repo: impl Into<String>, version_spec: impl Into<String>) -> Self {
        Package {
            repo: repo.into(),
            version_spec: version_spec.into(),
            locked_revision: None,
            link: None,
        }
    }

    /// Parse the spec column of a manifest line.
    ///
    /// `!link[:path]` and `!self[:path]` become links; a relative target is
    /// resolved against `project_dir`, a missing one defaults to it.
    pub fn from_spec(repo: impl Into<String>, spec: &str, project_dir: &Path) -> Self {
        let spec = spec.trim();
        let is_self = spec.starts_with(SELF_MARKER);

        if !is_self && !spec.starts_with(LINK_MARKER) {
            return Package::new(repo, spec);
        }

        let (target, explicit_target) = match spec.split_once(':') {
            Some((_, path)) if !path.trim().is_empty() => {
                (project_dir.join(path.trim()), true)
            }
            _ => (project_dir.to_path_buf(), false),
        };

        Package {
            repo: repo.into(),
            version_spec: String::new(),
            locked_revision: None,
            link: Some(Link {
                target,
                is_self,
                explicit_target,
            }),
        }
    }

    /// Parse a command-line package argument: `path[@spec]`.
    ///
    /// Two-segment paths whose first segment has no dot are GitHub
    /// shorthand (`user/repo` -> `github.com/user/repo`).
    pub fn parse_arg(arg: &str, project_dir: &Path) -> Self {
        let (repo, spec) = match arg.split_once('@') {
            Some((repo, spec)) => (repo, spec),
            None => (arg, ""),
        };

        let repo = repo.trim().trim_end_matches('/');
        let segments: Vec<_> = repo.split('/').collect();
        let repo = if segments.len() == 2 && !segments[0].contains('.') {
            format!("github.com/{}", repo)
        } else {
            repo.to_string()
        };

        Package::from_spec(repo, spec, project_dir)
    }

    /// Whether this package is materialized as a link.
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }

    /// Whether this is the project's own package.
    pub fn is_self(&self) -> bool {
        self.link.as_ref().is_some_and(|link| link.is_self)
    }

    /// Link target for link packages.
    pub fn link_target(&self) -> Option<&Path> {
        self.link.as_ref().map(|link| link.target.as_path())
    }

    /// The spec column as it should be written back to a manifest.
    pub fn spec_text(&self) -> String {
        match &self.link {
            Some(link) => {
                let marker = if link.is_self { SELF_MARKER } else { LINK_MARKER };
                if link.explicit_target {
                    format!("{}:{}", marker, link.target.display())
                } else {
                    marker.to_string()
                }
            }
            None => self.version_spec.clone(),
        }
    }

    /// Render as a manifest entry (without comment).
    pub fn to_manifest_entry(&self) -> String {
        let spec = self.spec_text();
        if spec.is_empty() {
            self.repo.clone()
        } else {
            format!("{} {}", self.repo, spec)
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version_spec.is_empty() {
            write!(f, "{}", self.repo)
        } else {
            write!(f, "{} {}", self.repo, self.version_spec)
        }
    }
}
