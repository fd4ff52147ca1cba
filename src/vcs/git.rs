//! Git backend.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::process::ProcessBuilder;
use crate::vcs::{Vcs, VcsKind};

/// Branch used when a repository has no remote HEAD to ask.
const FALLBACK_BRANCH: &str = "master";

/// Drives the `git` command-line client.
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
}

impl Git {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Git {
            program: program.into(),
        }
    }

    fn git(&self, dir: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.program).cwd(dir)
    }

    /// Run `rev-parse --verify` quietly; failure means the ref is unknown.
    fn verify(&self, dir: &Path, reference: &str) -> Result<Option<String>> {
        let output = self
            .git(dir)
            .args(["rev-parse", "-q", "--verify"])
            .arg(reference)
            .exec()?;

        if !output.status.success() {
            return Ok(None);
        }
        let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!rev.is_empty()).then_some(rev))
    }
}

impl Vcs for Git {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn default_branch(&self, dir: &Path) -> Result<String> {
        let output = self
            .git(dir)
            .args(["symbolic-ref", "-q", "--short", "refs/remotes/origin/HEAD"])
            .exec()?;

        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let name = name.strip_prefix("origin/").unwrap_or(&name);
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
        Ok(FALLBACK_BRANCH.to_string())
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        self.git(dir)
            .args(["fetch", "--all", "--tags"])
            .exec_and_check()
            .with_context(|| format!("failed to fetch {}", dir.display()))?;
        Ok(())
    }

    fn current_revision(&self, dir: &Path) -> Result<String> {
        self.git(dir)
            .args(["rev-parse", "-q", "--verify", "HEAD"])
            .exec_stdout()
            .with_context(|| format!("failed to read HEAD of {}", dir.display()))
    }

    fn upstream_revision(&self, dir: &Path) -> Result<Option<String>> {
        if let Some(rev) = self.verify(dir, "@{upstream}")? {
            return Ok(Some(rev));
        }
        self.verify(dir, "refs/remotes/origin/HEAD")
    }

    fn resolve_ref(&self, dir: &Path, reference: &str) -> Result<Option<String>> {
        if reference.is_empty() {
            return Ok(None);
        }
        // Peel annotated tags down to the commit they point at.
        if let Some(rev) = self.verify(dir, &format!("refs/tags/{}^{{commit}}", reference))? {
            return Ok(Some(rev));
        }
        // Fetching only moves remote-tracking branches, so they win over a
        // local branch of the same name.
        if let Some(rev) =
            self.verify(dir, &format!("refs/remotes/origin/{}^{{commit}}", reference))?
        {
            return Ok(Some(rev));
        }
        self.verify(dir, &format!("{}^{{commit}}", reference))
    }

    fn list_tags(&self, dir: &Path) -> Result<Vec<String>> {
        let out = self
            .git(dir)
            .arg("tag")
            .exec_stdout()
            .with_context(|| format!("failed to list tags of {}", dir.display()))?;

        Ok(out
            .lines()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn set_revision(&self, dir: &Path, revision: &str) -> Result<()> {
        self.git(dir)
            .args(["checkout", "-q", revision])
            .exec_and_check()
            .with_context(|| format!("failed to check out {} in {}", revision, dir.display()))?;
        Ok(())
    }

    fn diff_count(&self, dir: &Path, from: &str, to: &str) -> Result<Option<u64>> {
        let output = self
            .git(dir)
            .args(["rev-list", "--count", &format!("{}..{}", from, to)])
            .exec()?;

        if !output.status.success() {
            return Ok(None);
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().parse().ok())
    }
}
