//! Mercurial backend.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::process::ProcessBuilder;
use crate::vcs::{Vcs, VcsKind};

const DEFAULT_BRANCH: &str = "default";

/// Drives the `hg` command-line client.
#[derive(Debug, Clone)]
pub struct Mercurial {
    program: PathBuf,
}

impl Mercurial {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Mercurial {
            program: program.into(),
        }
    }

    fn hg(&self, dir: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.program).cwd(dir)
    }

    /// `hg log -r <revset>` for a single node; failure means no such revision.
    fn node(&self, dir: &Path, revset: &str) -> Result<Option<String>> {
        let output = self
            .hg(dir)
            .args(["log", "-r", revset, "-l", "1", "--template", "{node}"])
            .exec()?;

        if !output.status.success() {
            return Ok(None);
        }
        let node = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!node.is_empty()).then_some(node))
    }
}

impl Vcs for Mercurial {
    fn kind(&self) -> VcsKind {
        VcsKind::Mercurial
    }

    fn default_branch(&self, _dir: &Path) -> Result<String> {
        Ok(DEFAULT_BRANCH.to_string())
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        self.hg(dir)
            .arg("pull")
            .exec_and_check()
            .with_context(|| format!("failed to pull {}", dir.display()))?;
        Ok(())
    }

    fn current_revision(&self, dir: &Path) -> Result<String> {
        self.hg(dir)
            .args(["log", "-r", ".", "--template", "{node}"])
            .exec_stdout()
            .with_context(|| format!("failed to read working revision of {}", dir.display()))
    }

    fn upstream_revision(&self, dir: &Path) -> Result<Option<String>> {
        self.node(dir, "tip")
    }

    fn resolve_ref(&self, dir: &Path, reference: &str) -> Result<Option<String>> {
        if reference.is_empty() {
            return Ok(None);
        }
        self.node(dir, reference)
    }

    fn list_tags(&self, dir: &Path) -> Result<Vec<String>> {
        let out = self
            .hg(dir)
            .args(["tags", "-q"])
            .exec_stdout()
            .with_context(|| format!("failed to list tags of {}", dir.display()))?;

        Ok(parse_tags(&out))
    }

    fn set_revision(&self, dir: &Path, revision: &str) -> Result<()> {
        self.hg(dir)
            .args(["update", "-r", revision])
            .exec_and_check()
            .with_context(|| format!("failed to update {} to {}", dir.display(), revision))?;
        Ok(())
    }

    fn diff_count(&self, dir: &Path, from: &str, to: &str) -> Result<Option<u64>> {
        let output = self
            .hg(dir)
            .args([
                "log",
                "-r",
                &format!("only({}, {})", to, from),
                "--template",
                ".",
            ])
            .exec()?;

        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().len() as u64))
    }
}

/// `tip` is a moving pointer, not a release.
fn parse_tags(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "tip")
        .map(str::to_string)
        .collect()
}
