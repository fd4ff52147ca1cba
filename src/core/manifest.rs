//! Bunchfile parsing and editing.
//!
//! The manifest is kept as an ordered list of line records. Package entries
//! are parsed into [`Package`] values; comments and blank lines are carried
//! through opaquely so untouched lines render byte-identical.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::lockfile::Lockfile;
use crate::core::package::Package;
use crate::util::fs;

/// One line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLine {
    /// A package entry
    Entry(Entry),
    /// A comment, blank line, or anything without a package on it
    Other(String),
}

/// A parsed package entry with its original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    package: Package,
    comment: Option<String>,
    raw: String,
}

impl Entry {
    fn new(package: Package, comment: Option<String>) -> Self {
        let mut raw = package.to_manifest_entry();
        if let Some(comment) = &comment {
            raw.push(' ');
            raw.push_str(comment);
        }
        Entry {
            package,
            comment,
            raw,
        }
    }

    /// The package on this line.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Trailing `#` comment, including the `#`.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The line exactly as it will be rendered.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// A Bunchfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    project_dir: PathBuf,
    lines: Vec<ManifestLine>,
    trailing_newline: bool,
}

impl Manifest {
    /// Create an empty manifest for a project directory.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Manifest {
            project_dir: project_dir.into(),
            lines: Vec::new(),
            trailing_newline: true,
        }
    }

    /// Load a manifest from a file; link targets resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let project_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::parse(&content, &project_dir)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest text.
    pub fn parse(content: &str, project_dir: &Path) -> Result<Self> {
        let trailing_newline = content.is_empty() || content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);

        let mut manifest = Manifest {
            project_dir: project_dir.to_path_buf(),
            lines: Vec::new(),
            trailing_newline,
        };

        if content.is_empty() {
            return Ok(manifest);
        }

        for (index, raw) in body.split('\n').enumerate() {
            let line = parse_line(raw, project_dir);
            if let ManifestLine::Entry(entry) = &line {
                if manifest.package(&entry.package.repo).is_some() {
                    bail!(
                        "duplicate package `{}` on line {}",
                        entry.package.repo,
                        index + 1
                    );
                }
            }
            manifest.lines.push(line);
        }

        Ok(manifest)
    }

    /// Write the manifest to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write_string(path, &self.render())
    }

    /// Render the manifest back to text.
    pub fn render(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(|line| match line {
                ManifestLine::Entry(entry) => entry.raw.as_str(),
                ManifestLine::Other(text) => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Directory link targets are resolved against.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// All lines in order.
    pub fn lines(&self) -> &[ManifestLine] {
        &self.lines
    }

    /// Packages in manifest order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.lines.iter().filter_map(|line| match line {
            ManifestLine::Entry(entry) => Some(&entry.package),
            ManifestLine::Other(_) => None,
        })
    }

    /// Look up a package by import path.
    pub fn package(&self, repo: &str) -> Option<&Package> {
        self.packages().find(|pkg| pkg.repo == repo)
    }

    /// The project's own package, if the manifest declares one.
    pub fn self_package(&self) -> Option<&Package> {
        self.packages().find(|pkg| pkg.is_self())
    }

    /// Add a package, or replace the entry with the same import path.
    ///
    /// A replaced entry keeps its position and trailing comment.
    pub fn add_package(&mut self, package: Package) {
        for line in &mut self.lines {
            if let ManifestLine::Entry(entry) = line {
                if entry.package.repo == package.repo {
                    let comment = entry.comment.take();
                    *entry = Entry::new(package, comment);
                    return;
                }
            }
        }

        self.lines
            .push(ManifestLine::Entry(Entry::new(package, None)));
    }

    /// Remove a package entry. Returns whether it was present.
    pub fn remove_package(&mut self, repo: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| match line {
            ManifestLine::Entry(entry) => entry.package.repo != repo,
            ManifestLine::Other(_) => true,
        });
        self.lines.len() != before
    }

    /// Pin packages to the revisions recorded in a lockfile.
    pub fn apply_lock(&mut self, lock: &Lockfile) {
        for line in &mut self.lines {
            if let ManifestLine::Entry(entry) = line {
                entry.package.locked_revision = lock.get(&entry.package.repo).map(str::to_string);
            }
        }
    }
}

fn parse_line(raw: &str, project_dir: &Path) -> ManifestLine {
    let (content, comment) = match raw.find('#') {
        Some(pos) => (&raw[..pos], Some(raw[pos..].trim_end().to_string())),
        None => (raw, None),
    };

    let content = content.trim();
    if content.is_empty() {
        return ManifestLine::Other(raw.to_string());
    }

    let (repo, spec) = match content.split_once(char::is_whitespace) {
        Some((repo, spec)) => (repo, spec.trim()),
        None => (content, ""),
    };

    ManifestLine::Entry(Entry {
        package: Package::from_spec(repo, spec, project_dir),
        comment,
        raw: raw.to_string(),
    })
}
