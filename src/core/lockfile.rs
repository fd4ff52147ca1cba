//! Bunchfile.lock - resolved revision per package.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs;

/// Mapping from import path to resolved revision.
///
/// Serialized as an indented JSON object; `BTreeMap` keeps keys sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockfile {
    revisions: BTreeMap<String, String>,
}

impl Lockfile {
    /// Load a lockfile. A missing file is `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let lock: Lockfile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse lockfile: {}", path.display()))?;
        Ok(Some(lock))
    }

    /// Write the lockfile.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write_string(path, &self.to_json()?)
    }

    /// Render as indented JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("failed to serialize lockfile")?;
        json.push('\n');
        Ok(json)
    }

    /// Revision recorded for a package.
    pub fn get(&self, repo: &str) -> Option<&str> {
        self.revisions.get(repo).map(String::as_str)
    }

    /// Record a revision.
    pub fn insert(&mut self, repo: impl Into<String>, revision: impl Into<String>) {
        self.revisions.insert(repo.into(), revision.into());
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.revisions
            .iter()
            .map(|(repo, rev)| (repo.as_str(), rev.as_str()))
    }
}
