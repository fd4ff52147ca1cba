//! Dependency graph over installed packages, and removal built on it.
//!
//! The usage map records, for every installed package reachable from the
//! manifest, which packages use it. It is always computed in full before
//! anything is deleted, so removals in one run never change what another
//! package in the same run is considered to need.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use anyhow::{Context, Result};
use miette::Diagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::{Manifest, Workspace};
use crate::toolchain::Toolchain;
use crate::util::env::ExecContext;
use crate::util::fs;
use crate::vcs::VcsDetect;

/// Attribution for packages the manifest asks for directly.
pub const ROOT: &str = "root";

/// Levels of empty ancestor directories removed after a deletion.
const EMPTY_PARENT_LEVELS: usize = 2;

/// An uninstall target that other packages still use.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("unable to remove package {package}, is depended on by {}", .dependents.join(", "))]
#[diagnostic(
    code(bunch::uninstall::conflict),
    help("uninstall the dependents too, or keep this package")
)]
pub struct ConflictError {
    pub package: String,
    pub dependents: Vec<String>,
}

/// Who uses which installed package.
///
/// An edge `a -> b` means `a` uses `b`.
#[derive(Debug, Clone, Default)]
pub struct UsageMap {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl UsageMap {
    pub fn new() -> Self {
        UsageMap::default()
    }

    fn node(&mut self, package: &str) -> NodeIndex {
        if let Some(&node) = self.nodes.get(package) {
            return node;
        }
        let node = self.graph.add_node(package.to_string());
        self.nodes.insert(package.to_string(), node);
        node
    }

    /// Record a package as known, whether or not anything uses it.
    pub fn add_package(&mut self, package: &str) {
        self.node(package);
    }

    /// Record that `user` uses `package`.
    pub fn mark_used(&mut self, package: &str, user: &str) {
        let to = self.node(package);
        let from = self.node(user);
        if from != to && !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Packages (or [`ROOT`]) using `package`, sorted.
    pub fn users(&self, package: &str) -> Vec<String> {
        let Some(&node) = self.nodes.get(package) else {
            return Vec::new();
        };
        let mut users: Vec<_> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        users.sort();
        users
    }

    /// Whether anything uses `package`.
    pub fn is_used(&self, package: &str) -> bool {
        self.nodes.get(package).is_some_and(|&node| {
            self.graph
                .neighbors_directed(node, Direction::Incoming)
                .next()
                .is_some()
        })
    }

    /// Whether `package` is known to the map.
    pub fn contains(&self, package: &str) -> bool {
        package != ROOT && self.nodes.contains_key(package)
    }

    /// Every known package, sorted.
    pub fn packages(&self) -> Vec<&str> {
        let mut packages: Vec<_> = self
            .graph
            .node_weights()
            .map(String::as_str)
            .filter(|p| *p != ROOT)
            .collect();
        packages.sort_unstable();
        packages
    }

    /// Every package with at least one user, sorted.
    pub fn used_packages(&self) -> Vec<&str> {
        self.packages()
            .into_iter()
            .filter(|p| self.is_used(p))
            .collect()
    }
}

/// Whether `path` is `base` or nested under it, by whole segments.
pub fn is_within(path: &str, base: &str) -> bool {
    path.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether two import paths are equal or one contains the other.
pub fn is_related(a: &str, b: &str) -> bool {
    is_within(a, b) || is_within(b, a)
}

/// Result of an uninstall.
#[derive(Debug, Clone, Default)]
pub struct RemoveReport {
    /// Packages deleted, targets first
    pub removed: Vec<String>,

    /// Targets refused because something still uses them
    pub conflicts: Vec<ConflictError>,

    /// Targets that were not installed
    pub not_installed: Vec<String>,
}

/// Result of a prune.
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    /// Repository roots deleted, as import paths
    pub removed: Vec<String>,
}

/// Queries dependencies and deletes packages from a workspace.
pub struct DependencyGraph<'a> {
    ws: &'a Workspace,
    toolchain: &'a dyn Toolchain,
    ctx: &'a ExecContext,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(ws: &'a Workspace, toolchain: &'a dyn Toolchain, ctx: &'a ExecContext) -> Self {
        DependencyGraph { ws, toolchain, ctx }
    }

    /// Build the usage map for the manifest's packages plus `targets`.
    ///
    /// Targets are known but attribute no uses, so whatever only they need
    /// ends up unused.
    pub fn build_usage_map(&self, manifest: &Manifest, targets: &[String]) -> Result<UsageMap> {
        let mut candidates: Vec<&str> = targets.iter().map(String::as_str).collect();
        for pkg in manifest.packages() {
            if !candidates.contains(&pkg.repo.as_str()) {
                candidates.push(&pkg.repo);
            }
        }

        let mut usage = UsageMap::new();
        for package in candidates {
            if !self.ws.contains(package) {
                debug!("{} is not installed", package);
                continue;
            }

            let removing = targets.iter().any(|t| t == package);
            usage.add_package(package);
            if !removing {
                usage.mark_used(package, ROOT);
            }
            self.add_dependencies(&mut usage, package, !removing)?;
        }

        Ok(usage)
    }

    /// Record `package`'s installed dependencies, crediting it as their user
    /// when `credit` is set.
    fn add_dependencies(&self, usage: &mut UsageMap, package: &str, credit: bool) -> Result<()> {
        let deps = self
            .toolchain
            .list_dependencies(self.ctx, package, &self.ws.package_dir(package))
            .with_context(|| format!("failed listing dependencies of {}", package))?;

        for dep in deps.all() {
            if dep == package || !self.ws.contains(dep) {
                continue;
            }
            usage.add_package(dep);
            if credit {
                usage.mark_used(dep, package);
            }
        }
        Ok(())
    }

    /// Packages (other than `target` itself) that use `target` or a package
    /// related to it by path.
    fn dependents(usage: &UsageMap, target: &str) -> Vec<String> {
        let mut dependents = usage.users(target);
        for other in usage.used_packages() {
            if other != target && is_related(other, target) {
                dependents.extend(usage.users(other).into_iter().filter(|u| u != target));
            }
        }
        dependents.sort();
        dependents.dedup();
        dependents
    }

    /// Uninstall `targets`.
    ///
    /// Targets still used by another package are refused, each reported as
    /// a [`ConflictError`] without stopping the others. A refused target
    /// keeps its own dependencies in use. Every known package left without
    /// users is deleted, unless it is nested in or contains a package that
    /// is still used.
    pub fn remove_packages(&self, targets: &[String], manifest: &Manifest) -> Result<RemoveReport> {
        let mut usage = self.build_usage_map(manifest, targets)?;
        let mut report = RemoveReport::default();

        let mut installed: Vec<&str> = Vec::new();
        for target in targets {
            if usage.contains(target) {
                installed.push(target);
            } else {
                report.not_installed.push(target.clone());
            }
        }

        // A refused target stays installed and keeps using its dependencies,
        // which may in turn refuse other targets.
        let mut refused: Vec<&str> = Vec::new();
        loop {
            let blocked: Vec<&str> = installed
                .iter()
                .copied()
                .filter(|t| !refused.contains(t))
                .filter(|t| !Self::dependents(&usage, t).is_empty())
                .collect();
            if blocked.is_empty() {
                break;
            }
            for target in blocked {
                debug!("keeping {}, it is still in use", target);
                self.add_dependencies(&mut usage, target, true)?;
                refused.push(target);
            }
        }

        for target in &installed {
            if refused.contains(target) {
                report.conflicts.push(ConflictError {
                    package: target.to_string(),
                    dependents: Self::dependents(&usage, target),
                });
            }
        }

        let used = usage.used_packages();
        let mut doomed: Vec<&str> = installed
            .iter()
            .copied()
            .filter(|t| !refused.contains(t))
            .collect();
        let orphans: BTreeSet<&str> = usage
            .packages()
            .into_iter()
            .filter(|p| !targets.iter().any(|t| t == p))
            .filter(|p| !used.iter().any(|u| is_related(u, p)))
            .filter(|p| !refused.iter().any(|r| is_related(r, p)))
            .collect();
        doomed.extend(orphans);

        for package in doomed {
            self.remove_package(package)
                .with_context(|| format!("failed removing package {}", package))?;
            report.removed.push(package.to_string());
        }

        Ok(report)
    }

    /// Delete a package's source tree, compiled archives and binary.
    pub fn remove_package(&self, package: &str) -> Result<()> {
        info!("removing {}", package);
        self.remove_sources_and_archives(package)?;

        if let Some(binary) = self.ws.binary_path(package) {
            fs::remove_path(&binary)?;
        }
        Ok(())
    }

    fn remove_sources_and_archives(&self, package: &str) -> Result<()> {
        let src = self.ws.package_dir(package);
        fs::remove_path(&src)?;
        fs::remove_empty_parents(&src, &self.ws.src_dir(), EMPTY_PARENT_LEVELS)?;

        let archive = self.ws.artifact_path(package);
        fs::remove_path(&archive)?;
        fs::remove_path(&self.ws.artifact_dir(package))?;
        fs::remove_empty_parents(&archive, &self.ws.pkg_dir(), EMPTY_PARENT_LEVELS)?;
        Ok(())
    }

    /// Delete every repository in the workspace the manifest no longer
    /// reaches.
    ///
    /// Directories holding a VCS marker, and symlinked packages, are
    /// repository roots; the walk does not descend into them.
    pub fn prune(&self, manifest: &Manifest, vcs: &dyn VcsDetect) -> Result<PruneReport> {
        let usage = self.build_usage_map(manifest, &[])?;
        let used = usage.used_packages();
        let src = self.ws.src_dir();

        let mut roots: Vec<(PathBuf, String)> = Vec::new();
        let mut walker = WalkDir::new(&src).min_depth(1).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry
                .with_context(|| format!("failed to walk workspace: {}", src.display()))?;
            let is_link = entry.path_is_symlink();
            if !is_link && !entry.file_type().is_dir() {
                continue;
            }
            if !is_link && vcs.detect(entry.path()).is_none() {
                continue;
            }
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            if let Some(import_path) = self.ws.import_path_of(entry.path()) {
                roots.push((entry.path().to_path_buf(), import_path));
            }
        }

        let mut report = PruneReport::default();
        for (path, import_path) in roots {
            if used.iter().any(|u| is_related(u, &import_path)) {
                continue;
            }
            info!("pruning {}", import_path);
            self.remove_sources_and_archives(&import_path)
                .with_context(|| format!("failed pruning {}", path.display()))?;
            report.removed.push(import_path);
        }

        Ok(report)
    }
}
