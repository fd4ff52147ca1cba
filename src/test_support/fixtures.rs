//! Test fixtures for common test scenarios.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::core::{Manifest, Workspace};
use crate::util::env::ExecContext;

/// A project directory with an empty vendored workspace in a temp dir.
pub struct WorkspaceFixture {
    /// Keeps the directory alive for the fixture's lifetime.
    pub tmp: TempDir,
    /// Directory holding the Bunchfile.
    pub project_dir: PathBuf,
    /// The project's `.vendor` workspace, layout already created.
    pub ws: Workspace,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        std::fs::create_dir_all(&project_dir).unwrap();
        let ws = Workspace::new(project_dir.join(".vendor"));
        ws.ensure_layout().unwrap();

        WorkspaceFixture {
            tmp,
            project_dir,
            ws,
        }
    }

    /// Execution context redirecting into the fixture workspace.
    pub fn ctx(&self) -> ExecContext {
        ExecContext::vendored(&self.project_dir, &self.ws)
    }

    /// Parse manifest text relative to the project directory.
    pub fn manifest(&self, content: &str) -> Manifest {
        Manifest::parse(content, &self.project_dir).unwrap()
    }

    /// Create a package's source directory (no repository marker).
    pub fn add_source(&self, import_path: &str) -> PathBuf {
        let dir = self.ws.package_dir(import_path);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Create a package's compiled archive.
    pub fn add_artifact(&self, import_path: &str) -> PathBuf {
        let path = self.ws.artifact_path(import_path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        path
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}
