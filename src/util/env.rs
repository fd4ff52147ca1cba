//! Execution context for external commands.
//!
//! Instead of redirecting `GOPATH` and `PATH` for the whole process, the
//! redirection is captured once in an immutable [`ExecContext`] and applied
//! to each child process as it is spawned. Dropping the context is the
//! teardown; nothing in the running process needs restoring.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::Workspace;
use crate::util::process::ProcessBuilder;

/// Environment variables applied to every toolchain and VCS command.
#[derive(Debug, Clone)]
pub struct ExecContext {
    project_dir: PathBuf,
    workspace_root: PathBuf,
    vendored: bool,
    vars: BTreeMap<String, String>,
}

impl ExecContext {
    /// Context for a project-local (vendored) workspace.
    ///
    /// `GOPATH` points at the workspace and its `bin` directory is put in
    /// front of the inherited search path.
    pub fn vendored(project_dir: &Path, ws: &Workspace) -> Self {
        let mut vars = base_vars(ws);
        vars.insert("PATH".to_string(), prepend_search_path(&ws.bin_dir()));

        ExecContext {
            project_dir: project_dir.to_path_buf(),
            workspace_root: ws.root().to_path_buf(),
            vendored: true,
            vars,
        }
    }

    /// Context for installing into the user's global workspace.
    pub fn global(project_dir: &Path, ws: &Workspace) -> Self {
        ExecContext {
            project_dir: project_dir.to_path_buf(),
            workspace_root: ws.root().to_path_buf(),
            vendored: false,
            vars: base_vars(ws),
        }
    }

    /// The directory commands run in unless told otherwise.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The workspace root commands are redirected to.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Whether this context redirects into a project-local workspace.
    pub fn is_vendored(&self) -> bool {
        self.vendored
    }

    /// Look up one of the overridden variables.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Iterate over the overridden variables.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Start a command in the project directory with this environment applied.
    pub fn command(&self, program: impl AsRef<Path>) -> ProcessBuilder {
        self.apply(ProcessBuilder::new(program).cwd(&self.project_dir))
    }

    /// Apply this environment to an existing builder.
    pub fn apply(&self, mut pb: ProcessBuilder) -> ProcessBuilder {
        for (key, value) in &self.vars {
            pb = pb.env(key, value);
        }
        pb
    }
}

fn base_vars(ws: &Workspace) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    vars.insert("GOPATH".to_string(), ws.root().display().to_string());
    // Import-path layout only exists in GOPATH mode.
    vars.insert("GO111MODULE".to_string(), "off".to_string());
    vars
}

fn prepend_search_path(bin: &Path) -> String {
    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let mut entries = vec![bin.to_path_buf()];
    entries.extend(std::env::split_paths(&inherited));

    std::env::join_paths(entries)
        .unwrap_or_else(|_| OsString::from(bin.as_os_str()))
        .to_string_lossy()
        .into_owned()
}
