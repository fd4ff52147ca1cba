//! Global context for Bunch operations.
//!
//! Provides centralized access to the project directory, configuration
//! locations, and output preferences.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::workspace::{LOCKFILE_NAME, MANIFEST_NAME};
use crate::util::config::{load_config, Config};

/// Name of the project-local configuration file.
pub const PROJECT_CONFIG_NAME: &str = ".bunch.toml";

/// Project directories for Bunch
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "bunch", "bunch"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory (the project directory)
    cwd: PathBuf,

    /// Directory holding the global config file, if one can be determined
    config_dir: Option<PathBuf>,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let config_dir = PROJECT_DIRS
            .as_ref()
            .map(|dirs| dirs.config_dir().to_path_buf());

        GlobalContext {
            cwd,
            config_dir,
            verbose: false,
            color: true,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Path of the project's Bunchfile.
    pub fn manifest_path(&self) -> PathBuf {
        self.cwd.join(MANIFEST_NAME)
    }

    /// Path of the project's Bunchfile.lock.
    pub fn lockfile_path(&self) -> PathBuf {
        self.cwd.join(LOCKFILE_NAME)
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config_dir.as_ref().map(|dir| dir.join("config.toml"))
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        self.cwd.join(PROJECT_CONFIG_NAME)
    }

    /// Load the merged global + project configuration.
    pub fn config(&self) -> Config {
        load_config(self.config_path().as_deref(), &self.project_config_path())
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }
}
