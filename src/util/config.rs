//! Configuration file support for Bunch.
//!
//! Bunch reads two configuration files:
//! - Global: `config.toml` in the platform config directory - user-wide defaults
//! - Project: `.bunch.toml` next to the Bunchfile - project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default name of the vendored workspace directory.
pub const DEFAULT_WORKSPACE_DIR: &str = ".vendor";

/// Bunch configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace layout settings
    pub workspace: WorkspaceConfig,

    /// External tool locations
    pub tools: ToolsConfig,
}

/// Workspace layout settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace directory relative to the project (default `.vendor`)
    pub dir: Option<String>,

    /// Compiled-artifact platform directory, e.g. `linux_amd64`
    pub platform: Option<String>,
}

/// Paths to the external programs Bunch drives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Go toolchain binary
    pub go: Option<PathBuf>,

    /// Git binary
    pub git: Option<PathBuf>,

    /// Mercurial binary
    pub hg: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.workspace.dir.is_some() {
            self.workspace.dir = other.workspace.dir;
        }
        if other.workspace.platform.is_some() {
            self.workspace.platform = other.workspace.platform;
        }

        if other.tools.go.is_some() {
            self.tools.go = other.tools.go;
        }
        if other.tools.git.is_some() {
            self.tools.git = other.tools.git;
        }
        if other.tools.hg.is_some() {
            self.tools.hg = other.tools.hg;
        }
    }

    /// The workspace directory name, falling back to `.vendor`.
    pub fn workspace_dir(&self) -> &str {
        self.workspace
            .dir
            .as_deref()
            .unwrap_or(DEFAULT_WORKSPACE_DIR)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.bunch.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.workspace_dir(), ".vendor");
        assert!(config.workspace.platform.is_none());
        assert!(config.tools.go.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[workspace]
dir = "_deps"
platform = "linux_arm64"

[tools]
git = "/usr/local/bin/git"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.workspace_dir(), "_deps");
        assert_eq!(config.workspace.platform, Some("linux_arm64".to_string()));
        assert_eq!(config.tools.git, Some(PathBuf::from("/usr/local/bin/git")));
        assert!(config.tools.hg.is_none());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.workspace.dir = Some("_deps".to_string());
        base.tools.go = Some(PathBuf::from("/usr/lib/go/bin/go"));

        let mut override_cfg = Config::default();
        override_cfg.tools.go = Some(PathBuf::from("/opt/go/bin/go"));

        base.merge(override_cfg);

        assert_eq!(base.tools.go, Some(PathBuf::from("/opt/go/bin/go")));
        assert_eq!(base.workspace_dir(), "_deps"); // Not overridden
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join(".bunch.toml");

        std::fs::write(
            &global_path,
            r#"
[workspace]
dir = "_global"

[tools]
hg = "/usr/bin/hg"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[workspace]
dir = "_project"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path);

        assert_eq!(config.workspace_dir(), "_project");
        assert_eq!(config.tools.hg, Some(PathBuf::from("/usr/bin/hg")));
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[workspace\ndir = ").unwrap();

        let config = Config::load_or_default(&config_path);
        assert_eq!(config.workspace_dir(), DEFAULT_WORKSPACE_DIR);
    }
}
