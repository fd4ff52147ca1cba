//! Workspace - the on-disk tree packages are installed into.
//!
//! A workspace root holds three subtrees:
//! - `src/<import path>` - package sources, one checkout per repository
//! - `pkg/<os>_<arch>/<import path>.a` - compiled package archives
//! - `bin/<name>` - installed binaries

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::fs;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Bunchfile";

/// Canonical lockfile name.
pub const LOCKFILE_NAME: &str = "Bunchfile.lock";

/// A workspace root and its layout.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root directory (what `GOPATH` points at)
    root: PathBuf,

    /// Platform directory under `pkg/`
    platform: String,
}

impl Workspace {
    /// Create a workspace rooted at `root` for the host platform.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Workspace {
            root: root.into(),
            platform: host_platform(),
        }
    }

    /// The user's global workspace: the first `GOPATH` entry, else `~/go`.
    pub fn global() -> Result<Self> {
        if let Some(gopath) = std::env::var_os("GOPATH") {
            if let Some(first) = std::env::split_paths(&gopath).next() {
                if !first.as_os_str().is_empty() {
                    return Ok(Workspace::new(first));
                }
            }
        }

        let home = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .context("failed to determine home directory for the global workspace")?;
        Ok(Workspace::new(home.join("go")))
    }

    /// Override the compiled-artifact platform directory.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Get the workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the platform directory name, e.g. `linux_amd64`.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Root of all package sources.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Root of compiled archives for this platform.
    pub fn pkg_dir(&self) -> PathBuf {
        self.root.join("pkg").join(&self.platform)
    }

    /// Directory installed binaries land in.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Source directory of a package.
    pub fn package_dir(&self, import_path: &str) -> PathBuf {
        join_import_path(&self.src_dir(), import_path)
    }

    /// Compiled archive of a package.
    pub fn artifact_path(&self, import_path: &str) -> PathBuf {
        let mut path = join_import_path(&self.pkg_dir(), import_path).into_os_string();
        path.push(".a");
        PathBuf::from(path)
    }

    /// Archive directory holding a package's sub-package archives.
    pub fn artifact_dir(&self, import_path: &str) -> PathBuf {
        join_import_path(&self.pkg_dir(), import_path)
    }

    /// Binary a `main` package installs as (named after its last segment).
    pub fn binary_path(&self, import_path: &str) -> Option<PathBuf> {
        let name = import_path.trim_end_matches('/').rsplit('/').next()?;
        if name.is_empty() {
            return None;
        }
        let file = if cfg!(windows) {
            format!("{}.exe", name)
        } else {
            name.to_string()
        };
        Some(self.bin_dir().join(file))
    }

    /// Whether a package's source is present (links count even if dangling).
    pub fn contains(&self, import_path: &str) -> bool {
        fs::exists_no_follow(&self.package_dir(import_path))
    }

    /// Whether a package has a compiled archive or an installed binary.
    pub fn has_artifact(&self, import_path: &str) -> bool {
        self.artifact_path(import_path).exists()
            || self
                .binary_path(import_path)
                .is_some_and(|path| path.exists())
    }

    /// Import path of a directory under `src/`, with `/` separators.
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        let src = self.src_dir();
        let relative = dir.strip_prefix(&src).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    /// Create `bin/`, `pkg/` and `src/` if they don't exist yet.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [self.bin_dir(), self.root.join("pkg"), self.src_dir()] {
            fs::ensure_dir(&dir)?;
        }
        Ok(())
    }
}

fn join_import_path(base: &Path, import_path: &str) -> PathBuf {
    import_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

/// The Go-style `os_arch` name of the host.
pub fn host_platform() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    };
    format!("{}_{}", os, arch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_workspace_paths() {
        let ws = Workspace::new("/work/.vendor").with_platform("linux_amd64");

        assert_eq!(
            ws.package_dir("example.org/user/lib"),
            PathBuf::from("/work/.vendor/src/example.org/user/lib")
        );
        assert_eq!(
            ws.artifact_path("example.org/user/lib"),
            PathBuf::from("/work/.vendor/pkg/linux_amd64/example.org/user/lib.a")
        );
        assert!(ws
            .binary_path("example.org/user/tool")
            .unwrap()
            .starts_with("/work/.vendor/bin"));
    }

    #[test]
    fn test_import_path_of() {
        let ws = Workspace::new("/work/.vendor");

        assert_eq!(
            ws.import_path_of(Path::new("/work/.vendor/src/example.org/a/b")),
            Some("example.org/a/b".to_string())
        );
        assert_eq!(ws.import_path_of(Path::new("/work/.vendor/src")), None);
        assert_eq!(ws.import_path_of(Path::new("/elsewhere")), None);
    }

    #[test]
    fn test_has_artifact_accepts_binary() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path());
        ws.ensure_layout().unwrap();

        assert!(!ws.has_artifact("example.org/user/tool"));

        let bin = ws.binary_path("example.org/user/tool").unwrap();
        std::fs::write(&bin, "").unwrap();
        assert!(ws.has_artifact("example.org/user/tool"));
    }

    #[test]
    fn test_ensure_layout() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path().join(".vendor"));

        ws.ensure_layout().unwrap();

        assert!(ws.src_dir().is_dir());
        assert!(ws.bin_dir().is_dir());
        assert!(ws.root().join("pkg").is_dir());
        assert!(!ws.contains("example.org/lib"));
    }
}
