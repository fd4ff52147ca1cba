//! Command implementations

pub mod completions;
pub mod exec;
pub mod generate;
pub mod go;
pub mod install;
pub mod lock;
pub mod outdated;
pub mod prune;
pub mod rebuild;
pub mod uninstall;
pub mod update;

use anyhow::{bail, Result};
use tracing::debug;

use bunch::core::{Lockfile, Manifest, Workspace, MANIFEST_NAME};
use bunch::ops::{DependencyGraph, Installer};
use bunch::resolver::VersionResolver;
use bunch::toolchain::GoToolchain;
use bunch::util::{ExecContext, GlobalContext};
use bunch::vcs::VcsBackends;

use crate::GlobalOptions;

/// The current project with the workspace and adapters commands act on.
pub struct Project {
    pub gctx: GlobalContext,
    pub ws: Workspace,
    pub exec: ExecContext,
    pub vcs: VcsBackends,
    pub toolchain: GoToolchain,
}

impl Project {
    /// Open the project in the current directory.
    ///
    /// Commands act on the project's vendored workspace, or on the user's
    /// `GOPATH` when `global` is set.
    pub fn open(global: bool, opts: &GlobalOptions) -> Result<Self> {
        let mut gctx = GlobalContext::new()?;
        gctx.set_verbose(opts.verbose);
        gctx.set_color(opts.shell.use_color());
        let config = gctx.config();

        let mut ws = if global {
            Workspace::global()?
        } else {
            Workspace::new(gctx.cwd().join(config.workspace_dir()))
        };
        if let Some(platform) = &config.workspace.platform {
            ws = ws.with_platform(platform.clone());
        }
        ws.ensure_layout()?;
        debug!("workspace: {}", ws.root().display());

        let exec = if global {
            ExecContext::global(gctx.cwd(), &ws)
        } else {
            ExecContext::vendored(gctx.cwd(), &ws)
        };

        Ok(Project {
            vcs: VcsBackends::new(&config),
            toolchain: GoToolchain::from_config(&config),
            gctx,
            ws,
            exec,
        })
    }

    pub fn has_manifest(&self) -> bool {
        self.gctx.manifest_path().is_file()
    }

    /// Load the Bunchfile with lockfile pins applied.
    pub fn load_manifest(&self) -> Result<Manifest> {
        let mut manifest = Manifest::load(&self.gctx.manifest_path())?;
        if let Some(lock) = Lockfile::load(&self.gctx.lockfile_path())? {
            manifest.apply_lock(&lock);
        }
        Ok(manifest)
    }

    /// Load the Bunchfile, failing with `can't <action> without Bunchfile`.
    pub fn require_manifest(&self, action: &str) -> Result<Manifest> {
        if !self.has_manifest() {
            bail!("can't {} without {}", action, MANIFEST_NAME);
        }
        self.load_manifest()
    }

    /// Load the Bunchfile, or start an empty one.
    pub fn manifest_or_new(&self) -> Result<Manifest> {
        if self.has_manifest() {
            self.load_manifest()
        } else {
            Ok(Manifest::new(self.gctx.cwd()))
        }
    }

    pub fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        manifest.save(&self.gctx.manifest_path())
    }

    pub fn resolver(&self) -> VersionResolver<'_> {
        VersionResolver::new(&self.ws, &self.vcs)
    }

    pub fn installer(&self) -> Installer<'_> {
        Installer::new(&self.ws, &self.vcs, &self.toolchain, &self.exec)
    }

    pub fn graph(&self) -> DependencyGraph<'_> {
        DependencyGraph::new(&self.ws, &self.toolchain, &self.exec)
    }
}

/// Abbreviate a revision for display.
pub fn short_rev(rev: &str) -> &str {
    rev.get(..10).unwrap_or(rev)
}
