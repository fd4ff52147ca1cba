//! `bunch rebuild` command
//!
//! Also restores a workspace from checkouts already on disk.

use anyhow::Result;

use crate::commands::{install, Project};
use crate::GlobalOptions;
use bunch::core::Package;
use bunch::ops::InstallOptions;

pub fn execute(global_opts: &GlobalOptions) -> Result<()> {
    let project = Project::open(false, global_opts)?;
    let manifest = project.require_manifest("rebuild packages")?;
    let packages: Vec<Package> = manifest.packages().cloned().collect();

    install::install_packages(
        &project,
        &packages,
        &InstallOptions::rebuild(),
        &global_opts.shell,
    )
}
