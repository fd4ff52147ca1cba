//! `bunch lock` command

use anyhow::Result;

use crate::commands::Project;
use crate::GlobalOptions;
use bunch::core::LOCKFILE_NAME;
use bunch::ops::lock;
use bunch::util::Status;

pub fn execute(global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let project = Project::open(false, global_opts)?;
    let manifest = project.require_manifest("lock packages")?;

    let report = lock(&manifest, &project.resolver())?;
    for repo in &report.not_installed {
        shell.warn(format!("{} is not installed, locked to its spec", repo));
    }

    report.lockfile.save(&project.gctx.lockfile_path())?;
    shell.status(
        Status::Locked,
        format!("{} package(s) to {}", report.lockfile.len(), LOCKFILE_NAME),
    );
    Ok(())
}
