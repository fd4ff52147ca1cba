//! `bunch prune` command

use anyhow::Result;

use crate::commands::Project;
use crate::GlobalOptions;
use bunch::util::Status;

pub fn execute(global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let project = Project::open(false, global_opts)?;
    let manifest = project.require_manifest("prune")?;

    let spinner = shell.spinner(Status::Pruning, project.ws.root().display());
    let report = project.graph().prune(&manifest, &project.vcs)?;
    spinner.finish(
        Status::Finished,
        format!("pruned {} package(s)", report.removed.len()),
    );

    for repo in &report.removed {
        shell.status(Status::Removed, repo);
    }
    Ok(())
}
