//! `bunch generate` command

use anyhow::{bail, Result};

use crate::cli::GenerateArgs;
use crate::commands::Project;
use crate::GlobalOptions;
use bunch::core::MANIFEST_NAME;
use bunch::ops::generate;
use bunch::util::Status;

pub fn execute(args: GenerateArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    // The project's own import path is only known inside the user's GOPATH.
    let project = Project::open(true, global_opts)?;

    if project.has_manifest() && !args.force {
        bail!("{} already exists; pass --force to overwrite it", MANIFEST_NAME);
    }

    let manifest = generate(&project.toolchain, &project.exec, project.gctx.cwd())?;
    project.save_manifest(&manifest)?;

    shell.status(
        Status::Generated,
        format!("{} with {} package(s)", MANIFEST_NAME, manifest.packages().count()),
    );
    Ok(())
}
