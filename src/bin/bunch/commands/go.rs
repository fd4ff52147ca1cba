//! `bunch go` command

use anyhow::Result;

use crate::cli::GoArgs;
use crate::commands::Project;
use crate::GlobalOptions;

pub fn execute(args: GoArgs, global_opts: &GlobalOptions) -> Result<()> {
    let project = Project::open(false, global_opts)?;

    let code = project
        .exec
        .command(project.toolchain.program())
        .args(&args.args)
        .run_interactive()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
