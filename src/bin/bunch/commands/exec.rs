//! `bunch exec` command
//!
//! Runs an arbitrary command with `GOPATH` and `PATH` pointing into the
//! vendored workspace.

use anyhow::{Context, Result};

use crate::cli::ExecArgs;
use crate::commands::Project;
use crate::GlobalOptions;

pub fn execute(args: ExecArgs, global_opts: &GlobalOptions) -> Result<()> {
    let project = Project::open(false, global_opts)?;
    let (program, rest) = args
        .command
        .split_first()
        .context("exec requires a command")?;

    let code = project.exec.command(program).args(rest).run_interactive()?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
