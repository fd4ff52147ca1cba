//! `bunch update` command

use anyhow::Result;

use crate::cli::InstallArgs;
use crate::commands::install;
use crate::GlobalOptions;
use bunch::ops::InstallOptions;

pub fn execute(args: InstallArgs, global_opts: &GlobalOptions) -> Result<()> {
    install::run(args, InstallOptions::update(), global_opts)
}
