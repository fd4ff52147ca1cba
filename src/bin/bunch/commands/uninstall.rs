//! `bunch uninstall` command

use anyhow::{bail, Result};

use crate::cli::UninstallArgs;
use crate::commands::Project;
use crate::GlobalOptions;
use bunch::core::{Package, MANIFEST_NAME};
use bunch::util::Status;

pub fn execute(args: UninstallArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let project = Project::open(args.global, global_opts)?;
    let mut manifest = project.manifest_or_new()?;

    let targets: Vec<String> = args
        .packages
        .iter()
        .map(|arg| Package::parse_arg(arg, project.gctx.cwd()).repo)
        .collect();

    let report = project.graph().remove_packages(&targets, &manifest)?;

    for repo in &report.removed {
        shell.status(Status::Removed, repo);
    }
    for repo in &report.not_installed {
        shell.status(Status::Skipped, format!("{} is not installed", repo));
    }
    for conflict in &report.conflicts {
        shell.error(conflict);
    }

    if args.save {
        let mut changed = false;
        for target in &targets {
            if report.conflicts.iter().any(|c| &c.package == target) {
                continue;
            }
            changed |= manifest.remove_package(target);
        }
        if changed {
            project.save_manifest(&manifest)?;
            shell.note(format!("updated {}", MANIFEST_NAME));
        }
    }

    if !report.conflicts.is_empty() {
        bail!(
            "{} package(s) could not be removed",
            report.conflicts.len()
        );
    }
    Ok(())
}
