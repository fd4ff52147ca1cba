//! `bunch install` command

use anyhow::Result;

use crate::cli::InstallArgs;
use crate::commands::{short_rev, Project};
use crate::GlobalOptions;
use bunch::core::{Package, MANIFEST_NAME};
use bunch::ops::{InstallOptions, InstallReport, InstallState};
use bunch::util::{Shell, Status};

pub fn execute(args: InstallArgs, global_opts: &GlobalOptions) -> Result<()> {
    run(args, InstallOptions::install(), global_opts)
}

/// Install from the Bunchfile, or install (and optionally save) the named
/// packages.
pub fn run(args: InstallArgs, mode: InstallOptions, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let project = Project::open(args.global, global_opts)?;

    if args.packages.is_empty() {
        let manifest = project.require_manifest("install packages")?;
        let packages: Vec<Package> = manifest.packages().cloned().collect();
        return install_packages(&project, &packages, &mode, shell);
    }

    let mut manifest = project.manifest_or_new()?;
    let packages: Vec<Package> = args
        .packages
        .iter()
        .map(|arg| {
            let mut pkg = Package::parse_arg(arg, project.gctx.cwd());
            pkg.locked_revision = manifest
                .package(&pkg.repo)
                .and_then(|saved| saved.locked_revision.clone());
            pkg
        })
        .collect();

    install_packages(&project, &packages, &mode, shell)?;

    if args.save {
        let count = packages.len();
        for pkg in packages {
            manifest.add_package(pkg);
        }
        project.save_manifest(&manifest)?;
        shell.note(format!("saved {} package(s) to {}", count, MANIFEST_NAME));
    }

    Ok(())
}

pub fn install_packages(
    project: &Project,
    packages: &[Package],
    mode: &InstallOptions,
    shell: &Shell,
) -> Result<()> {
    let spinner = shell.spinner(
        Status::Installing,
        format!("{} package(s) into {}", packages.len(), project.ws.root().display()),
    );
    let report = project.installer().install(packages, mode)?;

    if report.is_up_to_date() {
        spinner.finish(Status::Finished, "all packages up to date");
    } else {
        let count = report.updated().count();
        spinner.finish(Status::Finished, format!("{} package(s) installed", count));
    }
    print_report(&report, shell);
    Ok(())
}

fn print_report(report: &InstallReport, shell: &Shell) {
    for outcome in &report.packages {
        if outcome.link_created {
            shell.status(Status::Linked, &outcome.repo);
        }
        if outcome.state != InstallState::Installed {
            continue;
        }
        match &outcome.revision {
            Some(rev) => shell.status(
                Status::Installed,
                format!("{} ({})", outcome.repo, short_rev(rev)),
            ),
            None => shell.status(Status::Installed, &outcome.repo),
        }
    }
}
