//! `bunch outdated` command

use anyhow::Result;

use crate::cli::OutdatedArgs;
use crate::commands::{short_rev, Project};
use crate::GlobalOptions;
use bunch::ops::{outdated, OutdatedEntry, OutdatedOptions};
use bunch::util::Status;

pub fn execute(args: OutdatedArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let project = Project::open(false, global_opts)?;
    let manifest = project.require_manifest("check for outdated packages")?;

    let opts = OutdatedOptions {
        fetch: !args.offline,
    };
    let spinner = shell.spinner(Status::Fetching, "upstream revisions");
    let entries = outdated(&manifest, &project.resolver(), &opts)?;

    let stale: Vec<&OutdatedEntry> = entries.iter().filter(|e| e.is_outdated()).collect();
    if stale.is_empty() {
        spinner.finish(Status::Finished, "all packages up to date");
        return Ok(());
    }
    spinner.finish(
        Status::Finished,
        format!("{} of {} package(s) outdated", stale.len(), entries.len()),
    );

    for entry in stale {
        shell.status(Status::Outdated, describe(entry));
    }
    Ok(())
}

fn describe(entry: &OutdatedEntry) -> String {
    if !entry.installed {
        return format!("{} (not installed)", entry.repo);
    }

    let info = &entry.info;
    let installed = info.installed_revision.as_deref().unwrap_or("?");
    let mut text = match info.resolved_revision.as_deref() {
        Some(resolved) if entry.needs_update => format!(
            "{} {} -> {} ({} commit(s))",
            entry.repo,
            short_rev(installed),
            short_rev(resolved),
            info.commits_behind_resolved
        ),
        _ => format!("{} {}", entry.repo, short_rev(installed)),
    };
    if info.commits_behind_upstream > 0 {
        text.push_str(&format!(
            ", {} commit(s) behind upstream",
            info.commits_behind_upstream
        ));
    }
    text
}
