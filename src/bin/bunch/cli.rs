//! CLI definitions using clap.

use std::ffi::OsString;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use bunch::util::shell::ColorChoice;

/// Bunch - npm-like tool for managing Go dependencies
#[derive(Parser)]
#[command(name = "bunch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install packages from the Bunchfile, or the given packages
    #[command(visible_alias = "i")]
    Install(InstallArgs),

    /// Update packages to the newest revision their spec allows
    #[command(visible_alias = "u")]
    Update(InstallArgs),

    /// Uninstall packages no longer needed
    #[command(visible_alias = "r")]
    Uninstall(UninstallArgs),

    /// Remove packages the Bunchfile no longer reaches
    Prune,

    /// List packages that are behind their spec or upstream
    Outdated(OutdatedArgs),

    /// Write Bunchfile.lock with the revisions currently resolved
    Lock,

    /// Rebuild every package from what is already checked out
    Rebuild,

    /// Generate a Bunchfile from the current package's imports
    Generate(GenerateArgs),

    /// Run a command inside the vendored workspace
    Exec(ExecArgs),

    /// Run the go tool inside the vendored workspace
    Go(GoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InstallArgs {
    /// Packages as `path[@spec]`; `user/repo` is GitHub shorthand
    pub packages: Vec<String>,

    /// Save the packages to the Bunchfile
    #[arg(long)]
    pub save: bool,

    /// Use the global GOPATH instead of the vendored workspace
    #[arg(short = 'g', long = "global")]
    pub global: bool,
}

#[derive(Args)]
pub struct UninstallArgs {
    /// Import paths to uninstall
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Remove the packages from the Bunchfile
    #[arg(long)]
    pub save: bool,

    /// Use the global GOPATH instead of the vendored workspace
    #[arg(short = 'g', long = "global")]
    pub global: bool,
}

#[derive(Args)]
pub struct OutdatedArgs {
    /// Compare against what was last fetched instead of fetching
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Overwrite an existing Bunchfile
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ExecArgs {
    /// Command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<OsString>,
}

#[derive(Args)]
pub struct GoArgs {
    /// Arguments passed to `go`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<OsString>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
