//! Bunch CLI - npm-like dependency management for Go

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use bunch::util::Shell;
use cli::{Cli, Commands};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
    pub verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("bunch=debug")
        } else if cli.quiet {
            EnvFilter::new("bunch=warn")
        } else {
            EnvFilter::new("bunch=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let opts = GlobalOptions {
        shell: Shell::from_flags(cli.quiet, cli.verbose, cli.color),
        verbose: cli.verbose,
    };

    // Execute command
    match cli.command {
        Commands::Install(args) => commands::install::execute(args, &opts),
        Commands::Update(args) => commands::update::execute(args, &opts),
        Commands::Uninstall(args) => commands::uninstall::execute(args, &opts),
        Commands::Prune => commands::prune::execute(&opts),
        Commands::Outdated(args) => commands::outdated::execute(args, &opts),
        Commands::Lock => commands::lock::execute(&opts),
        Commands::Rebuild => commands::rebuild::execute(&opts),
        Commands::Generate(args) => commands::generate::execute(args, &opts),
        Commands::Exec(args) => commands::exec::execute(args, &opts),
        Commands::Go(args) => commands::go::execute(args, &opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
