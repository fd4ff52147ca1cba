//! Go toolchain in GOPATH mode.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::toolchain::{DependencyList, Toolchain};
use crate::util::config::Config;
use crate::util::env::ExecContext;
use crate::util::process::resolve_program;

/// The subset of `go list -json` output we read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedPackage {
    #[serde(default)]
    import_path: Option<String>,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    test_imports: Vec<String>,
    #[serde(default)]
    x_test_imports: Vec<String>,
}

/// Drives the `go` command.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: PathBuf,
}

impl GoToolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        GoToolchain {
            program: program.into(),
        }
    }

    /// Toolchain using the configured `go`, falling back to `PATH`.
    pub fn from_config(config: &Config) -> Self {
        GoToolchain::new(resolve_program(config.tools.go.as_deref(), "go"))
    }

    /// Path of the `go` program.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn go(&self, ctx: &ExecContext, args: &[&str], what: &str, import_path: &str) -> Result<()> {
        ctx.command(&self.program)
            .args(args)
            .arg(import_path)
            .exec_and_check()
            .with_context(|| format!("failed {} package {}", what, import_path))?;
        Ok(())
    }
}

impl Toolchain for GoToolchain {
    fn fetch_source(&self, ctx: &ExecContext, import_path: &str) -> Result<()> {
        self.go(ctx, &["get", "-d"], "fetching", import_path)
    }

    fn fetch_transitive_deps(
        &self,
        ctx: &ExecContext,
        import_path: &str,
        dir: &Path,
    ) -> Result<()> {
        ctx.command(&self.program)
            .args(["get", "-u", "-d", "./..."])
            .cwd(dir)
            .exec_and_check()
            .with_context(|| format!("failed fetching dependencies of package {}", import_path))?;
        Ok(())
    }

    fn build(&self, ctx: &ExecContext, import_path: &str) -> Result<()> {
        self.go(ctx, &["build"], "building", import_path)
    }

    fn install(&self, ctx: &ExecContext, import_path: &str) -> Result<()> {
        self.go(ctx, &["install"], "installing", import_path)
    }

    fn list_dependencies(
        &self,
        ctx: &ExecContext,
        target: &str,
        dir: &Path,
    ) -> Result<DependencyList> {
        let out = ctx
            .command(&self.program)
            .args(["list", "-e", "-json", target])
            .cwd(dir)
            .exec_stdout()
            .with_context(|| format!("failed listing dependencies of {}", target))?;

        parse_list_output(&out).with_context(|| format!("unreadable `go list` output for {}", target))
    }
}

/// Parse the JSON stream `go list -json` prints, merging multiple packages.
fn parse_list_output(out: &str) -> Result<DependencyList> {
    let mut list = DependencyList::default();

    for listed in serde_json::Deserializer::from_str(out).into_iter::<ListedPackage>() {
        let listed = listed?;
        if list.import_path.is_none() {
            list.import_path = listed.import_path;
        }
        merge_unique(&mut list.deps, listed.deps);
        merge_unique(&mut list.test_deps, listed.test_imports);
        merge_unique(&mut list.test_deps, listed.x_test_imports);
    }

    Ok(list)
}

fn merge_unique(into: &mut Vec<String>, from: Vec<String>) {
    for item in from {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}
