//! Command dispatch and handler modules.

mod audit;
mod cache;
mod init;
mod install;
mod remove;
mod require;
mod run;
mod search;
mod show;
mod tree;
mod update;
mod validate;
mod why;

use std::path::PathBuf;

use miette::Result;
use pakt_core::package::Project;
use pakt_util::errors::PaktError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    tracing::debug!("dispatching {:?}", cli.command);
    match cli.command {
        Command::Install {
            no_dev,
            no_scripts,
        } => install::exec(no_dev, no_scripts),
        Command::Update {
            packages,
            dry_run,
            no_dev,
            no_scripts,
        } => update::exec(packages, dry_run, no_dev, no_scripts),
        Command::Require {
            packages,
            dev,
            no_update,
            no_scripts,
        } => require::exec(packages, dev, no_update, no_scripts),
        Command::Remove {
            packages,
            no_update,
            no_scripts,
        } => remove::exec(packages, no_update, no_scripts),
        Command::Show { package } => show::exec(package),
        Command::Why { package } => why::exec(package),
        Command::WhyNot { package, version } => why::exec_not(package, version),
        Command::Tree {
            depth,
            inverted,
            package,
            conflicts,
        } => tree::exec(depth, inverted, package, conflicts),
        Command::Init { name, description } => init::exec(name, description),
        Command::Validate { strict } => validate::exec(strict),
        Command::Search { query, limit } => search::exec(&query.join(" "), limit),
        Command::Run { script, args } => run::exec(script, args),
        Command::Audit { fail_on, ignore } => audit::exec(fail_on, ignore),
        Command::Cache { action } => cache::exec(action),
    }
}

fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir().map_err(PaktError::Io)?)
}

/// Directory of the nearest composer.json at or above the working directory.
fn project_root() -> Result<PathBuf> {
    let cwd = current_dir()?;
    Ok(Project::discover(&cwd)?.root_dir)
}
