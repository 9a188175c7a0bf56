//! CLI argument definitions for pakt.
//!
//! Uses `clap` derive macros to define the full command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pakt",
    version,
    about = "A fast dependency manager for PHP",
    long_about = "Pakt resolves, locks and installs Composer packages from Packagist. \
                  It reads composer.json, writes composer.lock and generates \
                  vendor/autoload.php."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install dependencies from composer.lock, or resolve and lock them
    #[command(alias = "i")]
    Install {
        /// Skip require-dev packages and autoload-dev
        #[arg(long)]
        no_dev: bool,
        /// Do not run post-install-cmd scripts
        #[arg(long)]
        no_scripts: bool,
    },

    /// Re-resolve dependencies ignoring composer.lock
    #[command(alias = "u")]
    Update {
        /// Packages to update (the whole graph is re-resolved)
        packages: Vec<String>,
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Skip require-dev packages and autoload-dev
        #[arg(long)]
        no_dev: bool,
        /// Do not run post-update-cmd scripts
        #[arg(long)]
        no_scripts: bool,
    },

    /// Add packages to composer.json and install them
    Require {
        /// Packages as vendor/package[:constraint]
        #[arg(required = true)]
        packages: Vec<String>,
        /// Add to require-dev
        #[arg(long)]
        dev: bool,
        /// Only edit composer.json
        #[arg(long)]
        no_update: bool,
        /// Do not run post-update-cmd scripts
        #[arg(long)]
        no_scripts: bool,
    },

    /// Remove packages from composer.json
    #[command(alias = "rm")]
    Remove {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
        /// Only edit composer.json
        #[arg(long)]
        no_update: bool,
        /// Do not run post-update-cmd scripts
        #[arg(long)]
        no_scripts: bool,
    },

    /// List installed packages, or show details for one
    Show {
        /// Package name
        package: Option<String>,
    },

    /// Explain why a package is installed
    Why {
        /// Package name
        package: String,
    },

    /// Explain why a package version cannot be installed
    WhyNot {
        /// Package name
        package: String,
        /// Version to check
        version: String,
    },

    /// Print the dependency tree
    Tree {
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Show inverted tree (dependents)
        #[arg(long)]
        inverted: bool,
        /// Show the packages that require this one
        #[arg(long)]
        package: Option<String>,
        /// Show version conflicts repaired during resolution
        #[arg(long)]
        conflicts: bool,
    },

    /// Create a composer.json in the current directory
    Init {
        /// Package name (vendor/project)
        #[arg(long)]
        name: Option<String>,
        /// Package description
        #[arg(long)]
        description: Option<String>,
    },

    /// Validate composer.json
    Validate {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Search Packagist
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
        /// Show at most this many results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run a script defined in composer.json
    #[command(alias = "run-script")]
    Run {
        /// Script name
        script: String,
        /// Arguments passed to the script
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Scan dependencies for known vulnerabilities (OSV database)
    Audit {
        /// Minimum severity to fail on: low, moderate, high, critical
        #[arg(long)]
        fail_on: Option<String>,
        /// Advisory IDs to ignore
        #[arg(long)]
        ignore: Vec<String>,
    },

    /// Manage the archive cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache location and size
    Stats,
    /// Remove all cached archives
    #[command(alias = "clean")]
    Clear,
}

/// Parse CLI arguments from the environment.
pub fn parse() -> Cli {
    Cli::parse()
}
