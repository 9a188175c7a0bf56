//! Operation: install dependencies.
//!
//! A `composer.lock` whose content hash matches the manifest is installed
//! verbatim without contacting the registry. Otherwise the manifest is
//! resolved and a new lock is written before anything is downloaded.

use std::path::Path;

use pakt_core::config::GlobalConfig;
use pakt_core::lockfile::{ComposerLock, LockedPackage};
use pakt_core::package::Project;
use pakt_core::scripts::POST_INSTALL_CMD;
use pakt_core::LOCK_FILE;
use pakt_resolver::{resolve_from_lock, ResolvedPackage, Resolver};
use pakt_util::progress::{spinner, status, status_info, status_warn};

use crate::autoload::{self, AutoloadGenerator};
use crate::installer::{InstallReport, Installer};
use crate::ops_run::ScriptRunner;

/// Options shared by `pakt install`, `pakt update` and `pakt require`.
#[derive(Debug, Default, Clone)]
pub struct InstallOptions {
    /// Leave out packages only reachable from `require-dev`, and `autoload-dev`.
    pub no_dev: bool,
    /// Do not run `post-install-cmd` / `post-update-cmd`.
    pub no_scripts: bool,
}

/// Install from the lock when it is fresh, else resolve and lock first.
pub fn install(project_root: &Path, opts: &InstallOptions) -> miette::Result<InstallReport> {
    let (project, config) = crate::load_project(project_root)?;
    status_info("Installing", &project_label(&project));

    let fresh_lock = crate::read_lock(&project).filter(|lock| {
        let fresh = lock.is_fresh(&project.manifest);
        if !fresh {
            status_warn(
                "Warning",
                &format!("{LOCK_FILE} is out of date with composer.json, resolving again"),
            );
        }
        fresh
    });

    match fresh_lock {
        Some(lock) => {
            status_info("Locked", &format!("installing from {LOCK_FILE}"));
            let packages = resolve_from_lock(&lock);
            apply(&project, &config, packages, false, POST_INSTALL_CMD, opts)
        }
        None => {
            let packages = resolve_manifest(&project, &config)?;
            apply(&project, &config, packages, true, POST_INSTALL_CMD, opts)
        }
    }
}

/// Resolve the project's manifest against the configured registry.
pub(crate) fn resolve_manifest(
    project: &Project,
    config: &GlobalConfig,
) -> miette::Result<Vec<ResolvedPackage>> {
    let client = crate::registry_client(config)?;
    let mut resolver = Resolver::new(&client);

    let sp = spinner("Resolving dependencies...");
    let result = resolver.resolve(&project.manifest);
    sp.finish_and_clear();
    let packages = result?;

    if !resolver.conflicts().is_empty() {
        tracing::debug!("{}", resolver.conflicts());
    }
    status("Resolved", &format!("{} packages", packages.len()));
    Ok(packages)
}

/// Lock (when `relock`), download, generate the autoloader and fire `event`.
pub(crate) fn apply(
    project: &Project,
    config: &GlobalConfig,
    mut packages: Vec<ResolvedPackage>,
    relock: bool,
    event: &str,
    opts: &InstallOptions,
) -> miette::Result<InstallReport> {
    if relock {
        write_lock(project, &packages)?;
        status("Writing", LOCK_FILE);
    }
    if opts.no_dev {
        packages.retain(|p| !p.dev);
    }

    let vendor_dir = project.vendor_dir();
    let installer = Installer::new(
        &vendor_dir,
        crate::archive_cache(project, config),
        config.install.workers,
    );
    let report = installer.install(&packages)?;
    let removed = if report.removed > 0 {
        format!(", {} removed", report.removed)
    } else {
        String::new()
    };
    status(
        "Installed",
        &format!(
            "{} packages, {} up to date{removed}",
            report.installed, report.up_to_date
        ),
    );

    autoload::refresh_from_vendor(&vendor_dir, &mut packages);
    let summary = AutoloadGenerator::new(&project.root_dir, &vendor_dir, !opts.no_dev)
        .generate(&project.manifest, &packages)?;
    status(
        "Generated",
        &format!(
            "autoload files ({} namespaces, {} classes, {} files)",
            summary.namespaces, summary.classes, summary.files
        ),
    );

    if !opts.no_scripts {
        ScriptRunner::new(project).run_event(event)?;
    }
    Ok(report)
}

/// Write `composer.lock`: packages reachable from `require` go to
/// `packages`, the rest to `packages-dev`, each sorted by name.
pub(crate) fn write_lock(project: &Project, packages: &[ResolvedPackage]) -> miette::Result<()> {
    let section = |dev: bool| -> Vec<LockedPackage> {
        let mut locked: Vec<LockedPackage> = packages
            .iter()
            .filter(|p| p.dev == dev)
            .map(ResolvedPackage::to_locked)
            .collect();
        locked.sort_by(|a, b| a.name.cmp(&b.name));
        locked
    };
    let lock = ComposerLock::new(&project.manifest, section(false), section(true))?;
    lock.write_to(&project.lock_path())
}

pub(crate) fn project_label(project: &Project) -> String {
    project
        .manifest
        .name
        .clone()
        .unwrap_or_else(|| project.root_dir.display().to_string())
}
