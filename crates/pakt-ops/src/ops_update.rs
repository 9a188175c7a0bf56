//! Operation: re-resolve dependencies ignoring the lock, then reinstall.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use pakt_core::lockfile::ComposerLock;
use pakt_core::manifest::normalize_package_name;
use pakt_core::scripts::POST_UPDATE_CMD;
use pakt_registry::version::coerce;
use pakt_resolver::ResolvedPackage;
use pakt_util::errors::PaktError;
use pakt_util::progress::{status, status_info};

use crate::ops_install::{apply, resolve_manifest, InstallOptions};

/// Options for `pakt update`.
#[derive(Debug, Default, Clone)]
pub struct UpdateOptions {
    /// Packages named on the command line. The whole graph is re-resolved
    /// either way; the names are only checked against the project.
    pub packages: Vec<String>,
    /// Show what would change without writing anything.
    pub dry_run: bool,
    pub install: InstallOptions,
}

/// One difference between the previous lock and a fresh resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockChange {
    Install { name: String, version: String },
    Upgrade { name: String, from: String, to: String },
    Downgrade { name: String, from: String, to: String },
    Remove { name: String, version: String },
}

impl fmt::Display for LockChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockChange::Install { name, version } => write!(f, "{name} ({version})"),
            LockChange::Upgrade { name, from, to } | LockChange::Downgrade { name, from, to } => {
                write!(f, "{name} ({from} => {to})")
            }
            LockChange::Remove { name, version } => write!(f, "{name} ({version})"),
        }
    }
}

impl LockChange {
    pub fn label(&self) -> &'static str {
        match self {
            LockChange::Install { .. } => "Locking",
            LockChange::Upgrade { .. } => "Upgrading",
            LockChange::Downgrade { .. } => "Downgrading",
            LockChange::Remove { .. } => "Removing",
        }
    }
}

pub fn update(project_root: &Path, opts: &UpdateOptions) -> miette::Result<Vec<LockChange>> {
    let (project, config) = crate::load_project(project_root)?;
    let old_lock = crate::read_lock(&project);

    for name in &opts.packages {
        let name = normalize_package_name(name);
        let known = project.manifest.constraint_for(&name).is_some()
            || old_lock.as_ref().is_some_and(|l| l.find(&name).is_some());
        if !known {
            return Err(PaktError::Generic {
                message: format!("Package '{name}' is not required by composer.json"),
            }
            .into());
        }
    }

    if opts.packages.is_empty() {
        status_info("Updating", "all dependencies");
    } else {
        status_info("Updating", &opts.packages.join(", "));
    }

    let packages = resolve_manifest(&project, &config)?;
    let changes = lock_changes(old_lock.as_ref(), &packages);
    if changes.is_empty() {
        status("Unchanged", "lock file is already up to date");
    }
    for change in &changes {
        status(change.label(), &change.to_string());
    }

    if opts.dry_run {
        return Ok(changes);
    }
    apply(&project, &config, packages, true, POST_UPDATE_CMD, &opts.install)?;
    Ok(changes)
}

/// Compare a previous lock against a resolution, sorted by package name.
pub fn lock_changes(old: Option<&ComposerLock>, new: &[ResolvedPackage]) -> Vec<LockChange> {
    let before: BTreeMap<&str, &str> = old
        .map(|lock| {
            lock.all_packages()
                .map(|p| (p.name.as_str(), p.version.as_str()))
                .collect()
        })
        .unwrap_or_default();
    let after: BTreeMap<&str, &str> = new
        .iter()
        .map(|p| (p.name.as_str(), p.version.as_str()))
        .collect();

    let mut changes = Vec::new();
    for (&name, &version) in &after {
        match before.get(name) {
            None => changes.push(LockChange::Install {
                name: name.to_string(),
                version: version.to_string(),
            }),
            Some(&from) if from != version => {
                let (name, from, to) = (name.to_string(), from.to_string(), version.to_string());
                let ordering = match (coerce(&from), coerce(&to)) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    _ => Ordering::Less,
                };
                changes.push(if ordering == Ordering::Greater {
                    LockChange::Downgrade { name, from, to }
                } else {
                    LockChange::Upgrade { name, from, to }
                });
            }
            Some(_) => {}
        }
    }
    for (&name, &version) in &before {
        if !after.contains_key(name) {
            changes.push(LockChange::Remove {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
    }
    changes.sort_by(|a, b| change_name(a).cmp(change_name(b)));
    changes
}

fn change_name(change: &LockChange) -> &str {
    match change {
        LockChange::Install { name, .. }
        | LockChange::Upgrade { name, .. }
        | LockChange::Downgrade { name, .. }
        | LockChange::Remove { name, .. } => name,
    }
}
