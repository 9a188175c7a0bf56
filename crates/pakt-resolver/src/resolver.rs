//! Core dependency resolution: a recursive, constraint-driven walk over
//! registry metadata with last-writer-wins conflict repair and a cycle
//! guard.
//!
//! Top-level requirements are processed `require` first, then
//! `require-dev`, each in sorted name order. Every package is fetched on
//! first sight, the greatest version satisfying the constraint is chosen,
//! and its own requirements are walked before it is emitted, so the output
//! lists dependencies before their dependents. When a later requirer's
//! constraint excludes a version chosen earlier, the earlier choice is
//! dropped and the package is resolved again against the new constraint.
//! Constraints are never intersected, so whichever requirer is processed
//! last wins.

use std::collections::{BTreeMap, HashSet, VecDeque};

use miette::Diagnostic;
use serde_json::{Map, Value};
use thiserror::Error;

use pakt_core::lockfile::{ComposerLock, DistInfo, LockedPackage, SourceInfo};
use pakt_core::manifest::ComposerJson;
use pakt_registry::{Registry, RegistryError, VersionRecord};
use pakt_util::progress;

use crate::conflict::{ConflictReport, PackageConflict};
use crate::constraint::{find_matching_version, normalize_constraint, normalize_version, Constraint};
use crate::platform::is_platform_package;
use crate::state::{PackageState, ResolutionState};

/// Conflict repairs allowed per package before the run is abandoned.
pub const MAX_REPAIRS: u32 = 8;

#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("failed to fetch package {name}")]
    #[diagnostic(code(pakt::resolve::registry))]
    Registry {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error("no matching version for {name} {constraint}: no version matches constraint: {constraint}")]
    #[diagnostic(
        code(pakt::resolve::no_match),
        help("Run `pakt show` or check https://packagist.org for the published versions")
    )]
    NoMatchingVersion { name: String, constraint: String },

    #[error("failed to resolve {name}")]
    Dependency {
        name: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("failed to resolve dev dependency {name}")]
    DevDependency {
        name: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("conflict loop on {name}: re-resolved too many times, last constraint {constraint}")]
    #[diagnostic(
        code(pakt::resolve::conflict_loop),
        help("Two or more packages keep requiring incompatible versions of each other. Pin one of them in composer.json")
    )]
    ConflictLoop { name: String, constraint: String },

    #[error("package {target} not found in dependency tree")]
    #[diagnostic(code(pakt::resolve::not_in_tree))]
    NotInTree { target: String },
}

impl ResolveError {
    /// The innermost error, past any `Dependency` wrappers.
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Dependency { source, .. } | ResolveError::DevDependency { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

/// One package selected for installation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    /// Archive location; empty for metapackages.
    pub url: String,
    pub require: BTreeMap<String, String>,
    pub autoload: Option<Value>,
    /// Only reachable from `require-dev`.
    pub dev: bool,
    pub dist: Option<DistInfo>,
    pub source: Option<SourceInfo>,
    pub package_type: Option<String>,
    pub description: Option<String>,
    pub metadata: Map<String, Value>,
}

impl ResolvedPackage {
    pub fn from_record(record: &VersionRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: record.version.clone(),
            url: record.download_url().unwrap_or_default().to_string(),
            require: record.require.clone(),
            autoload: record.autoload.clone(),
            dev: false,
            dist: record.dist.clone(),
            source: record.source.clone(),
            package_type: record.package_type.clone(),
            description: record.description.clone(),
            metadata: record.metadata.clone(),
        }
    }

    pub fn from_locked(locked: &LockedPackage, dev: bool) -> Self {
        Self {
            name: locked.name.clone(),
            version: locked.version.clone(),
            url: locked.download_url().unwrap_or_default().to_string(),
            require: locked.require.clone(),
            autoload: locked.autoload.clone(),
            dev,
            dist: locked.dist.clone(),
            source: locked.source.clone(),
            package_type: locked.package_type.clone(),
            description: locked.description.clone(),
            metadata: locked.other.clone(),
        }
    }

    pub fn to_locked(&self) -> LockedPackage {
        LockedPackage {
            name: self.name.clone(),
            version: self.version.clone(),
            source: self.source.clone(),
            dist: self.dist.clone(),
            require: self.require.clone(),
            package_type: self.package_type.clone(),
            autoload: self.autoload.clone(),
            description: self.description.clone(),
            other: self.metadata.clone(),
        }
    }

    /// Whether there is anything to download.
    pub fn is_installable(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Resolution engine over a [`Registry`].
///
/// State is reset at the start of every [`Resolver::resolve`] call; the
/// conflicts repaired by the last run stay available through
/// [`Resolver::conflicts`].
pub struct Resolver<R> {
    registry: R,
    state: ResolutionState,
    conflicts: ConflictReport,
}

impl<R: Registry> Resolver<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            state: ResolutionState::new(),
            conflicts: ConflictReport::new(),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Conflicts repaired during the most recent run.
    pub fn conflicts(&self) -> &ConflictReport {
        &self.conflicts
    }

    /// Resolve every non-platform requirement of `manifest` into a flat,
    /// deduplicated list in dependency-before-dependent order.
    pub fn resolve(&mut self, manifest: &ComposerJson) -> Result<Vec<ResolvedPackage>, ResolveError> {
        self.state = ResolutionState::new();
        self.conflicts = ConflictReport::new();

        for (name, constraint) in &manifest.require {
            if is_platform_package(name) {
                continue;
            }
            self.resolve_dependency(name, constraint)
                .map_err(|e| ResolveError::Dependency {
                    name: name.clone(),
                    source: Box::new(e),
                })?;
        }
        for (name, constraint) in &manifest.require_dev {
            if is_platform_package(name) {
                continue;
            }
            self.resolve_dependency(name, constraint)
                .map_err(|e| ResolveError::DevDependency {
                    name: name.clone(),
                    source: Box::new(e),
                })?;
        }

        let state = std::mem::take(&mut self.state);
        tracing::debug!(
            "resolution visited {} packages, {} conflicts repaired",
            state.visited_count(),
            self.conflicts.len()
        );
        let production = closure(manifest.require.keys(), &state);
        let development = closure(manifest.require_dev.keys(), &state);
        let mut packages = state.into_packages();
        for package in &mut packages {
            // Leftovers of a superseded version belong to neither closure;
            // they stay with the production packages.
            package.dev = !production.contains(package.name.as_str())
                && development.contains(package.name.as_str());
        }
        Ok(packages)
    }

    fn resolve_dependency(&mut self, name: &str, constraint: &str) -> Result<(), ResolveError> {
        let name = name.to_ascii_lowercase();
        let previous = match self.state.state(&name) {
            PackageState::Unvisited => None,
            PackageState::Resolving => {
                tracing::trace!("{name} is already being resolved");
                return Ok(());
            }
            PackageState::Resolved(version) | PackageState::Superseded(version) => {
                if !violates(&version, constraint) {
                    return Ok(());
                }
                Some(version)
            }
        };

        if let Some(ref previous) = previous {
            if self.state.record_repair(&name) > MAX_REPAIRS {
                return Err(ResolveError::ConflictLoop {
                    name,
                    constraint: constraint.to_string(),
                });
            }
            let message = format!(
                "Package {name} v{previous} does not satisfy '{constraint}'. Re-resolving with new constraint..."
            );
            tracing::warn!("{message}");
            progress::status_warn("CONFLICT FIX", &message);
            self.conflicts.add(PackageConflict {
                package: name.clone(),
                previous: previous.clone(),
                constraint: constraint.to_string(),
                resolved: None,
            });
            self.state.retract(&name);
        }

        self.state.set(&name, PackageState::Resolving);
        tracing::debug!("resolving {name} {constraint}");

        let info = self
            .registry
            .get_package(&name)
            .map_err(|source| ResolveError::Registry {
                name: name.clone(),
                source,
            })?;
        let version = find_matching_version(info.version_strings(), constraint).ok_or_else(|| {
            ResolveError::NoMatchingVersion {
                name: name.clone(),
                constraint: normalize_constraint(constraint),
            }
        })?;
        let record = self
            .registry
            .get_version(&name, &version)
            .map_err(|source| ResolveError::Registry {
                name: name.clone(),
                source,
            })?;

        let selected = match previous {
            Some(_) => {
                self.conflicts.settle(&name, &version);
                PackageState::Superseded(version.clone())
            }
            None => PackageState::Resolved(version.clone()),
        };
        self.state.select(&name, selected, record.require.clone());

        for (dep, dep_constraint) in &record.require {
            if is_platform_package(dep) {
                continue;
            }
            self.resolve_dependency(dep, dep_constraint)?;
        }

        let mut package = ResolvedPackage::from_record(&record);
        package.name = name.clone();
        if !package.is_installable() {
            tracing::debug!("{name} {version} has no dist or source; not installing");
            return Ok(());
        }
        // A cycle back into this package may have superseded our choice
        // while its dependencies were being walked.
        if self.state.is_current(&name, &version) {
            self.state.emit(package);
        }
        Ok(())
    }
}

/// True when a previously chosen `version` provably fails `constraint`.
/// Unparseable constraints or versions keep the existing choice.
fn violates(version: &str, constraint: &str) -> bool {
    let Ok(parsed) = Constraint::parse(constraint) else {
        return false;
    };
    let Some(v) = pakt_registry::version::coerce(&normalize_version(version)) else {
        return false;
    };
    !parsed.matches(&v)
}

/// Names reachable from `roots` through the authoritative requirements of
/// every resolved package.
fn closure<'a>(roots: impl Iterator<Item = &'a String>, state: &ResolutionState) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<String> = roots
        .filter(|n| !is_platform_package(n))
        .map(|n| n.to_ascii_lowercase())
        .collect();
    while let Some(name) = queue.pop_front() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(requires) = state.requires_of(&name) {
            queue.extend(
                requires
                    .keys()
                    .filter(|n| !is_platform_package(n))
                    .map(|n| n.to_ascii_lowercase()),
            );
        }
    }
    seen
}

/// Replay a fresh lockfile: production packages, then development
/// packages, exactly as recorded.
pub fn resolve_from_lock(lock: &ComposerLock) -> Vec<ResolvedPackage> {
    lock.packages
        .iter()
        .map(|p| ResolvedPackage::from_locked(p, false))
        .chain(
            lock.packages_dev
                .iter()
                .map(|p| ResolvedPackage::from_locked(p, true)),
        )
        .collect()
}
