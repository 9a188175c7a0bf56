//! Per-resolution bookkeeping: one state per package name plus the order in
//! which installable packages were emitted.

use std::collections::{BTreeMap, HashMap};

use crate::resolver::ResolvedPackage;

/// Lifecycle of a package name within one resolution run.
///
/// `Unvisited → Resolving → Resolved(v)`, and on a conflict
/// `Resolved(v) → Resolving → Superseded(v')`. Both `Resolved` and
/// `Superseded` carry the version currently authoritative for the name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageState {
    #[default]
    Unvisited,
    /// Selected version not yet known (fetching metadata).
    Resolving,
    Resolved(String),
    /// Re-resolved after an earlier choice failed a later constraint.
    Superseded(String),
}

impl PackageState {
    /// The authoritative version, once one has been selected.
    pub fn version(&self) -> Option<&str> {
        match self {
            PackageState::Resolved(v) | PackageState::Superseded(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_visited(&self) -> bool {
        !matches!(self, PackageState::Unvisited)
    }
}

/// Mutable state of one resolution run. Created fresh for every run.
#[derive(Debug, Default)]
pub struct ResolutionState {
    states: HashMap<String, PackageState>,
    /// Requirements of the authoritative version of every resolved name,
    /// including metapackages that are never emitted.
    requires: BTreeMap<String, BTreeMap<String, String>>,
    /// Conflict repairs per name.
    repairs: HashMap<String, u32>,
    order: Vec<String>,
    emitted: HashMap<String, ResolvedPackage>,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, name: &str) -> PackageState {
        self.states.get(name).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, name: &str, state: PackageState) {
        self.states.insert(name.to_string(), state);
    }

    /// Record the chosen version and its requirements.
    pub fn select(&mut self, name: &str, state: PackageState, requires: BTreeMap<String, String>) {
        self.requires.insert(name.to_string(), requires);
        self.set(name, state);
    }

    /// Count one more conflict repair of `name` and return the total.
    pub fn record_repair(&mut self, name: &str) -> u32 {
        let count = self.repairs.entry(name.to_string()).or_default();
        *count += 1;
        *count
    }

    /// True when `version` is still the authoritative choice for `name`.
    pub fn is_current(&self, name: &str, version: &str) -> bool {
        self.states.get(name).and_then(PackageState::version) == Some(version)
    }

    /// Append an installable package to the output, once per name.
    pub fn emit(&mut self, package: ResolvedPackage) -> bool {
        if self.emitted.contains_key(&package.name) {
            return false;
        }
        self.order.push(package.name.clone());
        self.emitted.insert(package.name.clone(), package);
        true
    }

    /// Drop an earlier output entry for `name`; its replacement is emitted
    /// once the re-resolution finishes.
    pub fn retract(&mut self, name: &str) {
        if self.emitted.remove(name).is_some() {
            self.order.retain(|n| n != name);
        }
    }

    pub fn requires_of(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.requires.get(name)
    }

    /// Emitted packages in emission order.
    pub fn into_packages(mut self) -> Vec<ResolvedPackage> {
        self.order
            .iter()
            .filter_map(|name| self.emitted.remove(name))
            .collect()
    }

    pub fn visited_count(&self) -> usize {
        self.states.values().filter(|s| s.is_visited()).count()
    }
}
