//! Conflict bookkeeping for a resolution run, and the advisory conflict
//! checker used by `why-not`.

use std::fmt;

use pakt_core::manifest::ComposerJson;
use pakt_registry::Registry;

use crate::platform::is_platform_package;
use crate::resolver::{ResolveError, Resolver};

/// Every conflict repaired during one resolution run.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<PackageConflict>,
}

/// A previously chosen version that failed a later constraint and was
/// replaced by re-resolving against that constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConflict {
    pub package: String,
    pub previous: String,
    pub constraint: String,
    pub resolved: Option<String>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: PackageConflict) {
        self.conflicts.push(conflict);
    }

    /// Record the version the most recent conflict on `package` settled on.
    pub fn settle(&mut self, package: &str, version: &str) {
        if let Some(c) = self
            .conflicts
            .iter_mut()
            .rev()
            .find(|c| c.package == package && c.resolved.is_none())
        {
            c.resolved = Some(version.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PackageConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{} does not satisfy '{}'",
            self.package, self.previous, self.constraint
        )?;
        if let Some(ref resolved) = self.resolved {
            write!(f, ", re-resolved to v{resolved}")?;
        }
        Ok(())
    }
}

impl<R: Registry> Resolver<R> {
    /// Advisory notes about installing `name` at `version` into the project:
    /// its PHP and extension requirements, and manifest dependencies it also
    /// requires with an incompatible constraint.
    pub fn check_conflicts(
        &self,
        manifest: &ComposerJson,
        name: &str,
        version: &str,
    ) -> Result<Vec<String>, ResolveError> {
        let record = self
            .registry()
            .get_version(name, version)
            .map_err(|source| ResolveError::Registry {
                name: name.to_string(),
                source,
            })?;

        let mut notes = Vec::new();
        if let Some(php) = record.require.get("php") {
            notes.push(format!("Requires PHP {php} (check your version)"));
        }
        for req in record.require.keys().filter(|r| r.starts_with("ext-")) {
            notes.push(format!("Requires PHP extension: {req}"));
        }

        for (existing, existing_constraint) in &manifest.require {
            if is_platform_package(existing) {
                continue;
            }
            let Some(required) = record.require.get(existing) else {
                continue;
            };
            if !versions_compatible(existing_constraint, required) {
                notes.push(format!(
                    "{name} requires {existing} {required} (you have {existing_constraint})"
                ));
            }
        }
        Ok(notes)
    }
}

/// Whether two constraints on the same package can both be met.
///
/// Always true: constraint intersection is not implemented, so the checker
/// never reports manifest overlaps.
pub fn versions_compatible(_existing: &str, _required: &str) -> bool {
    true
}
