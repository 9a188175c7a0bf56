//! "Why is this package here?" explanations walked from registry metadata.

use std::collections::HashSet;

use pakt_core::manifest::ComposerJson;
use pakt_registry::Registry;

use crate::constraint::find_latest_stable;
use crate::platform::is_platform_package;
use crate::resolver::{ResolveError, Resolver};

struct Hop {
    name: String,
    /// Version for intermediate packages, constraint for the target.
    label: String,
}

impl<R: Registry> Resolver<R> {
    /// Render the chain of requirements that pulls `target` into the
    /// project.
    ///
    /// Top-level requirements are reported directly. Otherwise the
    /// requirement graph is searched depth-first from every top-level
    /// requirement, following the latest stable version of each package.
    /// Packages whose metadata cannot be fetched are skipped.
    pub fn build_dependency_tree(
        &self,
        manifest: &ComposerJson,
        target: &str,
    ) -> Result<String, ResolveError> {
        for section in [&manifest.require, &manifest.require_dev] {
            if let Some((name, constraint)) = section
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                return Ok(format!("Your project\n  └─ {name} ({constraint})\n"));
            }
        }

        let mut visited = HashSet::new();
        for name in manifest.require.keys().chain(manifest.require_dev.keys()) {
            if is_platform_package(name) {
                continue;
            }
            let mut path = Vec::new();
            if self.search(name, target, &mut path, &mut visited) {
                return Ok(render(&path));
            }
        }

        Err(ResolveError::NotInTree {
            target: target.to_string(),
        })
    }

    fn search(
        &self,
        name: &str,
        target: &str,
        path: &mut Vec<Hop>,
        visited: &mut HashSet<String>,
    ) -> bool {
        let name = name.to_ascii_lowercase();
        if !visited.insert(name.clone()) {
            return false;
        }
        let info = match self.registry().get_package(&name) {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!("skipping {name} while explaining {target}: {e}");
                return false;
            }
        };
        let Some(version) = find_latest_stable(info.version_strings()) else {
            return false;
        };
        let Some(record) = info.versions.get(&version) else {
            return false;
        };

        path.push(Hop {
            name: name.clone(),
            label: version,
        });
        if let Some((dep, constraint)) = record
            .require
            .iter()
            .find(|(dep, _)| dep.eq_ignore_ascii_case(target))
        {
            path.push(Hop {
                name: dep.clone(),
                label: constraint.clone(),
            });
            return true;
        }
        for dep in record.require.keys() {
            if is_platform_package(dep) {
                continue;
            }
            if self.search(dep, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }
}

fn render(path: &[Hop]) -> String {
    let mut out = String::from("Your project\n");
    for (depth, hop) in path.iter().enumerate() {
        let indent = format!("  {}", "    ".repeat(depth));
        out.push_str(&format!("{indent}└─ {} ({})\n", hop.name, hop.label));
    }
    out
}
