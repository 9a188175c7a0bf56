//! Operation: display the dependency tree.

use std::path::Path;

use pakt_core::config::GlobalConfig;
use pakt_core::package::Project;
use pakt_resolver::graph::DependencyGraph;
use pakt_resolver::{resolve_from_lock, ResolvedPackage, Resolver};
use pakt_util::errors::PaktError;
use pakt_util::progress::spinner;

use crate::ops_install::resolve_manifest;

/// Options for `pakt tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show who requires this package instead of the whole tree.
    pub package: Option<String>,
    /// Show inverted tree (dependents instead of dependencies).
    pub inverted: bool,
    /// Show version conflicts repaired during resolution.
    pub conflicts: bool,
}

/// Display the dependency tree for the project.
pub fn tree(project_root: &Path, opts: &TreeOptions) -> miette::Result<()> {
    let (project, config) = crate::load_project(project_root)?;

    if opts.conflicts {
        print!("{}", conflicts(&project, &config)?);
        return Ok(());
    }

    let packages = packages(&project, &config)?;
    print!("{}", render(&project, &packages, opts)?);
    Ok(())
}

/// Render the tree for already-resolved packages.
pub fn render(
    project: &Project,
    packages: &[ResolvedPackage],
    opts: &TreeOptions,
) -> miette::Result<String> {
    let graph = DependencyGraph::from_packages(&project.manifest, packages);

    if let Some(ref name) = opts.package {
        let out = graph.print_inverted_tree(name);
        if out.is_empty() {
            return Err(PaktError::Generic {
                message: format!("Package '{name}' is not in the dependency graph"),
            }
            .into());
        }
        return Ok(out);
    }
    if graph.is_empty() {
        return Ok("No dependencies.\n".to_string());
    }
    if opts.inverted {
        return Ok(graph.print_full_inverted_tree());
    }
    Ok(graph.print_tree(opts.depth))
}

/// Locked packages when the lock is fresh, else a fresh resolution.
fn packages(project: &Project, config: &GlobalConfig) -> miette::Result<Vec<ResolvedPackage>> {
    match crate::read_lock(project).filter(|l| l.is_fresh(&project.manifest)) {
        Some(lock) => Ok(resolve_from_lock(&lock)),
        None => {
            tracing::debug!("no fresh lock, resolving for the tree");
            resolve_manifest(project, config)
        }
    }
}

fn conflicts(project: &Project, config: &GlobalConfig) -> miette::Result<String> {
    let client = crate::registry_client(config)?;
    let mut resolver = Resolver::new(&client);
    let sp = spinner("Resolving dependencies...");
    let result = resolver.resolve(&project.manifest);
    sp.finish_and_clear();
    result?;
    let mut report = resolver.conflicts().to_string();
    if !report.ends_with('\n') {
        report.push('\n');
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pakt_core::lockfile::ComposerLock;
    use std::collections::BTreeMap;
    use std::fs;

    fn package(name: &str, version: &str, require: &[(&str, &str)], dev: bool) -> ResolvedPackage {
        ResolvedPackage {
            name: name.to_string(),
            version: version.to_string(),
            require: require
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect::<BTreeMap<_, _>>(),
            dev,
            ..ResolvedPackage::default()
        }
    }

    fn sample() -> (tempfile::TempDir, Project, Vec<ResolvedPackage>) {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("composer.json"),
            r#"{
                "name": "acme/app",
                "require": {"php": "^8.1", "monolog/monolog": "^3.0"},
                "require-dev": {"phpunit/phpunit": "^10.0"}
            }"#,
        )
        .unwrap();
        let project = Project::load(tmp.path()).unwrap();
        let packages = vec![
            package(
                "monolog/monolog",
                "3.5.0",
                &[("php", ">=8.1"), ("psr/log", "^2.0 || ^3.0")],
                false,
            ),
            package("psr/log", "3.0.0", &[], false),
            package("phpunit/phpunit", "10.5.0", &[], true),
        ];
        (tmp, project, packages)
    }

    #[test]
    fn full_tree_skips_platform_packages() {
        let (_tmp, project, packages) = sample();
        let out = render(&project, &packages, &TreeOptions::default()).unwrap();
        assert!(out.starts_with("acme/app\n"));
        assert!(out.contains("monolog/monolog 3.5.0 (^3.0)"));
        assert!(out.contains("psr/log 3.0.0 (^2.0 || ^3.0)"));
        assert!(out.contains("[require-dev]"));
        assert!(!out.contains("php "));
    }

    #[test]
    fn depth_limit_hides_transitive() {
        let (_tmp, project, packages) = sample();
        let opts = TreeOptions {
            depth: Some(1),
            ..TreeOptions::default()
        };
        let out = render(&project, &packages, &opts).unwrap();
        assert!(out.contains("monolog/monolog"));
        assert!(!out.contains("psr/log"));
    }

    #[test]
    fn package_shows_dependents() {
        let (_tmp, project, packages) = sample();
        let opts = TreeOptions {
            package: Some("psr/log".to_string()),
            ..TreeOptions::default()
        };
        let out = render(&project, &packages, &opts).unwrap();
        assert!(out.starts_with("psr/log 3.0.0\n"));
        assert!(out.contains("monolog/monolog 3.5.0 (requires ^2.0 || ^3.0)"));

        let missing = TreeOptions {
            package: Some("acme/none".to_string()),
            ..TreeOptions::default()
        };
        assert!(render(&project, &packages, &missing).is_err());
    }

    #[test]
    fn reads_fresh_lock_without_network() {
        let (tmp, project, packages) = sample();
        let lock = ComposerLock::new(
            &project.manifest,
            packages.iter().filter(|p| !p.dev).map(ResolvedPackage::to_locked).collect(),
            packages.iter().filter(|p| p.dev).map(ResolvedPackage::to_locked).collect(),
        )
        .unwrap();
        lock.write_to(&tmp.path().join("composer.lock")).unwrap();

        tree(tmp.path(), &TreeOptions::default()).unwrap();
    }
}
