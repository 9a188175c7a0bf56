//! Operations: `pakt why` and `pakt why-not`.

use std::fmt::Write as _;
use std::path::Path;

use pakt_core::manifest::{normalize_package_name, ComposerJson};
use pakt_registry::Registry;
use pakt_resolver::Resolver;
use pakt_util::progress::spinner;

/// Options for `pakt why`.
#[derive(Debug, Default)]
pub struct WhyOptions {
    pub package: String,
}

/// Options for `pakt why-not`.
#[derive(Debug, Default)]
pub struct WhyNotOptions {
    pub package: String,
    pub version: String,
}

/// Explain why a package is part of the project.
pub fn why(project_root: &Path, opts: &WhyOptions) -> miette::Result<()> {
    let (project, config) = crate::load_project(project_root)?;
    let client = crate::registry_client(&config)?;
    let name = normalize_package_name(&opts.package);

    let sp = spinner(&format!("Searching for {name}..."));
    let result = explain_why(&client, &project.manifest, &name);
    sp.finish_and_clear();
    print!("{}", result?);
    Ok(())
}

/// Report whether a specific version could be installed.
pub fn why_not(project_root: &Path, opts: &WhyNotOptions) -> miette::Result<()> {
    let (project, config) = crate::load_project(project_root)?;
    let client = crate::registry_client(&config)?;
    let name = normalize_package_name(&opts.package);

    let sp = spinner(&format!("Checking {name} {}...", opts.version));
    let result = explain_why_not(&client, &project.manifest, &name, &opts.version);
    sp.finish_and_clear();
    print!("{}", result?);
    Ok(())
}

pub fn explain_why<R: Registry>(
    registry: R,
    manifest: &ComposerJson,
    name: &str,
) -> miette::Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "Why is {name} installed?\n");

    if let Some(constraint) = manifest.constraint_for(name) {
        let section = if manifest.is_dev_requirement(name) {
            "require-dev"
        } else {
            "require"
        };
        let _ = writeln!(out, "Directly required in composer.json ({section})");
        let _ = writeln!(out, "Version: {constraint}");
        return Ok(out);
    }

    let resolver = Resolver::new(registry);
    let chain = resolver.build_dependency_tree(manifest, name)?;
    let _ = writeln!(out, "Dependency chain:");
    out.push_str(&chain);
    Ok(out)
}

pub fn explain_why_not<R: Registry>(
    registry: R,
    manifest: &ComposerJson,
    name: &str,
    version: &str,
) -> miette::Result<String> {
    let resolver = Resolver::new(registry);
    let notes = resolver.check_conflicts(manifest, name, version)?;

    let mut out = String::new();
    let _ = writeln!(out, "Why can't {name} {version} be installed?\n");
    if notes.is_empty() {
        let _ = writeln!(out, "No conflicts! You can install this version.");
        let _ = writeln!(out, "\n  pakt require {name}:{version}");
        return Ok(out);
    }

    let _ = writeln!(out, "Conflicts found:");
    for note in &notes {
        let _ = writeln!(out, "  • {note}");
    }
    let _ = writeln!(out, "\nTo install:");
    let _ = writeln!(out, "  1. Update conflicting packages");
    let _ = writeln!(out, "  2. Or use a different version");
    Ok(out)
}
