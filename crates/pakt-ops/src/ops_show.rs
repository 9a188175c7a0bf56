//! Operation: list installed packages, or show one package in detail.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use pakt_core::lockfile::{ComposerLock, LockedPackage};
use pakt_core::manifest::{normalize_package_name, ComposerJson};
use pakt_util::errors::PaktError;
use pakt_util::progress::status_warn;

/// Options for `pakt show`.
#[derive(Debug, Default)]
pub struct ShowOptions {
    /// Show details for a single package.
    pub package: Option<String>,
}

pub fn show(project_root: &Path, opts: &ShowOptions) -> miette::Result<()> {
    let (project, _) = crate::load_project(project_root)?;
    let lock = crate::read_lock(&project);

    let output = match (&opts.package, &lock) {
        (Some(name), Some(lock)) => {
            let name = normalize_package_name(name);
            let package = lock.find(&name).ok_or_else(|| PaktError::Generic {
                message: format!("Package '{name}' is not installed"),
            })?;
            render_package(package, lock.is_dev_package(&name))
        }
        (Some(_), None) => {
            return Err(PaktError::Generic {
                message: "No composer.lock found. Run `pakt install` first.".into(),
            }
            .into());
        }
        (None, Some(lock)) => render_locked(lock),
        (None, None) => {
            status_warn("Warning", "no composer.lock found, showing declared requirements");
            render_declared(&project.manifest)
        }
    };
    print!("{output}");
    Ok(())
}

/// Installed packages from the lock, production first.
pub fn render_locked(lock: &ComposerLock) -> String {
    let mut out = String::new();
    let width = lock
        .all_packages()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0);
    let vwidth = lock
        .all_packages()
        .map(|p| p.version.len())
        .max()
        .unwrap_or(0);

    let mut section = |title: &str, packages: &[LockedPackage]| {
        if packages.is_empty() {
            return;
        }
        let _ = writeln!(out, "{title}:");
        for p in packages {
            let desc = p.description.as_deref().unwrap_or("");
            let line = format!("  {:<width$}  {:<vwidth$}  {desc}", p.name, p.version);
            let _ = writeln!(out, "{}", line.trim_end());
        }
    };
    section("Production dependencies", &lock.packages);
    section("Development dependencies", &lock.packages_dev);

    if out.is_empty() {
        out.push_str("No packages installed.\n");
    }
    out
}

/// Requirements as declared in the manifest.
pub fn render_declared(manifest: &ComposerJson) -> String {
    let mut out = String::new();
    let mut section = |title: &str, deps: &BTreeMap<String, String>| {
        if deps.is_empty() {
            return;
        }
        let _ = writeln!(out, "{title}:");
        for (name, constraint) in deps {
            let _ = writeln!(out, "  {name}: {constraint}");
        }
    };
    section("Production dependencies", &manifest.require);
    section("Development dependencies", &manifest.require_dev);

    if out.is_empty() {
        out.push_str("No dependencies declared.\n");
    }
    out
}

pub fn render_package(package: &LockedPackage, dev: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "name     : {}", package.name);
    if let Some(ref desc) = package.description {
        let _ = writeln!(out, "descrip. : {desc}");
    }
    let _ = writeln!(out, "version  : {}", package.version);
    if let Some(ref kind) = package.package_type {
        let _ = writeln!(out, "type     : {kind}");
    }
    if let Some(license) = package.other.get("license") {
        let text = match license {
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            serde_json::Value::String(s) => s.clone(),
            _ => String::new(),
        };
        if !text.is_empty() {
            let _ = writeln!(out, "license  : {text}");
        }
    }
    if let Some(ref source) = package.source {
        let reference = source.reference.as_deref().unwrap_or("");
        let _ = writeln!(out, "source   : [{}] {} {reference}", source.kind, source.url);
    }
    if let Some(ref dist) = package.dist {
        let reference = dist.reference.as_deref().unwrap_or("");
        let _ = writeln!(out, "dist     : [{}] {} {reference}", dist.kind, dist.url);
    }
    if dev {
        let _ = writeln!(out, "dev      : yes");
    }
    if !package.require.is_empty() {
        let _ = writeln!(out, "\nrequires");
        for (name, constraint) in &package.require {
            let _ = writeln!(out, "{name} {constraint}");
        }
    }
    out
}
