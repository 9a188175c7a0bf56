//! Operation: add requirements to composer.json and install them.

use std::path::Path;

use pakt_core::manifest::{is_valid_package_name, parse_package_arg};
use pakt_core::scripts::POST_UPDATE_CMD;
use pakt_registry::Registry;
use pakt_resolver::constraint::{find_latest_stable, normalize_version, Constraint};
use pakt_resolver::platform::is_platform_package;
use pakt_util::errors::PaktError;
use pakt_util::progress::{status, status_warn};

use crate::ops_install::{apply, resolve_manifest, InstallOptions};

/// Options for `pakt require`.
#[derive(Debug, Default, Clone)]
pub struct RequireOptions {
    /// `vendor/package[:constraint]` arguments.
    pub packages: Vec<String>,
    /// Add to `require-dev` instead of `require`.
    pub dev: bool,
    /// Only edit composer.json.
    pub no_update: bool,
    pub install: InstallOptions,
}

/// Add the requested packages, then resolve and install. If resolution
/// fails the manifest is restored.
pub fn require(project_root: &Path, opts: &RequireOptions) -> miette::Result<()> {
    let (mut project, config) = crate::load_project(project_root)?;
    if opts.packages.is_empty() {
        return Err(PaktError::Generic {
            message: "No packages given. Usage: pakt require vendor/package[:constraint]".into(),
        }
        .into());
    }

    let original = project.manifest.clone();
    let client = crate::registry_client(&config)?;
    for arg in &opts.packages {
        let (name, constraint) = parse_package_arg(arg);
        let platform = is_platform_package(&name);
        if !platform && !is_valid_package_name(&name) {
            return Err(PaktError::Generic {
                message: format!("Invalid package name '{name}'. Expected vendor/package"),
            }
            .into());
        }

        let constraint = match constraint {
            Some(c) => {
                Constraint::parse(&c).map_err(|e| PaktError::Generic {
                    message: e.to_string(),
                })?;
                c
            }
            None if platform => {
                return Err(PaktError::Generic {
                    message: format!(
                        "Platform requirement '{name}' needs an explicit constraint, e.g. {name}:^8.1"
                    ),
                }
                .into());
            }
            None => default_constraint(&client, &name)?,
        };

        project.manifest.add_requirement(&name, &constraint, opts.dev);
        let section = if opts.dev { " (dev)" } else { "" };
        status("Adding", &format!("{name} {constraint}{section}"));
    }
    project.save_manifest()?;

    if opts.no_update {
        return Ok(());
    }

    let packages = match resolve_manifest(&project, &config) {
        Ok(packages) => packages,
        Err(e) => {
            status_warn("Reverting", "composer.json to its original content");
            project.manifest = original;
            project.save_manifest()?;
            return Err(e);
        }
    };
    apply(&project, &config, packages, true, POST_UPDATE_CMD, &opts.install)?;
    Ok(())
}

/// `^<latest stable>` for a package added without a constraint.
pub fn default_constraint<R: Registry>(registry: &R, name: &str) -> miette::Result<String> {
    let info = registry.get_package(name)?;
    let latest = info
        .latest_stable
        .clone()
        .or_else(|| find_latest_stable(info.versions.keys().map(String::as_str)))
        .ok_or_else(|| PaktError::Generic {
            message: format!("Package {name} has no published versions"),
        })?;
    Ok(format!("^{}", normalize_version(&latest)))
}
