//! Operation: remove requirements from composer.json.

use std::path::Path;

use pakt_core::manifest::normalize_package_name;
use pakt_core::scripts::POST_UPDATE_CMD;
use pakt_util::errors::PaktError;
use pakt_util::progress::status;

use crate::ops_install::{apply, resolve_manifest, InstallOptions};

/// Options for `pakt remove`.
#[derive(Debug, Default, Clone)]
pub struct RemoveOptions {
    pub packages: Vec<String>,
    /// Only edit composer.json.
    pub no_update: bool,
    pub install: InstallOptions,
}

/// Drop the packages from both `require` and `require-dev`, then re-resolve
/// so the lock and vendor directory follow.
pub fn remove(project_root: &Path, opts: &RemoveOptions) -> miette::Result<()> {
    let (mut project, config) = crate::load_project(project_root)?;

    for name in &opts.packages {
        let name = normalize_package_name(name);
        if !project.manifest.remove_requirement(&name) {
            return Err(PaktError::Generic {
                message: format!("Package '{name}' is not required by composer.json"),
            }
            .into());
        }
        status("Removing", &name);
    }
    project.save_manifest()?;

    if opts.no_update {
        return Ok(());
    }
    let packages = resolve_manifest(&project, &config)?;
    apply(&project, &config, packages, true, POST_UPDATE_CMD, &opts.install)?;
    Ok(())
}
