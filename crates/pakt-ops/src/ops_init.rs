//! Operation: create a composer.json in an existing directory.

use std::path::Path;

use pakt_core::manifest::{is_valid_package_name, ComposerJson};
use pakt_core::MANIFEST_FILE;
use pakt_util::errors::PaktError;
use pakt_util::progress::status;
use serde_json::json;

/// Options for `pakt init`.
#[derive(Debug, Default)]
pub struct InitOptions {
    /// Package name, `vendor/project` when absent.
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Write a starter manifest and an empty `src/` directory.
pub fn init(project_root: &Path, opts: &InitOptions) -> miette::Result<()> {
    let manifest_path = project_root.join(MANIFEST_FILE);
    if manifest_path.exists() {
        return Err(PaktError::Generic {
            message: format!("{MANIFEST_FILE} already exists in this directory"),
        }
        .into());
    }

    let manifest = template(opts)?;
    manifest.write_to(&manifest_path)?;
    std::fs::create_dir_all(project_root.join("src")).map_err(PaktError::Io)?;

    status(
        "Created",
        &format!(
            "{MANIFEST_FILE} for {}",
            manifest.name.as_deref().unwrap_or_default()
        ),
    );
    Ok(())
}

pub fn template(opts: &InitOptions) -> miette::Result<ComposerJson> {
    let name = opts.name.as_deref().unwrap_or("vendor/project").to_ascii_lowercase();
    if !is_valid_package_name(&name) {
        return Err(PaktError::Generic {
            message: format!("Invalid package name '{name}'. Expected vendor/package"),
        }
        .into());
    }
    let description = opts.description.as_deref().unwrap_or("A new PHP project");

    let value = json!({
        "name": name,
        "description": description,
        "type": "project",
        "license": "MIT",
        "require": {
            "php": "^8.1"
        },
        "autoload": {
            "psr-4": {
                "App\\": "src/"
            }
        }
    });
    serde_json::from_value(value).map_err(|e| {
        PaktError::Manifest {
            message: e.to_string(),
        }
        .into()
    })
}
