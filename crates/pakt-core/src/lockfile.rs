use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use pakt_util::errors::PaktError;

use crate::manifest::{to_json_pretty, ComposerJson};

/// Banner written at the top of every lockfile.
pub const LOCK_README: [&str; 3] = [
    "This file locks the dependencies of your project to a known state",
    "Read more about it at https://getcomposer.org/doc/01-basic-usage.md#installing-dependencies",
    "This file is @generated automatically",
];

/// Manifest keys whose content changes invalidate the lockfile.
const HASHED_KEYS: [&str; 8] = [
    "autoload",
    "autoload-dev",
    "config",
    "minimum-stability",
    "name",
    "prefer-stable",
    "require",
    "require-dev",
];

/// The `composer.lock` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposerLock {
    #[serde(rename = "_readme", default)]
    pub readme: Vec<String>,

    #[serde(rename = "content-hash", default)]
    pub content_hash: String,

    #[serde(default)]
    pub packages: Vec<LockedPackage>,

    #[serde(rename = "packages-dev", default)]
    pub packages_dev: Vec<LockedPackage>,

    #[serde(default)]
    pub aliases: Vec<Value>,

    #[serde(rename = "minimum-stability", default = "default_stability")]
    pub minimum_stability: String,

    #[serde(rename = "prefer-stable", default)]
    pub prefer_stable: bool,

    #[serde(default, deserialize_with = "crate::json::flexible_map")]
    pub platform: BTreeMap<String, String>,

    #[serde(
        rename = "platform-dev",
        default,
        deserialize_with = "crate::json::flexible_map"
    )]
    pub platform_dev: BTreeMap<String, String>,
}

fn default_stability() -> String {
    "stable".to_string()
}

/// A single locked package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,

    #[serde(
        default,
        deserialize_with = "crate::json::optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<SourceInfo>,

    #[serde(
        default,
        deserialize_with = "crate::json::optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub dist: Option<DistInfo>,

    #[serde(
        default,
        deserialize_with = "crate::json::flexible_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub require: BTreeMap<String, String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Remaining registry metadata (license, authors, time, ...) kept as-is.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Where a package's VCS checkout lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Where a package's distribution archive lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistInfo {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub shasum: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl LockedPackage {
    /// Archive URL to install from: the dist URL, else the source URL.
    pub fn download_url(&self) -> Option<&str> {
        self.dist
            .as_ref()
            .map(|d| d.url.as_str())
            .filter(|u| !u.is_empty())
            .or_else(|| {
                self.source
                    .as_ref()
                    .map(|s| s.url.as_str())
                    .filter(|u| !u.is_empty())
            })
    }
}

impl ComposerLock {
    /// A fresh lockfile for `manifest` with the given package sections.
    pub fn new(
        manifest: &ComposerJson,
        packages: Vec<LockedPackage>,
        packages_dev: Vec<LockedPackage>,
    ) -> miette::Result<Self> {
        let platform = manifest
            .require
            .iter()
            .filter(|(name, _)| is_platform_requirement(name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let platform_dev = manifest
            .require_dev
            .iter()
            .filter(|(name, _)| is_platform_requirement(name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self {
            readme: LOCK_README.iter().map(|s| s.to_string()).collect(),
            content_hash: content_hash(manifest)?,
            packages,
            packages_dev,
            aliases: Vec::new(),
            minimum_stability: manifest
                .minimum_stability
                .clone()
                .unwrap_or_else(default_stability),
            prefer_stable: manifest.prefer_stable.unwrap_or(false),
            platform,
            platform_dev,
        })
    }

    /// Load and parse a `composer.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PaktError::Lockfile {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> miette::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            PaktError::Lockfile {
                message: format!("Failed to parse composer.lock: {e}"),
            }
            .into()
        })
    }

    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let content = to_json_pretty(self).map_err(|e| PaktError::Lockfile {
            message: format!("Failed to serialize composer.lock: {e}"),
        })?;
        std::fs::write(path, content).map_err(|e| {
            PaktError::Lockfile {
                message: format!("Failed to write {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// True when the lock was generated from a manifest with the same
    /// dependency-relevant content.
    pub fn is_fresh(&self, manifest: &ComposerJson) -> bool {
        match content_hash(manifest) {
            Ok(hash) => hash == self.content_hash,
            Err(_) => false,
        }
    }

    /// Production packages followed by development packages.
    pub fn all_packages(&self) -> impl Iterator<Item = &LockedPackage> {
        self.packages.iter().chain(self.packages_dev.iter())
    }

    pub fn find(&self, name: &str) -> Option<&LockedPackage> {
        self.all_packages().find(|p| p.name == name)
    }

    pub fn is_dev_package(&self, name: &str) -> bool {
        self.packages_dev.iter().any(|p| p.name == name)
    }
}

/// MD5 of the canonical JSON of the manifest's dependency-relevant keys.
///
/// Keys are emitted in sorted order so the hash does not depend on how the
/// manifest file happens to be laid out.
pub fn content_hash(manifest: &ComposerJson) -> miette::Result<String> {
    let value = serde_json::to_value(manifest).map_err(|e| PaktError::Manifest {
        message: format!("Failed to serialize composer.json: {e}"),
    })?;
    let mut relevant = Map::new();
    if let Value::Object(obj) = value {
        for key in HASHED_KEYS {
            if let Some(v) = obj.get(key) {
                relevant.insert(key.to_string(), v.clone());
            }
        }
    }
    let canonical = serde_json::to_string(&Value::Object(relevant)).map_err(|e| {
        PaktError::Manifest {
            message: format!("Failed to serialize composer.json: {e}"),
        }
    })?;
    Ok(pakt_util::hash::md5_bytes(canonical.as_bytes()))
}

/// `php`, `ext-*` and similar requirements recorded in the lock's
/// `platform` sections. Mirrors the resolver's classifier for root names.
fn is_platform_requirement(name: &str) -> bool {
    !name.contains('/')
        && (name == "php"
            || name.starts_with("php-")
            || name.starts_with("ext-")
            || name.starts_with("lib-")
            || name == "composer-plugin-api"
            || name == "composer-runtime-api")
}
