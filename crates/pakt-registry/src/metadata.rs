//! Packagist p2 metadata: `GET /p2/<vendor>/<package>.json`.
//!
//! The p2 endpoint serves "minified" documents: every version entry only
//! lists the keys that changed compared to the previous entry, and the
//! string `"__unset"` removes a key. [`parse_p2`] expands those before
//! building [`VersionRecord`]s.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use pakt_core::json::{is_absent, string_map, UNSET};
use pakt_core::lockfile::{DistInfo, LockedPackage, SourceInfo};

use crate::error::RegistryError;
use crate::version;

/// Keys lifted into typed fields; everything else stays in
/// [`VersionRecord::metadata`].
const TYPED_KEYS: [&str; 10] = [
    "name",
    "version",
    "version_normalized",
    "description",
    "type",
    "require",
    "require-dev",
    "autoload",
    "dist",
    "source",
];

/// All versions of one package as published by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInfo {
    pub name: String,
    pub description: Option<String>,
    pub versions: BTreeMap<String, VersionRecord>,
    pub latest_stable: Option<String>,
}

/// One concrete package version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    pub name: String,
    pub version: String,
    pub version_normalized: Option<String>,
    pub description: Option<String>,
    pub package_type: Option<String>,
    pub require: BTreeMap<String, String>,
    pub require_dev: BTreeMap<String, String>,
    /// Passed through untouched to the lockfile and autoload generator.
    pub autoload: Option<Value>,
    pub dist: Option<DistInfo>,
    pub source: Option<SourceInfo>,
    /// License, authors, time and any other published keys.
    pub metadata: Map<String, Value>,
}

impl PackageInfo {
    pub fn version_strings(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }
}

impl VersionRecord {
    /// Build a record from one expanded version object.
    pub fn from_json(name: &str, obj: &Map<String, Value>) -> Option<Self> {
        let version = obj.get("version")?.as_str()?.to_string();
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let metadata = obj
            .iter()
            .filter(|(k, v)| !TYPED_KEYS.contains(&k.as_str()) && !is_absent(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(Self {
            name: name.to_string(),
            version,
            version_normalized: text("version_normalized"),
            description: text("description"),
            package_type: text("type"),
            require: obj.get("require").map(string_map).unwrap_or_default(),
            require_dev: obj.get("require-dev").map(string_map).unwrap_or_default(),
            autoload: obj.get("autoload").filter(|v| !is_absent(v)).cloned(),
            dist: location(obj.get("dist")),
            source: location(obj.get("source")),
            metadata,
        })
    }

    /// Dist URL, else source URL, else `None` for metapackages.
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

    /// Lockfile entry for this version.
    pub fn to_locked(&self) -> LockedPackage {
        LockedPackage {
            name: self.name.clone(),
            version: self.version.clone(),
            source: self.source.clone(),
            dist: self.dist.clone(),
            require: self.require.clone(),
            package_type: self.package_type.clone(),
            autoload: self.autoload.clone(),
            description: self.description.clone(),
            other: self.metadata.clone(),
        }
    }
}

fn location<T: serde::de::DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    let value = value?;
    if is_absent(value) {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

/// Parse a p2 response body for package `name`.
pub fn parse_p2(name: &str, body: &str) -> Result<PackageInfo, RegistryError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| RegistryError::Parse {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    let entries = doc
        .get("packages")
        .and_then(|p| p.get(name))
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| RegistryError::PackageNotFound {
            name: name.to_string(),
        })?;

    let minified = doc.get("minified").and_then(Value::as_str).is_some();
    let expanded = if minified {
        expand_minified(entries)
    } else {
        entries
            .iter()
            .filter_map(|e| e.as_object().cloned())
            .collect()
    };

    let mut versions = BTreeMap::new();
    let mut description = None;
    for obj in &expanded {
        let Some(record) = VersionRecord::from_json(name, obj) else {
            tracing::debug!("skipping version entry without a version string in {name}");
            continue;
        };
        if description.is_none() {
            description = record.description.clone();
        }
        versions.insert(record.version.clone(), record);
    }

    if versions.is_empty() {
        return Err(RegistryError::PackageNotFound {
            name: name.to_string(),
        });
    }

    let latest_stable = version::latest_stable(versions.keys().map(String::as_str));
    Ok(PackageInfo {
        name: name.to_string(),
        description,
        versions,
        latest_stable,
    })
}

/// Undo Composer's metadata minification.
pub fn expand_minified(entries: &[Value]) -> Vec<Map<String, Value>> {
    let mut current = Map::new();
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            continue;
        };
        for (key, value) in obj {
            if value.as_str() == Some(UNSET) {
                current.remove(key);
            } else {
                current.insert(key.clone(), value.clone());
            }
        }
        out.push(current.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIFIED: &str = r#"{
        "minified": "composer/2.0",
        "packages": {
            "acme/widget": [
                {
                    "name": "acme/widget",
                    "version": "2.0.0",
                    "version_normalized": "2.0.0.0",
                    "description": "Widgets",
                    "type": "library",
                    "license": ["MIT"],
                    "require": {"php": ">=8.1", "psr/log": "^3.0"},
                    "autoload": {"psr-4": {"Acme\\Widget\\": "src/"}},
                    "dist": {"type": "zip", "url": "https://example.com/widget-2.0.0.zip", "reference": "bbb", "shasum": ""},
                    "source": {"type": "git", "url": "https://github.com/acme/widget.git", "reference": "bbb"}
                },
                {
                    "version": "1.5.0",
                    "version_normalized": "1.5.0.0",
                    "require": {"php": ">=7.4"},
                    "dist": {"type": "zip", "url": "https://example.com/widget-1.5.0.zip", "reference": "aaa", "shasum": ""}
                },
                {
                    "version": "1.0.0",
                    "version_normalized": "1.0.0.0",
                    "require": "__unset",
                    "dist": "__unset"
                }
            ]
        }
    }"#;

    #[test]
    fn minified_versions_inherit_previous_fields() {
        let info = parse_p2("acme/widget", MINIFIED).unwrap();
        assert_eq!(info.versions.len(), 3);
        assert_eq!(info.description.as_deref(), Some("Widgets"));
        assert_eq!(info.latest_stable.as_deref(), Some("2.0.0"));

        let v15 = &info.versions["1.5.0"];
        assert_eq!(v15.require.len(), 1);
        assert_eq!(v15.require["php"], ">=7.4");
        assert_eq!(v15.package_type.as_deref(), Some("library"));
        assert!(v15.autoload.is_some());
        assert_eq!(
            v15.download_url(),
            Some("https://example.com/widget-1.5.0.zip")
        );
        assert!(v15.metadata.contains_key("license"));
    }

    #[test]
    fn unset_removes_inherited_keys() {
        let info = parse_p2("acme/widget", MINIFIED).unwrap();
        let v1 = &info.versions["1.0.0"];
        assert!(v1.require.is_empty());
        assert!(v1.dist.is_none());
        assert_eq!(v1.download_url(), Some("https://github.com/acme/widget.git"));
    }

    #[test]
    fn non_minified_entries_stand_alone() {
        let body = r#"{"packages": {"acme/meta": [
            {"version": "1.0.0", "require": [], "dist": null, "source": null, "type": "metapackage"}
        ]}}"#;
        let info = parse_p2("acme/meta", body).unwrap();
        let v = &info.versions["1.0.0"];
        assert!(v.require.is_empty());
        assert_eq!(v.download_url(), None);
    }

    #[test]
    fn missing_package_key_is_not_found() {
        let err = parse_p2("acme/none", r#"{"packages": {}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::PackageNotFound { .. }));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_p2("acme/none", "<html>").unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }

    #[test]
    fn to_locked_carries_metadata() {
        let info = parse_p2("acme/widget", MINIFIED).unwrap();
        let locked = info.versions["2.0.0"].to_locked();
        assert_eq!(locked.name, "acme/widget");
        assert_eq!(locked.require["psr/log"], "^3.0");
        assert!(locked.other.contains_key("license"));
        assert_eq!(
            locked.dist.as_ref().map(|d| d.reference.as_deref()),
            Some(Some("bbb"))
        );
    }
}
