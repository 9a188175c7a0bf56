use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use pakt_util::errors::PaktError;

use crate::scripts::Script;

/// The parsed representation of a `composer.json` file.
///
/// Keys pakt does not model are kept in `other` so that rewriting the
/// manifest does not lose them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,

    #[serde(
        default,
        deserialize_with = "crate::json::flexible_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub require: BTreeMap<String, String>,

    #[serde(
        default,
        rename = "require-dev",
        deserialize_with = "crate::json::flexible_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub require_dev: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "AutoloadConfig::is_empty")]
    pub autoload: AutoloadConfig,

    #[serde(
        default,
        rename = "autoload-dev",
        skip_serializing_if = "AutoloadConfig::is_empty"
    )]
    pub autoload_dev: AutoloadConfig,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, Script>,

    #[serde(default, skip_serializing_if = "ProjectConfig::is_empty")]
    pub config: ProjectConfig,

    #[serde(
        default,
        rename = "minimum-stability",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_stability: Option<String>,

    #[serde(default, rename = "prefer-stable", skip_serializing_if = "Option::is_none")]
    pub prefer_stable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// `license` is either a single SPDX identifier or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum License {
    Single(String),
    Multiple(Vec<String>),
}

impl License {
    pub fn is_empty(&self) -> bool {
        match self {
            License::Single(s) => s.trim().is_empty(),
            License::Multiple(v) => v.iter().all(|s| s.trim().is_empty()),
        }
    }
}

impl std::fmt::Display for License {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            License::Single(s) => write!(f, "{s}"),
            License::Multiple(v) => write!(f, "{}", v.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// One or more directories mapped to a namespace prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathList {
    One(String),
    Many(Vec<String>),
}

impl PathList {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            PathList::One(p) => vec![p.as_str()],
            PathList::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

/// The `autoload` / `autoload-dev` section, shared by root manifests and
/// package metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoloadConfig {
    #[serde(
        default,
        rename = "psr-4",
        deserialize_with = "flexible_path_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub psr4: BTreeMap<String, PathList>,

    #[serde(
        default,
        rename = "psr-0",
        deserialize_with = "flexible_path_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub psr0: BTreeMap<String, PathList>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classmap: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(
        default,
        rename = "exclude-from-classmap",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exclude_from_classmap: Vec<String>,
}

impl AutoloadConfig {
    pub fn is_empty(&self) -> bool {
        self.psr4.is_empty() && self.psr0.is_empty() && self.classmap.is_empty() && self.files.is_empty()
    }

    /// Interpret an opaque registry autoload blob. Anything unreadable is
    /// treated as an empty section.
    pub fn from_value(value: &Value) -> Self {
        if crate::json::is_absent(value) {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

fn flexible_path_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, PathList>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(BTreeMap::new()),
    }
}

/// The manifest's `config` section. Only `vendor-dir` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, rename = "vendor-dir", skip_serializing_if = "Option::is_none")]
    pub vendor_dir: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ProjectConfig {
    pub fn is_empty(&self) -> bool {
        self.vendor_dir.is_none() && self.other.is_empty()
    }
}

impl ComposerJson {
    /// Load and parse a `composer.json` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PaktError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_str(&content)
    }

    /// Parse a `composer.json` document from a string.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            PaktError::Manifest {
                message: format!("Failed to parse composer.json: {e}"),
            }
            .into()
        })
    }

    /// Serialize with Composer's four-space indentation.
    pub fn to_string_pretty(&self) -> miette::Result<String> {
        to_json_pretty(self).map_err(|e| {
            PaktError::Manifest {
                message: format!("Failed to serialize composer.json: {e}"),
            }
            .into()
        })
    }

    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let content = self.to_string_pretty()?;
        std::fs::write(path, content).map_err(|e| {
            PaktError::Manifest {
                message: format!("Failed to write {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// `require` and `require-dev` merged; development entries win on overlap.
    pub fn all_dependencies(&self) -> BTreeMap<String, String> {
        let mut all = self.require.clone();
        for (name, constraint) in &self.require_dev {
            all.insert(name.clone(), constraint.clone());
        }
        all
    }

    /// Constraint declared for `name` in either section.
    pub fn constraint_for(&self, name: &str) -> Option<&str> {
        self.require
            .get(name)
            .or_else(|| self.require_dev.get(name))
            .map(String::as_str)
    }

    pub fn is_dev_requirement(&self, name: &str) -> bool {
        self.require_dev.contains_key(name) && !self.require.contains_key(name)
    }

    /// Add or update a requirement, moving it out of the other section.
    pub fn add_requirement(&mut self, name: &str, constraint: &str, dev: bool) {
        let name = normalize_package_name(name);
        if dev {
            self.require.remove(&name);
            self.require_dev.insert(name, constraint.to_string());
        } else {
            self.require_dev.remove(&name);
            self.require.insert(name, constraint.to_string());
        }
    }

    /// Remove a requirement from both sections. Returns `true` if it was present.
    pub fn remove_requirement(&mut self, name: &str) -> bool {
        let name = normalize_package_name(name);
        let a = self.require.remove(&name).is_some();
        let b = self.require_dev.remove(&name).is_some();
        a || b
    }

    /// Vendor directory relative to the project root.
    pub fn vendor_dir(&self) -> Option<&str> {
        self.config.vendor_dir.as_deref()
    }
}

/// Pretty-print any serializable value with four-space indentation and a
/// trailing newline, matching the files Composer writes.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    let mut out = String::from_utf8_lossy(&buf).into_owned();
    out.push('\n');
    Ok(out)
}

/// Package names are case-insensitive; pakt stores them lowercased.
pub fn normalize_package_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check the `vendor/package` form: exactly one `/`, both halves non-empty
/// and made of lowercase alphanumerics separated by `.`, `_` or `-`.
pub fn is_valid_package_name(name: &str) -> bool {
    let Some((vendor, package)) = name.split_once('/') else {
        return false;
    };
    is_valid_name_part(vendor) && is_valid_name_part(package)
}

fn is_valid_name_part(part: &str) -> bool {
    if part.is_empty() || part.contains('/') {
        return false;
    }
    let bytes = part.as_bytes();
    let is_sep = |b: u8| matches!(b, b'.' | b'_' | b'-');
    let is_word = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !is_word(bytes[0]) || !is_word(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes.iter().all(|&b| is_word(b) || is_sep(b))
}

/// Split a `vendor/package:constraint` argument. A missing constraint is
/// returned as `None`.
pub fn parse_package_arg(arg: &str) -> (String, Option<String>) {
    let arg = arg.trim();
    let split = arg.find([':', '=', ' ']);
    match split {
        Some(idx) => {
            let name = normalize_package_name(&arg[..idx]);
            let constraint = arg[idx + 1..].trim();
            if constraint.is_empty() {
                (name, None)
            } else {
                (name, Some(constraint.to_string()))
            }
        }
        None => (normalize_package_name(arg), None),
    }
}
