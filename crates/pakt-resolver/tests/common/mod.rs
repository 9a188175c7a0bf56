#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use pakt_core::lockfile::DistInfo;
use pakt_registry::{PackageInfo, Registry, RegistryError, VersionRecord};

/// In-memory registry that counts metadata fetches.
#[derive(Default)]
pub struct FakeRegistry {
    packages: HashMap<String, PackageInfo>,
    fetches: RefCell<Vec<String>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installable version of `name`.
    pub fn add(mut self, name: &str, version: &str, require: &[(&str, &str)]) -> Self {
        let url = format!("https://example.com/{name}/{version}.zip");
        self.insert(name, version, require, Some(url));
        self
    }

    /// Version of `name` with neither dist nor source.
    pub fn add_meta(mut self, name: &str, version: &str, require: &[(&str, &str)]) -> Self {
        self.insert(name, version, require, None);
        self
    }

    fn insert(&mut self, name: &str, version: &str, require: &[(&str, &str)], url: Option<String>) {
        let record = VersionRecord {
            name: name.to_string(),
            version: version.to_string(),
            version_normalized: None,
            description: None,
            package_type: Some(if url.is_some() { "library" } else { "metapackage" }.to_string()),
            require: require
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect::<BTreeMap<_, _>>(),
            require_dev: BTreeMap::new(),
            autoload: None,
            dist: url.map(|url| DistInfo {
                kind: "zip".to_string(),
                url,
                reference: None,
                shasum: None,
            }),
            source: None,
            metadata: Default::default(),
        };
        let info = self
            .packages
            .entry(name.to_string())
            .or_insert_with(|| PackageInfo {
                name: name.to_string(),
                description: None,
                versions: BTreeMap::new(),
                latest_stable: None,
            });
        info.versions.insert(version.to_string(), record);
        info.latest_stable =
            pakt_registry::version::latest_stable(info.versions.keys().map(String::as_str));
    }

    /// Names fetched so far, in order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.borrow().clone()
    }
}

impl Registry for FakeRegistry {
    fn get_package(&self, name: &str) -> Result<Arc<PackageInfo>, RegistryError> {
        self.fetches.borrow_mut().push(name.to_string());
        self.packages
            .get(name)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| RegistryError::PackageNotFound {
                name: name.to_string(),
            })
    }
}

pub fn manifest(json: &str) -> pakt_core::manifest::ComposerJson {
    pakt_core::manifest::ComposerJson::from_str(json).unwrap()
}
