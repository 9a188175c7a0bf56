//! Packagist repository URL layout and VCS archive URLs.

use pakt_core::config::{RegistryConfig, DEFAULT_REGISTRY_URL};
use pakt_core::lockfile::SourceInfo;

/// A Composer repository speaking the Packagist p2 protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagistRepository {
    pub url: String,
}

impl Default for PackagistRepository {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

impl PackagistRepository {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(&config.url)
    }

    /// `<base>/p2/<vendor>/<package>.json`
    pub fn metadata_url(&self, name: &str) -> String {
        format!("{}/p2/{name}.json", self.url)
    }

    pub fn search_url(&self) -> String {
        format!("{}/search.json", self.url)
    }
}

/// Zip archive URL for a git source on a known forge. Unknown hosts and
/// non-git sources return the source URL unchanged.
pub fn archive_url_for_source(source: &SourceInfo) -> String {
    if source.kind != "git" {
        return source.url.clone();
    }
    let reference = source.reference.as_deref().unwrap_or("HEAD");
    let repo = source.url.trim_end_matches(".git");
    if repo.contains("github.com") || repo.contains("codeberg.org") {
        format!("{repo}/archive/{reference}.zip")
    } else if repo.contains("gitlab.com") {
        format!("{repo}/-/archive/{reference}/archive.zip")
    } else {
        source.url.clone()
    }
}
