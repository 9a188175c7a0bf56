//! Blocking Packagist client with a per-process metadata cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Deserialize;

use pakt_core::config::RegistryConfig;
use pakt_core::manifest::normalize_package_name;

use crate::error::RegistryError;
use crate::metadata::{parse_p2, PackageInfo};
use crate::repository::{archive_url_for_source, PackagistRepository};
use crate::Registry;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One hit from `search.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub favers: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Packagist client. Fetched package metadata is kept for the lifetime of
/// the client; concurrent first fetches of one name may both hit the
/// network, the second insert is dropped.
pub struct PackagistClient {
    http: reqwest::blocking::Client,
    repo: PackagistRepository,
    cache: RwLock<HashMap<String, Arc<PackageInfo>>>,
}

impl PackagistClient {
    /// Client for the public Packagist mirror.
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_repository(PackagistRepository::default(), DEFAULT_TIMEOUT)
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Self::with_repository(
            PackagistRepository::from_config(config),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_repository(
        repo: PackagistRepository,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pakt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Network {
                url: repo.url.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            repo,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn repository(&self) -> &PackagistRepository {
        &self.repo
    }

    fn fetch(&self, name: &str) -> Result<PackageInfo, RegistryError> {
        let url = self.repo.metadata_url(name);
        tracing::debug!("fetching {url}");
        let network = |message: String| RegistryError::Network {
            url: url.clone(),
            message,
        };

        let resp = self.http.get(&url).send().map_err(|e| network(e.to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::PackageNotFound {
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            return Err(network(format!("HTTP {status}")));
        }
        let body = resp.text().map_err(|e| network(e.to_string()))?;
        parse_p2(name, &body)
    }

    /// Full-text search over package names and descriptions.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, RegistryError> {
        let url = self.repo.search_url();
        tracing::debug!("searching {url} for {query:?}");
        let network = |message: String| RegistryError::Network {
            url: url.clone(),
            message,
        };
        let resp = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .send()
            .map_err(|e| network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(network(format!("HTTP {}", resp.status())));
        }
        let body = resp.text().map_err(|e| network(e.to_string()))?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| RegistryError::Parse {
                name: query.to_string(),
                message: e.to_string(),
            })?;
        Ok(parsed.results)
    }

    /// Archive URL for `name@version`: the dist URL, or a forge archive
    /// derived from the git source.
    pub fn download_url(&self, name: &str, version: &str) -> Result<String, RegistryError> {
        let record = self.get_version(name, version)?;
        if let Some(dist) = record.dist.as_ref().filter(|d| !d.url.is_empty()) {
            return Ok(dist.url.clone());
        }
        if let Some(source) = record.source.as_ref().filter(|s| !s.url.is_empty()) {
            return Ok(archive_url_for_source(source));
        }
        Err(RegistryError::VersionNotFound {
            name: name.to_string(),
            version: format!("{version} (no download location)"),
        })
    }

    fn cached(&self, name: &str) -> Option<Arc<PackageInfo>> {
        match self.cache.read() {
            Ok(cache) => cache.get(name).cloned(),
            Err(poisoned) => poisoned.into_inner().get(name).cloned(),
        }
    }
}

impl Registry for PackagistClient {
    fn get_package(&self, name: &str) -> Result<Arc<PackageInfo>, RegistryError> {
        let name = normalize_package_name(name);
        if let Some(hit) = self.cached(&name) {
            return Ok(hit);
        }

        let info = Arc::new(self.fetch(&name)?);
        let mut cache = match self.cache.write() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(cache.entry(name).or_insert(info).clone())
    }

    fn get_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<crate::VersionRecord, RegistryError> {
        let info = self.get_package(name)?;
        info.versions
            .get(version)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: info.name.clone(),
                version: version.to_string(),
            })
    }
}
