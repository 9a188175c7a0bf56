use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use pakt_util::errors::PaktError;

/// Default Packagist mirror.
pub const DEFAULT_REGISTRY_URL: &str = "https://repo.packagist.org";

/// Global user configuration loaded from `~/.pakt/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[registry]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// `[install]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_vendor_dir", rename = "vendor-dir")]
    pub vendor_dir: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            vendor_dir: default_vendor_dir(),
        }
    }
}

fn default_workers() -> usize {
    8
}

fn default_vendor_dir() -> String {
    crate::package::DEFAULT_VENDOR_DIR.to_string()
}

/// `[cache]` section. When `dir` is unset archives are cached per project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub dir: Option<String>,
}

impl GlobalConfig {
    /// Load the global configuration, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("no global config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| PaktError::Generic {
            message: format!("Failed to read global config: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            PaktError::Generic {
                message: format!("Failed to parse global config: {e}"),
            }
            .into()
        })
    }

    pub fn default_path() -> PathBuf {
        pakt_util::dirs_path().join("config.toml")
    }

    /// Cache directory for archives, expanding a leading `~`.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.cache.dir.as_deref().map(expand_home)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}
