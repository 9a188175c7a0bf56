use std::path::{Path, PathBuf};

use pakt_util::errors::PaktError;

use crate::manifest::ComposerJson;
use crate::{LOCK_FILE, MANIFEST_FILE};

/// Default vendor directory, relative to the project root.
pub const DEFAULT_VENDOR_DIR: &str = "vendor";

/// A pakt project: one `composer.json` plus the directory it lives in.
#[derive(Debug, Clone)]
pub struct Project {
    pub manifest: ComposerJson,
    pub manifest_path: PathBuf,
    pub root_dir: PathBuf,
    default_vendor_dir: String,
}

impl Project {
    /// Find the nearest `composer.json` walking up from `start` and load it.
    pub fn discover(start: &Path) -> miette::Result<Self> {
        let root = pakt_util::fs::find_ancestor_with(start, MANIFEST_FILE).ok_or_else(|| {
            PaktError::Manifest {
                message: format!(
                    "could not find {MANIFEST_FILE} in {} or any parent directory",
                    start.display()
                ),
            }
        })?;
        Self::load(&root)
    }

    /// Load the project rooted at `root`.
    pub fn load(root: &Path) -> miette::Result<Self> {
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = ComposerJson::from_path(&manifest_path)?;
        Ok(Self {
            manifest,
            manifest_path,
            root_dir: root.to_path_buf(),
            default_vendor_dir: DEFAULT_VENDOR_DIR.to_string(),
        })
    }

    /// Vendor directory from the global configuration, used when the
    /// manifest does not set `config.vendor-dir`.
    pub fn with_default_vendor_dir(mut self, dir: impl Into<String>) -> Self {
        self.default_vendor_dir = dir.into();
        self
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root_dir.join(LOCK_FILE)
    }

    pub fn vendor_dir(&self) -> PathBuf {
        let dir = self
            .manifest
            .vendor_dir()
            .unwrap_or(&self.default_vendor_dir);
        self.root_dir.join(dir)
    }

    /// Project-local cache (`.pakt/cache`).
    pub fn cache_dir(&self) -> PathBuf {
        self.root_dir.join(".pakt").join("cache")
    }

    pub fn save_manifest(&self) -> miette::Result<()> {
        self.manifest.write_to(&self.manifest_path)
    }
}
