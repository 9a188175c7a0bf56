//! High-level operations behind each `pakt` command.
//!
//! Every operation takes the project root plus an options struct and
//! reports progress through `pakt_util::progress`. Operations are
//! synchronous; the parallel downloader and the OSV audit drive their own
//! tokio runtime.

pub mod autoload;
pub mod installer;
pub mod ops_audit;
pub mod ops_cache;
pub mod ops_init;
pub mod ops_install;
pub mod ops_remove;
pub mod ops_require;
pub mod ops_run;
pub mod ops_search;
pub mod ops_show;
pub mod ops_tree;
pub mod ops_update;
pub mod ops_validate;
pub mod ops_why;

use std::path::Path;

use pakt_core::config::GlobalConfig;
use pakt_core::lockfile::ComposerLock;
use pakt_core::package::Project;
use pakt_registry::archive::ArchiveCache;
use pakt_registry::PackagistClient;
use pakt_util::errors::PaktError;

/// Load the project rooted at `project_root` with the global configuration
/// applied.
pub(crate) fn load_project(project_root: &Path) -> miette::Result<(Project, GlobalConfig)> {
    let config = GlobalConfig::load()?;
    let project =
        Project::load(project_root)?.with_default_vendor_dir(config.install.vendor_dir.clone());
    Ok((project, config))
}

pub(crate) fn registry_client(config: &GlobalConfig) -> miette::Result<PackagistClient> {
    Ok(PackagistClient::from_config(&config.registry)?)
}

/// Archive cache: `[cache] dir` when configured, else `.pakt/cache/files`
/// inside the project.
pub(crate) fn archive_cache(project: &Project, config: &GlobalConfig) -> ArchiveCache {
    match config.cache_dir() {
        Some(dir) => ArchiveCache::at(dir.join("files")),
        None => ArchiveCache::new(&project.root_dir),
    }
}

/// The project's `composer.lock`, if present and readable.
pub(crate) fn read_lock(project: &Project) -> Option<ComposerLock> {
    let path = project.lock_path();
    if !path.is_file() {
        return None;
    }
    match ComposerLock::from_path(&path) {
        Ok(lock) => Some(lock),
        Err(e) => {
            tracing::warn!("ignoring unreadable {}: {e}", path.display());
            None
        }
    }
}

pub(crate) fn runtime() -> miette::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        PaktError::Generic {
            message: format!("Failed to start async runtime: {e}"),
        }
        .into()
    })
}
