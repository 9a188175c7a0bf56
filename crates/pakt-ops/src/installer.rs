//! Parallel package installer.
//!
//! Each installable package is fetched from the archive cache or
//! downloaded, verified against the registry's SHA-1, cached and unpacked
//! into `<vendor>/<name>/`. A `.pakt-version` marker records the installed
//! version so unchanged packages are skipped on the next run. Failures do
//! not stop the other downloads; every error is reported together at the
//! end.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use pakt_registry::archive::{extract_zip, ArchiveCache};
use pakt_registry::checksum::verify_shasum;
use pakt_registry::download;
use pakt_registry::repository::archive_url_for_source;
use pakt_resolver::ResolvedPackage;
use pakt_util::errors::PaktError;
use pakt_util::progress::progress_bar;

/// Marker file written inside every installed package directory.
pub const VERSION_MARKER: &str = ".pakt-version";

/// What an install run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: usize,
    pub up_to_date: usize,
    /// Previously installed packages no longer in the resolved set.
    pub removed: usize,
}

pub struct Installer {
    vendor_dir: PathBuf,
    cache: ArchiveCache,
    workers: usize,
}

impl Installer {
    pub fn new(vendor_dir: &Path, cache: ArchiveCache, workers: usize) -> Self {
        Self {
            vendor_dir: vendor_dir.to_path_buf(),
            cache,
            workers: workers.max(1),
        }
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.vendor_dir.join(name)
    }

    /// True when `vendor/<name>` holds exactly this version.
    pub fn is_installed(&self, package: &ResolvedPackage) -> bool {
        fs::read_to_string(self.package_dir(&package.name).join(VERSION_MARKER))
            .map(|v| v.trim() == package.version)
            .unwrap_or(false)
    }

    /// Bring the vendor directory in line with `packages`.
    pub fn install(&self, packages: &[ResolvedPackage]) -> miette::Result<InstallReport> {
        let mut report = InstallReport {
            removed: self.prune(packages)?,
            ..InstallReport::default()
        };

        let mut pending = Vec::new();
        for package in packages {
            if !package.is_installable() {
                tracing::debug!("{} has no archive, nothing to install", package.name);
                continue;
            }
            if self.is_installed(package) {
                report.up_to_date += 1;
                continue;
            }
            pending.push(package.clone());
        }

        if pending.is_empty() {
            return Ok(report);
        }
        let rt = crate::runtime()?;
        report.installed = rt.block_on(self.fetch_all(pending))?;
        Ok(report)
    }

    async fn fetch_all(&self, pending: Vec<ResolvedPackage>) -> miette::Result<usize> {
        let client = download::build_client()?;
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let pb = progress_bar(pending.len() as u64, "Downloading");
        let mut join_set = JoinSet::new();

        for package in pending {
            let client = client.clone();
            let sem = semaphore.clone();
            let cache = self.cache.clone();
            let dest = self.package_dir(&package.name);
            let pb = pb.clone();

            join_set.spawn(async move {
                let result = install_one(&client, &sem, &cache, &package, &dest).await;
                pb.inc(1);
                (package.name, result)
            });
        }

        let mut installed = 0;
        let mut errors = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(()))) => installed += 1,
                Ok((name, Err(e))) => errors.push(format!("{name}: {e}")),
                Err(e) => errors.push(format!("background task failed: {e}")),
            }
        }
        pb.finish_and_clear();

        if errors.is_empty() {
            return Ok(installed);
        }
        errors.sort();
        Err(PaktError::Archive {
            message: format!(
                "{} package(s) failed to install:\n  {}",
                errors.len(),
                errors.join("\n  ")
            ),
        }
        .into())
    }

    /// Remove package directories pakt installed earlier that are no longer
    /// wanted. Directories without a marker are left alone.
    fn prune(&self, keep: &[ResolvedPackage]) -> miette::Result<usize> {
        let wanted: HashSet<&str> = keep.iter().map(|p| p.name.as_str()).collect();
        let Ok(vendors) = fs::read_dir(&self.vendor_dir) else {
            return Ok(0);
        };

        let mut removed = 0;
        for vendor in vendors.flatten() {
            let vendor_path = vendor.path();
            if !vendor_path.is_dir() {
                continue;
            }
            let Ok(entries) = fs::read_dir(&vendor_path) else {
                continue;
            };
            let mut removed_here = 0;
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.join(VERSION_MARKER).is_file() {
                    continue;
                }
                let name = format!(
                    "{}/{}",
                    vendor.file_name().to_string_lossy(),
                    entry.file_name().to_string_lossy()
                );
                if wanted.contains(name.as_str()) {
                    continue;
                }
                tracing::debug!("removing stale package {name}");
                fs::remove_dir_all(&path).map_err(PaktError::Io)?;
                removed_here += 1;
            }
            // Only namespaces emptied by this pass.
            if removed_here > 0
                && fs::read_dir(&vendor_path).is_ok_and(|mut d| d.next().is_none())
            {
                fs::remove_dir(&vendor_path).map_err(PaktError::Io)?;
            }
            removed += removed_here;
        }
        Ok(removed)
    }
}

/// Where to download a package from: the dist archive, or a forge zip
/// derived from its git source.
pub fn archive_url(package: &ResolvedPackage) -> Option<String> {
    if let Some(dist) = package.dist.as_ref().filter(|d| !d.url.is_empty()) {
        return Some(dist.url.clone());
    }
    if let Some(source) = package.source.as_ref().filter(|s| !s.url.is_empty()) {
        return Some(archive_url_for_source(source));
    }
    (!package.url.is_empty()).then(|| package.url.clone())
}

async fn install_one(
    client: &Client,
    semaphore: &Semaphore,
    cache: &ArchiveCache,
    package: &ResolvedPackage,
    dest: &Path,
) -> miette::Result<()> {
    let _permit = semaphore.acquire().await.map_err(|e| PaktError::Generic {
        message: format!("download pool closed: {e}"),
    })?;

    let url = archive_url(package).ok_or_else(|| PaktError::Archive {
        message: "no download location".to_string(),
    })?;

    let data = match cache.get(&package.name, &package.version, &url) {
        Some(data) => {
            tracing::debug!("using cached archive for {} {}", package.name, package.version);
            data
        }
        None => {
            tracing::debug!("downloading {url}");
            let data = download::download_bytes(client, &url)
                .await?
                .ok_or_else(|| PaktError::Network {
                    message: format!("archive not found at {url}"),
                })?;
            let shasum = package.dist.as_ref().and_then(|d| d.shasum.as_deref());
            verify_shasum(&data, shasum, &url)?;
            cache.put(&package.name, &package.version, &url, &data)?;
            data
        }
    };

    let dest = dest.to_path_buf();
    let version = package.version.clone();
    tokio::task::spawn_blocking(move || unpack(&data, &dest, &version))
        .await
        .map_err(|e| PaktError::Generic {
            message: format!("unpack task failed: {e}"),
        })?
}

/// Replace `dest` with the archive contents. The marker goes in last so an
/// interrupted unpack is retried on the next run.
fn unpack(data: &[u8], dest: &Path, version: &str) -> miette::Result<()> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(PaktError::Io)?;
    }
    extract_zip(data, dest)?;
    fs::write(dest.join(VERSION_MARKER), format!("{version}\n")).map_err(PaktError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pakt_core::lockfile::{DistInfo, SourceInfo};
    use std::io::{Cursor, Write};

    fn make_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    fn package(name: &str, version: &str) -> ResolvedPackage {
        let url = format!("https://example.invalid/{name}/{version}.zip");
        ResolvedPackage {
            name: name.to_string(),
            version: version.to_string(),
            url: url.clone(),
            dist: Some(DistInfo {
                kind: "zip".to_string(),
                url,
                reference: None,
                shasum: None,
            }),
            ..ResolvedPackage::default()
        }
    }

    fn seed_cache(cache: &ArchiveCache, pkg: &ResolvedPackage, data: &[u8]) {
        let url = archive_url(pkg).unwrap();
        cache.put(&pkg.name, &pkg.version, &url, data).unwrap();
    }

    #[test]
    fn installs_from_cache_and_writes_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ArchiveCache::new(tmp.path());
        let pkg = package("psr/log", "3.0.0");
        seed_cache(
            &cache,
            &pkg,
            &make_zip(&[
                ("php-fig-log-abc/composer.json", "{}"),
                ("php-fig-log-abc/src/LoggerInterface.php", "<?php"),
            ]),
        );

        let vendor = tmp.path().join("vendor");
        let installer = Installer::new(&vendor, cache, 2);
        let report = installer.install(&[pkg.clone()]).unwrap();

        assert_eq!(report.installed, 1);
        assert!(vendor.join("psr/log/src/LoggerInterface.php").is_file());
        assert!(installer.is_installed(&pkg));

        let again = installer.install(&[pkg]).unwrap();
        assert_eq!(again.installed, 0);
        assert_eq!(again.up_to_date, 1);
    }

    #[test]
    fn version_change_is_not_installed() {
        let tmp = tempfile::tempdir().unwrap();
        let vendor = tmp.path().join("vendor");
        fs::create_dir_all(vendor.join("psr/log")).unwrap();
        fs::write(vendor.join("psr/log").join(VERSION_MARKER), "2.0.0\n").unwrap();

        let installer = Installer::new(&vendor, ArchiveCache::new(tmp.path()), 1);
        assert!(installer.is_installed(&package("psr/log", "2.0.0")));
        assert!(!installer.is_installed(&package("psr/log", "3.0.0")));
    }

    #[test]
    fn metapackages_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let installer = Installer::new(&tmp.path().join("vendor"), ArchiveCache::new(tmp.path()), 1);
        let meta = ResolvedPackage {
            name: "acme/meta".to_string(),
            version: "1.0.0".to_string(),
            ..ResolvedPackage::default()
        };
        assert_eq!(installer.install(&[meta]).unwrap(), InstallReport::default());
    }

    #[test]
    fn stale_packages_are_pruned() {
        let tmp = tempfile::tempdir().unwrap();
        let vendor = tmp.path().join("vendor");
        for name in ["old/gone", "psr/log"] {
            fs::create_dir_all(vendor.join(name)).unwrap();
            fs::write(vendor.join(name).join(VERSION_MARKER), "1.0.0\n").unwrap();
        }
        fs::create_dir_all(vendor.join("bin")).unwrap();

        let installer = Installer::new(&vendor, ArchiveCache::new(tmp.path()), 1);
        let report = installer.install(&[package("psr/log", "1.0.0")]).unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.up_to_date, 1);
        assert!(!vendor.join("old").exists());
        assert!(vendor.join("psr/log").is_dir());
        assert!(vendor.join("bin").is_dir());
    }

    #[test]
    fn foreign_empty_vendor_dirs_survive_pruning() {
        let tmp = tempfile::tempdir().unwrap();
        let vendor = tmp.path().join("vendor");
        fs::create_dir_all(vendor.join("bin")).unwrap();
        fs::create_dir_all(vendor.join("acme")).unwrap();
        fs::create_dir_all(vendor.join("old/gone")).unwrap();
        fs::write(vendor.join("old/gone").join(VERSION_MARKER), "1.0.0\n").unwrap();

        let installer = Installer::new(&vendor, ArchiveCache::new(tmp.path()), 1);
        let report = installer.install(&[]).unwrap();

        assert_eq!(report.removed, 1);
        assert!(!vendor.join("old").exists());
        assert!(vendor.join("bin").is_dir());
        assert!(vendor.join("acme").is_dir());
    }

    #[test]
    fn every_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ArchiveCache::new(tmp.path());
        let a = package("acme/a", "1.0.0");
        let b = package("acme/b", "1.0.0");
        seed_cache(&cache, &a, b"not a zip");
        seed_cache(&cache, &b, b"also not a zip");

        let installer = Installer::new(&tmp.path().join("vendor"), cache, 4);
        let err = installer.install(&[a, b]).unwrap_err().to_string();
        assert!(err.contains("2 package(s) failed to install"), "got: {err}");
        assert!(err.contains("acme/a:"));
        assert!(err.contains("acme/b:"));
    }

    #[test]
    fn archive_url_prefers_dist_then_forge_source() {
        let pkg = package("psr/log", "3.0.0");
        assert_eq!(
            archive_url(&pkg).as_deref(),
            Some("https://example.invalid/psr/log/3.0.0.zip")
        );

        let source_only = ResolvedPackage {
            name: "acme/lib".to_string(),
            version: "1.0.0".to_string(),
            url: "https://github.com/acme/lib.git".to_string(),
            source: Some(SourceInfo {
                kind: "git".to_string(),
                url: "https://github.com/acme/lib.git".to_string(),
                reference: Some("abc123".to_string()),
            }),
            ..ResolvedPackage::default()
        };
        assert_eq!(
            archive_url(&source_only).as_deref(),
            Some("https://github.com/acme/lib/archive/abc123.zip")
        );
    }
}
