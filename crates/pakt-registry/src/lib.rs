//! Packagist registry protocol: p2 metadata parsing, package lookup and
//! search, archive download, checksum verification, and the local archive
//! cache.

pub mod archive;
pub mod checksum;
pub mod client;
pub mod download;
pub mod error;
pub mod metadata;
pub mod repository;
pub mod version;

use std::sync::Arc;

pub use client::PackagistClient;
pub use error::RegistryError;
pub use metadata::{PackageInfo, VersionRecord};

/// Source of package metadata consumed by the resolver.
///
/// Implementations cache per package name; the returned [`PackageInfo`] is
/// immutable once fetched.
pub trait Registry {
    /// All known versions of `name`.
    fn get_package(&self, name: &str) -> Result<Arc<PackageInfo>, RegistryError>;

    /// The record for one concrete version of `name`.
    fn get_version(&self, name: &str, version: &str) -> Result<VersionRecord, RegistryError> {
        let info = self.get_package(name)?;
        info.versions
            .get(version)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }
}

impl<R: Registry + ?Sized> Registry for &R {
    fn get_package(&self, name: &str) -> Result<Arc<PackageInfo>, RegistryError> {
        (**self).get_package(name)
    }

    fn get_version(&self, name: &str, version: &str) -> Result<VersionRecord, RegistryError> {
        (**self).get_version(name, version)
    }
}

impl<R: Registry + ?Sized> Registry for Arc<R> {
    fn get_package(&self, name: &str) -> Result<Arc<PackageInfo>, RegistryError> {
        (**self).get_package(name)
    }

    fn get_version(&self, name: &str, version: &str) -> Result<VersionRecord, RegistryError> {
        (**self).get_version(name, version)
    }
}
