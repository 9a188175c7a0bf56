use miette::Diagnostic;
use thiserror::Error;

/// Failures talking to, or interpreting data from, a package registry.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("package {name} not found")]
    #[diagnostic(help("Check the package name on https://packagist.org"))]
    PackageNotFound { name: String },

    #[error("version {version} not found for package {name}")]
    VersionNotFound { name: String, version: String },

    #[error("failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    #[error("invalid metadata for {name}: {message}")]
    Parse { name: String, message: String },
}
