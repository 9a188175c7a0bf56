use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all pakt operations.
#[derive(Debug, Error, Diagnostic)]
pub enum PaktError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (composer.json).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your composer.json for syntax errors"))]
    Manifest { message: String },

    /// Unreadable or inconsistent lockfile (composer.lock).
    #[error("Lockfile error: {message}")]
    #[diagnostic(help("Delete composer.lock and run `pakt update` to regenerate it"))]
    Lockfile { message: String },

    /// Dependency resolution failed (missing packages, unsatisfiable constraints).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Archive could not be read or unpacked.
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// A manifest script failed to run.
    #[error("Script error: {message}")]
    Script { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type PaktResult<T> = miette::Result<T>;
