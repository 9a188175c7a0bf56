//! Core data types for the pakt dependency manager.
//!
//! This crate defines the on-disk formats a pakt project works with:
//! the `composer.json` manifest, the `composer.lock` lockfile, manifest
//! scripts, manifest validation and the global user configuration.
//!
//! This crate is intentionally free of async code and network I/O.

/// Manifest file name looked up in the project root.
pub const MANIFEST_FILE: &str = "composer.json";

/// Lockfile name written next to the manifest.
pub const LOCK_FILE: &str = "composer.lock";

pub mod config;
pub mod json;
pub mod lockfile;
pub mod manifest;
pub mod package;
pub mod scripts;
pub mod validate;
