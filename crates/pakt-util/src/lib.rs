//! Shared utilities for the pakt dependency manager.
//!
//! This crate provides cross-cutting concerns used by all other pakt crates:
//! error types, filesystem helpers, hashing, process spawning, and terminal
//! progress indicators.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;

use std::path::{Path, PathBuf};

/// Returns the path to the pakt data directory (`~/.pakt/`).
///
/// `PAKT_HOME` takes precedence over the user's home directory.
pub fn dirs_path() -> PathBuf {
    if let Ok(home) = std::env::var("PAKT_HOME") {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".pakt")
}
