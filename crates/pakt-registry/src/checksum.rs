//! Dist archive checksum verification.
//!
//! Packagist publishes a SHA-1 `shasum` for some dist archives; GitHub
//! zipballs usually come with an empty one, in which case nothing is
//! checked.

use pakt_util::errors::PaktError;
use pakt_util::hash::sha1_bytes;

/// Verify `data` against the registry-provided SHA-1, if any.
pub fn verify_shasum(data: &[u8], expected: Option<&str>, url: &str) -> miette::Result<()> {
    let Some(expected) = expected.map(str::trim).filter(|s| !s.is_empty()) else {
        tracing::debug!("no shasum published for {url}");
        return Ok(());
    };
    check(&sha1_bytes(data), expected, "SHA-1", url)
}

fn check(actual: &str, expected: &str, algo: &str, url: &str) -> miette::Result<()> {
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!("{algo} ok for {url}");
        Ok(())
    } else {
        Err(PaktError::Archive {
            message: format!("{algo} mismatch for {url}: expected {expected}, got {actual}"),
        }
        .into())
    }
}
