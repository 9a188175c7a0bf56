//! Operation: search the registry for packages.

use std::fmt::Write as _;
use std::path::Path;

use pakt_core::config::GlobalConfig;
use pakt_registry::client::SearchResult;
use pakt_util::errors::PaktError;
use pakt_util::progress::spinner;

/// Options for `pakt search`.
#[derive(Debug, Default)]
pub struct SearchOptions {
    pub query: String,
    /// Show at most this many results.
    pub limit: Option<usize>,
}

/// Search needs no project; `_project_root` is accepted for symmetry with
/// the other operations.
pub fn search(_project_root: &Path, opts: &SearchOptions) -> miette::Result<()> {
    let query = opts.query.trim();
    if query.is_empty() {
        return Err(PaktError::Generic {
            message: "Search query must not be empty".into(),
        }
        .into());
    }

    let config = GlobalConfig::load()?;
    let client = crate::registry_client(&config)?;
    let sp = spinner(&format!("Searching for {query}..."));
    let result = client.search(query);
    sp.finish_and_clear();

    print!("{}", render(&result?, opts.limit));
    Ok(())
}

pub fn render(results: &[SearchResult], limit: Option<usize>) -> String {
    if results.is_empty() {
        return "No packages found.\n".to_string();
    }
    let shown = &results[..limit.unwrap_or(results.len()).min(results.len())];
    let width = shown.iter().map(|r| r.name.len()).max().unwrap_or(0);

    let mut out = String::new();
    for r in shown {
        let line = format!("{:<width$}  {}", r.name, r.description);
        let _ = writeln!(out, "{}", line.trim_end());
    }
    if shown.len() < results.len() {
        let _ = writeln!(out, "... and {} more", results.len() - shown.len());
    }
    out
}
