//! Handler for `pakt search`.

use miette::Result;

use pakt_ops::ops_search::{self, SearchOptions};

pub fn exec(query: &str, limit: Option<usize>) -> Result<()> {
    let cwd = super::current_dir()?;
    ops_search::search(
        &cwd,
        &SearchOptions {
            query: query.to_string(),
            limit,
        },
    )
}
