//! Cache command implementation.

use miette::Result;

use crate::cli::CacheAction;

pub fn exec(action: CacheAction) -> Result<()> {
    let project_root = super::project_root()?;
    match action {
        CacheAction::Stats => pakt_ops::ops_cache::stats(&project_root),
        CacheAction::Clear => pakt_ops::ops_cache::clear(&project_root).map(|_| ()),
    }
}
