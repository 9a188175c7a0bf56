//! Handler for `pakt show`.

use miette::Result;

use pakt_ops::ops_show::{self, ShowOptions};

pub fn exec(package: Option<String>) -> Result<()> {
    let project_root = super::project_root()?;
    ops_show::show(&project_root, &ShowOptions { package })
}
