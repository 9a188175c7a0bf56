//! Handler for `pakt install`.

use miette::Result;

use pakt_ops::ops_install::{self, InstallOptions};

pub fn exec(no_dev: bool, no_scripts: bool) -> Result<()> {
    let project_root = super::project_root()?;
    ops_install::install(&project_root, &InstallOptions { no_dev, no_scripts })?;
    Ok(())
}
