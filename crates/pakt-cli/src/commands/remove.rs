//! Handler for `pakt remove`.

use miette::Result;

use pakt_ops::ops_install::InstallOptions;
use pakt_ops::ops_remove::{self, RemoveOptions};

pub fn exec(packages: Vec<String>, no_update: bool, no_scripts: bool) -> Result<()> {
    let project_root = super::project_root()?;
    ops_remove::remove(
        &project_root,
        &RemoveOptions {
            packages,
            no_update,
            install: InstallOptions {
                no_dev: false,
                no_scripts,
            },
        },
    )
}
