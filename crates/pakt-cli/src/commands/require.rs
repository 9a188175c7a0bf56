//! Handler for `pakt require`.

use miette::Result;

use pakt_ops::ops_install::InstallOptions;
use pakt_ops::ops_require::{self, RequireOptions};

pub fn exec(packages: Vec<String>, dev: bool, no_update: bool, no_scripts: bool) -> Result<()> {
    let project_root = super::project_root()?;
    ops_require::require(
        &project_root,
        &RequireOptions {
            packages,
            dev,
            no_update,
            install: InstallOptions {
                no_dev: false,
                no_scripts,
            },
        },
    )
}
