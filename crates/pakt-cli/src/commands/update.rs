//! Handler for `pakt update`.

use miette::Result;

use pakt_ops::ops_install::InstallOptions;
use pakt_ops::ops_update::{self, UpdateOptions};

pub fn exec(packages: Vec<String>, dry_run: bool, no_dev: bool, no_scripts: bool) -> Result<()> {
    let project_root = super::project_root()?;
    let opts = UpdateOptions {
        packages,
        dry_run,
        install: InstallOptions { no_dev, no_scripts },
    };
    let changes = ops_update::update(&project_root, &opts)?;
    if dry_run {
        eprintln!("Dry run: {} change(s), nothing written", changes.len());
    }
    Ok(())
}
