//! Handler for `pakt run`.

use miette::Result;

use pakt_ops::ops_run::{self, RunOptions};

pub fn exec(script: String, args: Vec<String>) -> Result<()> {
    let project_root = super::project_root()?;
    ops_run::run(&project_root, &RunOptions { script, args })
}
