//! Handler for `pakt tree`.

use miette::Result;

use pakt_ops::ops_tree::{self, TreeOptions};

pub fn exec(
    depth: Option<usize>,
    inverted: bool,
    package: Option<String>,
    conflicts: bool,
) -> Result<()> {
    let project_root = super::project_root()?;
    let opts = TreeOptions {
        depth,
        package,
        inverted,
        conflicts,
    };
    ops_tree::tree(&project_root, &opts)
}
