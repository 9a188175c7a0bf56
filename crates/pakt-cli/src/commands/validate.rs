//! Handler for `pakt validate`.

use miette::Result;

use pakt_ops::ops_validate::{self, ValidateOptions};

pub fn exec(strict: bool) -> Result<()> {
    let project_root = super::project_root()?;
    ops_validate::validate(&project_root, &ValidateOptions { strict })?;
    Ok(())
}
