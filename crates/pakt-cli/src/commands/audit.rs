//! Handler for `pakt audit`.

use miette::Result;

use pakt_ops::ops_audit::{self, AuditOptions};

pub fn exec(fail_on: Option<String>, ignore: Vec<String>) -> Result<()> {
    let project_root = super::project_root()?;
    ops_audit::audit(&project_root, &AuditOptions { fail_on, ignore })?;
    Ok(())
}
