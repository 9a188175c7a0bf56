//! Handlers for `pakt why` and `pakt why-not`.

use miette::Result;

use pakt_ops::ops_why::{self, WhyNotOptions, WhyOptions};

pub fn exec(package: String) -> Result<()> {
    let project_root = super::project_root()?;
    ops_why::why(&project_root, &WhyOptions { package })
}

pub fn exec_not(package: String, version: String) -> Result<()> {
    let project_root = super::project_root()?;
    ops_why::why_not(&project_root, &WhyNotOptions { package, version })
}
