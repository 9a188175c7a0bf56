//! Handler for `pakt init`.

use miette::Result;

use pakt_ops::ops_init::{self, InitOptions};

pub fn exec(name: Option<String>, description: Option<String>) -> Result<()> {
    let cwd = super::current_dir()?;
    ops_init::init(&cwd, &InitOptions { name, description })?;
    println!("Initialized pakt project in {}", cwd.display());
    Ok(())
}
