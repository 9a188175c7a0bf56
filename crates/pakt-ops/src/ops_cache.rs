//! Operation: inspect and clear the downloaded archive cache.

use std::path::Path;

use pakt_util::fs::{dir_size, format_size};

/// Print cache statistics.
pub fn stats(project_root: &Path) -> miette::Result<()> {
    let (project, config) = crate::load_project(project_root)?;
    let cache = crate::archive_cache(&project, &config);

    println!("Archive cache: {}", cache.root().display());
    println!("  Archives: {}", cache.archive_count());
    println!("  Size:     {}", format_size(cache.size()));

    let vendor = project.vendor_dir();
    if vendor.is_dir() {
        println!();
        println!("Vendor directory: {}", vendor.display());
        println!("  Size:     {}", format_size(dir_size(&vendor)));
    }
    Ok(())
}

/// Remove every cached archive. Installed packages are left alone.
pub fn clear(project_root: &Path) -> miette::Result<u64> {
    let (project, config) = crate::load_project(project_root)?;
    let cache = crate::archive_cache(&project, &config);
    let freed = cache.clear()?;
    println!("Cleared archive cache ({} freed)", format_size(freed));
    Ok(freed)
}
