//! Downloaded archive cache and zip extraction.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use pakt_util::errors::PaktError;

/// Archive cache at `<project>/.pakt/cache/files/`, laid out as
/// `<vendor>/<package>/<version>-<url hash>.zip`.
#[derive(Debug, Clone)]
pub struct ArchiveCache {
    root: PathBuf,
}

impl ArchiveCache {
    /// Cache rooted at `project_root/.pakt/cache/files/`.
    pub fn new(project_root: &Path) -> Self {
        Self::at(project_root.join(".pakt").join("cache").join("files"))
    }

    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an archive for `name@version` fetched from `url` is stored at.
    pub fn archive_path(&self, name: &str, version: &str, url: &str) -> PathBuf {
        let url_hash = pakt_util::hash::sha256_bytes(url.as_bytes());
        let file = format!("{}-{}.zip", sanitize(version), &url_hash[..12]);
        let mut path = self.root.clone();
        for part in name.split('/') {
            path.push(sanitize(part));
        }
        path.join(file)
    }

    pub fn get(&self, name: &str, version: &str, url: &str) -> Option<Vec<u8>> {
        let path = self.archive_path(name, version, url);
        if !path.is_file() {
            return None;
        }
        fs::read(&path).ok()
    }

    pub fn put(&self, name: &str, version: &str, url: &str, data: &[u8]) -> miette::Result<PathBuf> {
        let path = self.archive_path(name, version, url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(PaktError::Io)?;
        }
        fs::write(&path, data).map_err(PaktError::Io)?;
        Ok(path)
    }

    /// Total size of the cache directory in bytes.
    pub fn size(&self) -> u64 {
        pakt_util::fs::dir_size(&self.root)
    }

    /// Number of cached archives.
    pub fn archive_count(&self) -> usize {
        count_files(&self.root)
    }

    /// Remove every cached archive. Returns the number of bytes freed.
    pub fn clear(&self) -> miette::Result<u64> {
        let size = self.size();
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(PaktError::Io)?;
        }
        Ok(size)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

fn count_files(path: &Path) -> usize {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| {
            let p = e.path();
            if p.is_dir() {
                count_files(&p)
            } else {
                1
            }
        })
        .sum()
}

/// Unpack a zip archive into `dest`, dropping the first path component of
/// every entry (the `vendor-package-<ref>/` wrapper forges put around the
/// tree). Entries that sit at the top level are kept as they are.
pub fn extract_zip(data: &[u8], dest: &Path) -> miette::Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| PaktError::Archive {
        message: format!("Failed to open zip: {e}"),
    })?;
    fs::create_dir_all(dest).map_err(PaktError::Io)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| PaktError::Archive {
            message: format!("Zip entry error: {e}"),
        })?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("skipping unsafe zip entry {}", entry.name());
            continue;
        };
        let Some(stripped) = strip_first_component(&relative, entry.is_dir()) else {
            continue;
        };
        let out_path = dest.join(stripped);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(PaktError::Io)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(PaktError::Io)?;
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).map_err(|e| PaktError::Archive {
            message: format!("Failed to read zip entry {}: {e}", entry.name()),
        })?;
        fs::write(&out_path, &buf).map_err(PaktError::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777))
                    .map_err(PaktError::Io)?;
            }
        }
    }
    Ok(())
}

/// `a/b/c` → `b/c`; `file` → `file`; `a/` → `None`.
fn strip_first_component(path: &Path, is_dir: bool) -> Option<PathBuf> {
    let parts: Vec<Component> = path.components().collect();
    match parts.len() {
        0 => None,
        1 if is_dir => None,
        1 => Some(path.to_path_buf()),
        _ => Some(parts[1..].iter().collect()),
    }
}
