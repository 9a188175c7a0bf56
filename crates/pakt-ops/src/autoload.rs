//! Autoloader generation.
//!
//! Writes `<vendor>/autoload.php` plus four data files under
//! `<vendor>/pakt/`: `autoload_psr4.php`, `autoload_namespaces.php`
//! (PSR-0), `autoload_classmap.php` and `autoload_files.php`. Paths are
//! expressed relative to `$vendorDir` / `$baseDir` so the vendor directory
//! can be moved together with the project.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use pakt_core::manifest::{AutoloadConfig, ComposerJson};
use pakt_resolver::ResolvedPackage;
use pakt_util::errors::PaktError;

/// Directory under the vendor dir holding the generated data files.
pub const AUTOLOAD_DIR: &str = "pakt";

const HEADER: &str = "@generated by pakt";

const AUTOLOAD_PHP: &str = r#"<?php

// autoload.php @generated by pakt

$psr4 = require __DIR__ . '/pakt/autoload_psr4.php';
$psr0 = require __DIR__ . '/pakt/autoload_namespaces.php';
$classMap = require __DIR__ . '/pakt/autoload_classmap.php';

spl_autoload_register(static function ($class) use ($psr4, $psr0, $classMap) {
    if (isset($classMap[$class])) {
        require $classMap[$class];
        return;
    }

    foreach ($psr4 as $prefix => $dirs) {
        if (strncmp($class, $prefix, strlen($prefix)) !== 0) {
            continue;
        }
        $relative = str_replace('\\', '/', substr($class, strlen($prefix))) . '.php';
        foreach ($dirs as $dir) {
            if (is_file($file = $dir . '/' . $relative)) {
                require $file;
                return;
            }
        }
    }

    $pos = strrpos($class, '\\');
    $relative = $pos === false
        ? str_replace('_', '/', $class) . '.php'
        : str_replace('\\', '/', substr($class, 0, $pos + 1))
            . str_replace('_', '/', substr($class, $pos + 1)) . '.php';
    foreach ($psr0 as $prefix => $dirs) {
        if ($prefix !== '' && strncmp($class, $prefix, strlen($prefix)) !== 0) {
            continue;
        }
        foreach ($dirs as $dir) {
            if (is_file($file = $dir . '/' . $relative)) {
                require $file;
                return;
            }
        }
    }
});

foreach (require __DIR__ . '/pakt/autoload_files.php' as $identifier => $file) {
    if (empty($GLOBALS['__pakt_autoload_files'][$identifier])) {
        $GLOBALS['__pakt_autoload_files'][$identifier] = true;
        require $file;
    }
}
"#;

/// Counts of what went into the autoloader.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AutoloadSummary {
    pub namespaces: usize,
    pub classes: usize,
    pub files: usize,
}

pub struct AutoloadGenerator {
    root: PathBuf,
    vendor_dir: PathBuf,
    dev: bool,
}

/// Where one autoload section's paths are anchored.
struct Base {
    /// PHP variable the generated path starts from.
    var: &'static str,
    /// Path from that variable to the package directory.
    prefix: String,
    /// The package directory on disk.
    disk: PathBuf,
    /// Identifier used to key `files` entries.
    owner: String,
}

#[derive(Default)]
struct Maps {
    psr4: BTreeMap<String, Vec<String>>,
    psr0: BTreeMap<String, Vec<String>>,
    classmap: BTreeMap<String, String>,
    files: Vec<(String, String)>,
}

impl AutoloadGenerator {
    /// `dev` also includes the root manifest's `autoload-dev`.
    pub fn new(root: &Path, vendor_dir: &Path, dev: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            vendor_dir: vendor_dir.to_path_buf(),
            dev,
        }
    }

    pub fn generate(
        &self,
        manifest: &ComposerJson,
        packages: &[ResolvedPackage],
    ) -> miette::Result<AutoloadSummary> {
        let mut maps = Maps::default();

        for package in packages {
            let Some(ref value) = package.autoload else {
                continue;
            };
            let base = Base {
                var: "$vendorDir",
                prefix: format!("/{}", package.name),
                disk: self.vendor_dir.join(&package.name),
                owner: package.name.clone(),
            };
            maps.add(&AutoloadConfig::from_value(value), &base);
        }

        let root_base = Base {
            var: "$baseDir",
            prefix: String::new(),
            disk: self.root.clone(),
            owner: manifest.name.clone().unwrap_or_else(|| "__root__".to_string()),
        };
        maps.add(&manifest.autoload, &root_base);
        if self.dev {
            maps.add(&manifest.autoload_dev, &root_base);
        }

        let out_dir = self.vendor_dir.join(AUTOLOAD_DIR);
        fs::create_dir_all(&out_dir).map_err(PaktError::Io)?;
        let preamble = self.preamble();

        write_php(
            &out_dir.join("autoload_psr4.php"),
            "autoload_psr4.php",
            &preamble,
            &render_prefix_map(&maps.psr4),
        )?;
        write_php(
            &out_dir.join("autoload_namespaces.php"),
            "autoload_namespaces.php",
            &preamble,
            &render_prefix_map(&maps.psr0),
        )?;
        write_php(
            &out_dir.join("autoload_classmap.php"),
            "autoload_classmap.php",
            &preamble,
            &maps
                .classmap
                .iter()
                .map(|(class, path)| format!("    {} => {path},\n", php_str(class)))
                .collect::<String>(),
        )?;
        write_php(
            &out_dir.join("autoload_files.php"),
            "autoload_files.php",
            &preamble,
            &maps
                .files
                .iter()
                .map(|(id, path)| format!("    {} => {path},\n", php_str(id)))
                .collect::<String>(),
        )?;
        fs::write(self.vendor_dir.join("autoload.php"), AUTOLOAD_PHP).map_err(PaktError::Io)?;

        Ok(AutoloadSummary {
            namespaces: maps.psr4.len() + maps.psr0.len(),
            classes: maps.classmap.len(),
            files: maps.files.len(),
        })
    }

    /// `$vendorDir` / `$baseDir` definitions for files in `<vendor>/pakt/`.
    fn preamble(&self) -> String {
        let base = match self.vendor_dir.strip_prefix(&self.root) {
            Ok(rel) => {
                let depth = rel
                    .components()
                    .filter(|c| matches!(c, Component::Normal(_)))
                    .count();
                match depth {
                    0 => "$vendorDir".to_string(),
                    1 => "dirname($vendorDir)".to_string(),
                    n => format!("dirname($vendorDir, {n})"),
                }
            }
            Err(_) => php_str(&self.root.to_string_lossy()),
        };
        format!("$vendorDir = dirname(__DIR__);\n$baseDir = {base};\n")
    }
}

impl Maps {
    fn add(&mut self, autoload: &AutoloadConfig, base: &Base) {
        for (namespace, paths) in &autoload.psr4 {
            let entry = self.psr4.entry(namespace.clone()).or_default();
            entry.extend(paths.paths().into_iter().map(|p| path_expr(base, p)));
        }
        for (namespace, paths) in &autoload.psr0 {
            let entry = self.psr0.entry(namespace.clone()).or_default();
            entry.extend(paths.paths().into_iter().map(|p| path_expr(base, p)));
        }
        for entry in &autoload.classmap {
            for file in php_files(&base.disk.join(clean(entry))) {
                let Ok(rel) = file.strip_prefix(&base.disk) else {
                    continue;
                };
                let rel = slash_path(rel);
                let Ok(source) = fs::read_to_string(&file) else {
                    tracing::debug!("cannot read {} for the classmap", file.display());
                    continue;
                };
                for class in scan_classes(&source) {
                    self.classmap
                        .entry(class)
                        .or_insert_with(|| path_expr(base, &rel));
                }
            }
        }
        for file in &autoload.files {
            let id = pakt_util::hash::md5_bytes(format!("{}:{}", base.owner, clean(file)).as_bytes());
            self.files.push((id, path_expr(base, file)));
        }
    }
}

/// Use a vendor package's own `composer.json` autoload section when it has
/// one; registry metadata is occasionally stale.
pub fn refresh_from_vendor(vendor_dir: &Path, packages: &mut [ResolvedPackage]) {
    for package in packages.iter_mut() {
        let path = vendor_dir.join(&package.name).join("composer.json");
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        let parsed: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("cannot parse {}: {e}", path.display());
                continue;
            }
        };
        if let Some(autoload) = parsed
            .get("autoload")
            .filter(|a| a.as_object().is_some_and(|o| !o.is_empty()))
        {
            package.autoload = Some(autoload.clone());
        }
    }
}

/// Fully-qualified names of the classes, interfaces, traits and enums
/// declared in a PHP source file.
pub fn scan_classes(source: &str) -> Vec<String> {
    let mut namespace = String::new();
    let mut classes = Vec::new();

    for line in source.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("namespace ") {
            namespace = rest
                .trim_end_matches(|c: char| c == ';' || c == '{' || c.is_whitespace())
                .to_string();
            continue;
        }

        let mut words = line.split_whitespace();
        let mut word = words.next();
        while matches!(word, Some("abstract" | "final" | "readonly")) {
            word = words.next();
        }
        if !matches!(word, Some("class" | "interface" | "trait" | "enum")) {
            continue;
        }
        let Some(name) = words.next() else {
            continue;
        };
        let name: String = name
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if name.is_empty() {
            continue;
        }
        classes.push(if namespace.is_empty() {
            name
        } else {
            format!("{namespace}\\{name}")
        });
    }
    classes
}

fn php_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    let mut children: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    children.sort();

    let mut files = Vec::new();
    for child in children {
        if child.is_dir() {
            files.extend(php_files(&child));
        } else if child
            .extension()
            .is_some_and(|ext| ext == "php" || ext == "inc")
        {
            files.push(child);
        }
    }
    files
}

fn clean(path: &str) -> &str {
    let path = path.trim();
    let path = path.strip_prefix("./").unwrap_or(path);
    path.trim_end_matches('/')
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn path_expr(base: &Base, rel: &str) -> String {
    let rel = clean(rel);
    let joined = match (base.prefix.is_empty(), rel.is_empty()) {
        (_, true) => base.prefix.clone(),
        (true, false) => format!("/{rel}"),
        (false, false) => format!("{}/{rel}", base.prefix),
    };
    if joined.is_empty() {
        base.var.to_string()
    } else {
        format!("{} . {}", base.var, php_str(&joined))
    }
}

/// Single-quoted PHP string literal.
fn php_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Longest prefix first so the loader tries the most specific namespace.
fn render_prefix_map(map: &BTreeMap<String, Vec<String>>) -> String {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    keys.into_iter()
        .map(|ns| format!("    {} => array({}),\n", php_str(ns), map[ns].join(", ")))
        .collect()
}

fn write_php(path: &Path, file_name: &str, preamble: &str, body: &str) -> miette::Result<()> {
    let content =
        format!("<?php\n\n// {file_name} {HEADER}\n\n{preamble}\nreturn array(\n{body});\n");
    fs::write(path, content).map_err(|e| {
        PaktError::Generic {
            message: format!("Failed to write {}: {e}", path.display()),
        }
        .into()
    })
}
