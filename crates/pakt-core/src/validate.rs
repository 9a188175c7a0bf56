use crate::manifest::{is_valid_package_name, ComposerJson};

/// Findings from [`validate`]: errors make the manifest unusable,
/// warnings are recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// In strict mode warnings count as failures too.
    pub fn is_valid(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// Check a manifest for structural problems.
pub fn validate(manifest: &ComposerJson) -> ValidationReport {
    let mut report = ValidationReport::default();

    match manifest.name.as_deref().map(str::trim) {
        None | Some("") => report
            .errors
            .push("The 'name' property is required".to_string()),
        Some(name) if !is_valid_package_name(name) => report.errors.push(format!(
            "The package name '{name}' is invalid. It should be in 'vendor/package' format."
        )),
        Some(_) => {}
    }

    if manifest.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        report
            .warnings
            .push("The 'description' property is recommended".to_string());
    }
    if manifest.license.as_ref().map_or(true, |l| l.is_empty()) {
        report
            .warnings
            .push("The 'license' property is recommended".to_string());
    }
    if manifest.package_type.is_none() {
        report.warnings.push(
            "The 'type' property is recommended (e.g., 'library', 'project')".to_string(),
        );
    }

    for (pkg, constraint) in &manifest.require {
        if !is_valid_constraint(constraint) {
            report.errors.push(format!(
                "Invalid version constraint '{constraint}' for package '{pkg}'"
            ));
        }
    }
    for (pkg, constraint) in &manifest.require_dev {
        if !is_valid_constraint(constraint) {
            report.errors.push(format!(
                "Invalid version constraint '{constraint}' for package '{pkg}' in require-dev"
            ));
        }
    }

    for pkg in manifest.require.keys() {
        if manifest.require_dev.contains_key(pkg) {
            report.errors.push(format!(
                "Package '{pkg}' is listed in both 'require' and 'require-dev'"
            ));
        }
    }

    if manifest.autoload.is_empty() && manifest.package_type.as_deref() == Some("library") {
        report
            .warnings
            .push("A library should usually have an 'autoload' section".to_string());
    }

    for ns in manifest.autoload.psr4.keys() {
        if !ns.is_empty() && !ns.ends_with('\\') {
            report
                .warnings
                .push(format!("PSR-4 namespace '{ns}' should end with a backslash"));
        }
    }

    report
}

/// Only emptiness is rejected here; anything the resolver cannot parse
/// falls back to the latest stable release at resolution time.
fn is_valid_constraint(constraint: &str) -> bool {
    constraint
        .split(['|', ',', ' '])
        .any(|part| !part.trim().is_empty())
}
