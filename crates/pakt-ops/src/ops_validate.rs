//! Operation: check composer.json for errors and recommended fields.

use std::path::Path;

use pakt_core::manifest::ComposerJson;
use pakt_core::validate::{validate as validate_manifest, ValidationReport};
use pakt_core::MANIFEST_FILE;
use pakt_util::errors::PaktError;
use pakt_util::progress::{status, status_error, status_warn};

/// Options for `pakt validate`.
#[derive(Debug, Default)]
pub struct ValidateOptions {
    /// Treat warnings as errors.
    pub strict: bool,
}

pub fn validate(project_root: &Path, opts: &ValidateOptions) -> miette::Result<ValidationReport> {
    let manifest = ComposerJson::from_path(&project_root.join(MANIFEST_FILE))?;
    let report = validate_manifest(&manifest);

    for error in &report.errors {
        status_error("Error", error);
    }
    for warning in &report.warnings {
        status_warn("Warning", warning);
    }

    if !report.is_valid(opts.strict) {
        return Err(PaktError::Manifest {
            message: format!(
                "{MANIFEST_FILE} is invalid: {} error(s), {} warning(s)",
                report.errors.len(),
                report.warnings.len()
            ),
        }
        .into());
    }
    status("Valid", &format!("{MANIFEST_FILE} is valid"));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(json: &str) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("composer.json"), json).unwrap();
        tmp
    }

    #[test]
    fn warnings_only_fail_in_strict_mode() {
        let tmp = project(r#"{"name": "acme/app", "require": {"php": "^8.1"}}"#);
        let report = validate(tmp.path(), &ValidateOptions::default()).unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 3);

        let err = validate(tmp.path(), &ValidateOptions { strict: true }).unwrap_err();
        assert!(err.to_string().contains("0 error(s), 3 warning(s)"), "got: {err}");
    }

    #[test]
    fn missing_name_is_an_error() {
        let tmp = project(
            r#"{"description": "x", "license": "MIT", "type": "project"}"#,
        );
        assert!(validate(tmp.path(), &ValidateOptions::default()).is_err());
    }

    #[test]
    fn complete_manifest_passes_strict() {
        let tmp = project(
            r#"{
                "name": "acme/app",
                "description": "Demo",
                "type": "project",
                "license": "MIT",
                "require": {"php": "^8.1"}
            }"#,
        );
        let report = validate(tmp.path(), &ValidateOptions { strict: true }).unwrap();
        assert_eq!(report, ValidationReport::default());
    }
}
