use pakt_util::errors::PaktError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = PaktError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_manifest_error_display() {
    let err = PaktError::Manifest {
        message: "expected value at line 3".to_string(),
    };
    assert_eq!(err.to_string(), "Manifest error: expected value at line 3");
}

#[test]
fn test_lockfile_error_display() {
    let err = PaktError::Lockfile {
        message: "truncated".to_string(),
    };
    assert_eq!(err.to_string(), "Lockfile error: truncated");
}

#[test]
fn test_resolution_error_display() {
    let err = PaktError::Resolution {
        message: "no version of psr/log matches ^9.0".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Dependency resolution failed: no version of psr/log matches ^9.0"
    );
}

#[test]
fn test_archive_and_script_display() {
    let archive = PaktError::Archive {
        message: "bad zip".to_string(),
    };
    assert_eq!(archive.to_string(), "Archive error: bad zip");
    let script = PaktError::Script {
        message: "exit code 2".to_string(),
    };
    assert_eq!(script.to_string(), "Script error: exit code 2");
}

#[test]
fn test_generic_error_display() {
    let err = PaktError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_converts_into_miette_report() {
    let err = PaktError::Network {
        message: "timeout".to_string(),
    };
    let report: miette::Report = err.into();
    assert_eq!(report.to_string(), "Network error: timeout");
}
