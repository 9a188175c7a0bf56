use pakt_core::manifest::{AutoloadConfig, ComposerJson, License, PathList};
use pakt_core::package::Project;
use pakt_core::scripts::Script;

const MINIMAL_JSON: &str = r#"{
    "require": {
        "php": ">=8.1"
    }
}"#;

const FULL_JSON: &str = r#"{
    "name": "acme/blog",
    "description": "A small blog engine",
    "type": "project",
    "license": ["MIT", "Apache-2.0"],
    "authors": [{"name": "Jo Doe", "email": "jo@example.com"}],
    "require": {
        "php": "^8.2",
        "monolog/monolog": "^3.0",
        "symfony/console": "^6.4 || ^7.0"
    },
    "require-dev": {
        "phpunit/phpunit": "^10.5"
    },
    "autoload": {
        "psr-4": {"Acme\\Blog\\": "src/"},
        "files": ["src/helpers.php"]
    },
    "autoload-dev": {
        "psr-4": {"Acme\\Blog\\Tests\\": ["tests/", "tests-integration/"]}
    },
    "scripts": {
        "test": "phpunit",
        "check": ["@test", "phpstan analyse"]
    },
    "config": {"vendor-dir": "lib", "sort-packages": true},
    "minimum-stability": "stable",
    "prefer-stable": true,
    "repositories": [{"type": "vcs", "url": "https://example.com/repo.git"}]
}"#;

#[test]
fn parse_minimal_manifest() {
    let m = ComposerJson::from_str(MINIMAL_JSON).unwrap();
    assert!(m.name.is_none());
    assert_eq!(m.require.get("php").map(String::as_str), Some(">=8.1"));
    assert!(m.require_dev.is_empty());
    assert!(m.autoload.is_empty());
}

#[test]
fn parse_full_manifest() {
    let m = ComposerJson::from_str(FULL_JSON).unwrap();
    assert_eq!(m.name.as_deref(), Some("acme/blog"));
    assert_eq!(m.package_type.as_deref(), Some("project"));
    assert_eq!(
        m.license,
        Some(License::Multiple(vec!["MIT".into(), "Apache-2.0".into()]))
    );
    assert_eq!(m.authors[0].email.as_deref(), Some("jo@example.com"));
    assert_eq!(m.require.len(), 3);
    assert_eq!(m.require_dev["phpunit/phpunit"], "^10.5");
    assert_eq!(
        m.autoload.psr4.get("Acme\\Blog\\"),
        Some(&PathList::One("src/".into()))
    );
    assert_eq!(
        m.autoload_dev.psr4["Acme\\Blog\\Tests\\"].paths(),
        vec!["tests/", "tests-integration/"]
    );
    assert_eq!(m.scripts["test"], Script::Single("phpunit".into()));
    assert_eq!(m.scripts["check"].commands(), vec!["@test", "phpstan analyse"]);
    assert_eq!(m.vendor_dir(), Some("lib"));
    assert_eq!(m.prefer_stable, Some(true));
    assert!(m.other.contains_key("repositories"));
}

#[test]
fn empty_list_sections_are_accepted() {
    let m = ComposerJson::from_str(r#"{"require": [], "autoload": {"psr-4": []}}"#).unwrap();
    assert!(m.require.is_empty());
    assert!(m.autoload.psr4.is_empty());
}

#[test]
fn invalid_json_is_manifest_error() {
    let err = ComposerJson::from_str("{ not json").unwrap_err();
    assert!(err.to_string().contains("Manifest error"), "got: {err}");
}

#[test]
fn write_preserves_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("composer.json");
    let m = ComposerJson::from_str(FULL_JSON).unwrap();
    m.write_to(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"repositories\""));
    assert!(written.contains("\"sort-packages\": true"));
    assert!(written.starts_with("{\n    \""));

    let reread = ComposerJson::from_path(&path).unwrap();
    assert_eq!(reread, m);
}

#[test]
fn add_requirement_moves_between_sections() {
    let mut m = ComposerJson::from_str(FULL_JSON).unwrap();
    m.add_requirement("PHPUnit/PHPUnit", "^11.0", false);
    assert_eq!(m.require["phpunit/phpunit"], "^11.0");
    assert!(!m.require_dev.contains_key("phpunit/phpunit"));

    m.add_requirement("monolog/monolog", "^3.5", true);
    assert!(m.is_dev_requirement("monolog/monolog"));
}

#[test]
fn remove_requirement_reports_presence() {
    let mut m = ComposerJson::from_str(FULL_JSON).unwrap();
    assert!(m.remove_requirement("phpunit/phpunit"));
    assert!(!m.remove_requirement("phpunit/phpunit"));
    assert!(m.constraint_for("phpunit/phpunit").is_none());
}

#[test]
fn all_dependencies_merges_sections() {
    let m = ComposerJson::from_str(FULL_JSON).unwrap();
    let all = m.all_dependencies();
    assert_eq!(all.len(), 4);
    assert!(all.contains_key("phpunit/phpunit"));
}

#[test]
fn autoload_from_registry_blob() {
    let blob = serde_json::json!({"psr-4": {"Psr\\Log\\": "src"}});
    let cfg = AutoloadConfig::from_value(&blob);
    assert_eq!(cfg.psr4["Psr\\Log\\"].paths(), vec!["src"]);
    assert!(AutoloadConfig::from_value(&serde_json::json!("__unset")).is_empty());
}

#[test]
fn project_discovery_and_vendor_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("composer.json"), FULL_JSON).unwrap();
    let nested = dir.path().join("src").join("Http");
    std::fs::create_dir_all(&nested).unwrap();

    let project = Project::discover(&nested).unwrap();
    assert_eq!(project.root_dir, dir.path());
    assert_eq!(project.vendor_dir(), dir.path().join("lib"));
    assert_eq!(project.lock_path(), dir.path().join("composer.lock"));
}

#[test]
fn project_vendor_dir_falls_back_to_configured_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("composer.json"), MINIMAL_JSON).unwrap();
    let project = Project::load(dir.path()).unwrap();
    assert_eq!(project.vendor_dir(), dir.path().join("vendor"));
    let project = project.with_default_vendor_dir("deps");
    assert_eq!(project.vendor_dir(), dir.path().join("deps"));
}

#[test]
fn project_discovery_fails_without_manifest() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Project::discover(dir.path()).is_err());
}
