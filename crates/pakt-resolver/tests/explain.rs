mod common;

use common::{manifest, FakeRegistry};
use pakt_resolver::{ResolveError, Resolver};

fn registry() -> FakeRegistry {
    FakeRegistry::new()
        .add("acme/app-kit", "1.0.0", &[("php", ">=8.1"), ("acme/http", "^2.0")])
        .add("acme/http", "1.0.0", &[])
        .add("acme/http", "2.0.0", &[("psr/log", "^3.0")])
        .add("psr/log", "3.0.0", &[])
        .add("acme/loop-a", "1.0.0", &[("acme/loop-b", "^1.0")])
        .add("acme/loop-b", "1.0.0", &[("acme/loop-a", "^1.0")])
}

#[test]
fn direct_requirement() {
    let registry = registry();
    let m = manifest(r#"{"require": {"acme/app-kit": "^1.0"}}"#);
    let tree = Resolver::new(&registry)
        .build_dependency_tree(&m, "acme/app-kit")
        .unwrap();
    assert_eq!(tree, "Your project\n  └─ acme/app-kit (^1.0)\n");
}

#[test]
fn direct_dev_requirement() {
    let registry = registry();
    let m = manifest(r#"{"require-dev": {"psr/log": "^3.0"}}"#);
    let tree = Resolver::new(&registry)
        .build_dependency_tree(&m, "psr/log")
        .unwrap();
    assert_eq!(tree, "Your project\n  └─ psr/log (^3.0)\n");
}

#[test]
fn transitive_path_uses_latest_stable_versions() {
    let registry = registry();
    let m = manifest(r#"{"require": {"php": ">=8.1", "acme/app-kit": "^1.0"}}"#);
    let tree = Resolver::new(&registry)
        .build_dependency_tree(&m, "psr/log")
        .unwrap();
    assert_eq!(
        tree,
        "Your project\n  └─ acme/app-kit (1.0.0)\n      └─ acme/http (2.0.0)\n          └─ psr/log (^3.0)\n"
    );
}

#[test]
fn missing_target_is_an_error() {
    let registry = registry();
    let m = manifest(r#"{"require": {"acme/loop-a": "^1.0", "acme/unknown": "^1.0"}}"#);
    let err = Resolver::new(&registry)
        .build_dependency_tree(&m, "acme/nowhere")
        .unwrap_err();
    assert!(matches!(err, ResolveError::NotInTree { .. }));
    assert_eq!(
        err.to_string(),
        "package acme/nowhere not found in dependency tree"
    );
}

#[test]
fn check_conflicts_reports_platform_requirements() {
    let registry = FakeRegistry::new().add(
        "acme/lib",
        "2.0.0",
        &[
            ("php", ">=8.1"),
            ("ext-json", "*"),
            ("ext-mbstring", "*"),
            ("psr/log", "^3.0"),
        ],
    );
    let m = manifest(r#"{"require": {"php": ">=7.4", "psr/log": "^1.0"}}"#);
    let notes = Resolver::new(&registry)
        .check_conflicts(&m, "acme/lib", "2.0.0")
        .unwrap();
    assert_eq!(
        notes,
        [
            "Requires PHP >=8.1 (check your version)",
            "Requires PHP extension: ext-json",
            "Requires PHP extension: ext-mbstring",
        ]
    );
}

#[test]
fn check_conflicts_unknown_version() {
    let registry = FakeRegistry::new().add("acme/lib", "2.0.0", &[]);
    let m = manifest("{}");
    let err = Resolver::new(&registry)
        .check_conflicts(&m, "acme/lib", "9.9.9")
        .unwrap_err();
    assert!(matches!(err, ResolveError::Registry { .. }));
}
