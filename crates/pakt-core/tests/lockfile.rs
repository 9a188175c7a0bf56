use pakt_core::lockfile::{content_hash, ComposerLock, DistInfo, LockedPackage, SourceInfo};
use pakt_core::manifest::ComposerJson;

fn manifest() -> ComposerJson {
    ComposerJson::from_str(
        r#"{
            "name": "acme/app",
            "require": {"php": ">=8.1", "psr/log": "^3.0"},
            "require-dev": {"ext-xdebug": "*", "phpunit/phpunit": "^10.0"}
        }"#,
    )
    .unwrap()
}

fn locked(name: &str, version: &str) -> LockedPackage {
    LockedPackage {
        name: name.to_string(),
        version: version.to_string(),
        source: Some(SourceInfo {
            kind: "git".to_string(),
            url: format!("https://github.com/{name}.git"),
            reference: Some("abc123".to_string()),
        }),
        dist: Some(DistInfo {
            kind: "zip".to_string(),
            url: format!("https://api.github.com/repos/{name}/zipball/abc123"),
            reference: Some("abc123".to_string()),
            shasum: None,
        }),
        require: Default::default(),
        package_type: Some("library".to_string()),
        autoload: None,
        description: None,
        other: Default::default(),
    }
}

#[test]
fn new_lock_records_hash_and_platform() {
    let m = manifest();
    let lock = ComposerLock::new(&m, vec![locked("psr/log", "3.0.0")], vec![]).unwrap();
    assert_eq!(lock.content_hash, content_hash(&m).unwrap());
    assert_eq!(lock.content_hash.len(), 32);
    assert_eq!(lock.platform.get("php").map(String::as_str), Some(">=8.1"));
    assert!(lock.platform_dev.contains_key("ext-xdebug"));
    assert!(!lock.platform.contains_key("psr/log"));
    assert_eq!(lock.minimum_stability, "stable");
    assert_eq!(lock.readme.len(), 3);
}

#[test]
fn freshness_follows_manifest_changes() {
    let mut m = manifest();
    let lock = ComposerLock::new(&m, vec![], vec![]).unwrap();
    assert!(lock.is_fresh(&m));

    m.description = Some("description is not hashed".to_string());
    assert!(lock.is_fresh(&m));

    m.add_requirement("monolog/monolog", "^3.0", false);
    assert!(!lock.is_fresh(&m));
}

#[test]
fn hash_ignores_key_order_in_file() {
    let a = ComposerJson::from_str(r#"{"name": "a/b", "require": {"x/y": "1.0", "p/q": "2.0"}}"#)
        .unwrap();
    let b = ComposerJson::from_str(r#"{"require": {"p/q": "2.0", "x/y": "1.0"}, "name": "a/b"}"#)
        .unwrap();
    assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
}

#[test]
fn write_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("composer.lock");
    let lock = ComposerLock::new(
        &manifest(),
        vec![locked("psr/log", "3.0.0")],
        vec![locked("phpunit/phpunit", "10.5.1")],
    )
    .unwrap();
    lock.write_to(&path).unwrap();

    let reread = ComposerLock::from_path(&path).unwrap();
    assert_eq!(reread, lock);
    assert!(reread.is_dev_package("phpunit/phpunit"));
    assert_eq!(reread.all_packages().count(), 2);
    assert_eq!(reread.find("psr/log").map(|p| p.version.as_str()), Some("3.0.0"));
}

#[test]
fn reads_composer_written_lock() {
    let content = r#"{
        "_readme": ["x"],
        "content-hash": "d41d8cd98f00b204e9800998ecf8427e",
        "packages": [{
            "name": "psr/container",
            "version": "2.0.2",
            "source": {"type": "git", "url": "https://github.com/php-fig/container.git", "reference": "c71ecc56"},
            "dist": {"type": "zip", "url": "https://api.github.com/repos/php-fig/container/zipball/c71ecc56", "reference": "c71ecc56", "shasum": ""},
            "require": {"php": ">=7.4.0"},
            "type": "library",
            "autoload": {"psr-4": {"Psr\\Container\\": "src/"}},
            "license": ["MIT"],
            "time": "2021-11-05T16:47:00+00:00"
        }],
        "packages-dev": [],
        "aliases": [],
        "minimum-stability": "stable",
        "stability-flags": [],
        "prefer-stable": false,
        "prefer-lowest": false,
        "platform": [],
        "platform-dev": [],
        "plugin-api-version": "2.6.0"
    }"#;
    let lock = ComposerLock::from_str(content).unwrap();
    let pkg = &lock.packages[0];
    assert_eq!(pkg.name, "psr/container");
    assert_eq!(pkg.require["php"], ">=7.4.0");
    assert!(pkg.other.contains_key("license"));
    assert!(lock.platform.is_empty());
    assert_eq!(
        pkg.download_url(),
        Some("https://api.github.com/repos/php-fig/container/zipball/c71ecc56")
    );
}

#[test]
fn download_url_falls_back_to_source() {
    let mut pkg = locked("acme/meta", "1.0.0");
    pkg.dist = None;
    assert_eq!(pkg.download_url(), Some("https://github.com/acme/meta.git"));
    pkg.source = None;
    assert_eq!(pkg.download_url(), None);
}

#[test]
fn malformed_lock_is_lockfile_error() {
    let err = ComposerLock::from_str("{ broken").unwrap_err();
    assert!(err.to_string().contains("Lockfile error"), "got: {err}");
}
