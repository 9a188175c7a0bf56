//! Platform and virtual package classification.

/// True for names that are never installed: the PHP runtime (`php`,
/// `php-64bit`, ...), extensions (`ext-*`), system libraries (`lib-*`),
/// Composer's own API markers, and virtual `*-implementation` packages.
///
/// Any other `vendor/name` is a real package, even `vendor/php-extra`.
pub fn is_platform_package(name: &str) -> bool {
    if name == "composer-plugin-api" || name == "composer-runtime-api" {
        return true;
    }
    if name.contains('/') {
        return name.ends_with("-implementation");
    }
    name == "php" || name.starts_with("php-") || name.starts_with("ext-") || name.starts_with("lib-")
}
