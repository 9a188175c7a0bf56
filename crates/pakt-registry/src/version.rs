//! Lenient parsing of Packagist version strings into [`semver::Version`].

use semver::Version;

/// True for branch-like versions (`dev-main`, `2.x-dev`).
pub fn is_dev(version: &str) -> bool {
    version.contains("dev")
}

/// Parse a registry version string, accepting a leading `v`, one or two
/// part versions (`1`, `1.2`) and Composer stability suffixes without a
/// hyphen (`1.0.0beta1`). Versions with more than three numeric parts are
/// rejected.
pub fn coerce(version: &str) -> Option<Version> {
    let v = version.trim();
    let v = v
        .strip_prefix('v')
        .or_else(|| v.strip_prefix('V'))
        .unwrap_or(v);

    let split = v
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(v.len());
    let (core, rest) = v.split_at(split);
    let core = core.trim_end_matches('.');
    if core.is_empty() {
        return None;
    }

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let mut numbers = parts.clone();
    while numbers.len() < 3 {
        numbers.push("0");
    }

    let suffix = match rest.chars().next() {
        None => String::new(),
        Some('-') | Some('+') => rest.to_ascii_lowercase(),
        Some(_) => format!("-{}", rest.to_ascii_lowercase()),
    };
    Version::parse(&format!("{}{suffix}", numbers.join("."))).ok()
}

/// Greatest non-dev, non-prerelease version. Falls back to any non-dev
/// version, then to any version at all, so it never fails when `versions`
/// is non-empty.
pub fn latest_stable<'a, I>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let all: Vec<&str> = versions.into_iter().collect();
    let best = all
        .iter()
        .filter(|v| !is_dev(v))
        .filter_map(|v| coerce(v).map(|parsed| (parsed, *v)))
        .filter(|(parsed, _)| parsed.pre.is_empty())
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v.to_string());

    best.or_else(|| all.iter().find(|v| !is_dev(v)).map(|v| v.to_string()))
        .or_else(|| all.first().map(|v| v.to_string()))
}
