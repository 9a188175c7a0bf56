//! Composer-style version constraints.
//!
//! A constraint is a disjunction of alternatives separated by `||` (or a
//! single `|`). Each alternative is a conjunction of comparators separated
//! by `,` or written back to back (`>=1.0 <2.0`). Comparators use the usual
//! operators (`^`, `~`, `>=`, `>`, `<=`, `<`, `=`, `==`, `!=`); a bare
//! version is an exact match, `*`/`x` segments are wildcards, and Composer
//! stability flags (`@dev`) are ignored. Hyphen ranges (`1.0 - 2.0`) are
//! rewritten to a pair of comparators before whitespace is stripped.
//!
//! Range semantics (tilde, caret, prerelease exclusion) are those of the
//! [`semver`] crate.

use semver::{Comparator, Version, VersionReq};
use std::fmt;

use pakt_registry::version::{coerce, is_dev};

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '^', '~'];
const OPERATORS: [&str; 9] = [">=", "<=", "!=", "==", ">", "<", "=", "^", "~"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version constraint '{constraint}': {reason}")]
pub struct ConstraintError {
    pub constraint: String,
    pub reason: String,
}

/// A parsed version constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone)]
struct Alternative {
    req: VersionReq,
    excluded: Vec<Version>,
}

impl Alternative {
    fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.contains(version)
    }
}

impl Constraint {
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let normalized = normalize_constraint(input);
        let err = |reason: String| ConstraintError {
            constraint: input.trim().to_string(),
            reason,
        };
        if normalized.is_empty() {
            return Err(err("empty constraint".to_string()));
        }

        let mut alternatives = Vec::new();
        for alt in normalized.split('|').filter(|a| !a.is_empty()) {
            alternatives.push(parse_alternative(alt).map_err(&err)?);
        }
        if alternatives.is_empty() {
            return Err(err("no alternatives".to_string()));
        }
        Ok(Self {
            source: normalized,
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|a| a.matches(version))
    }

    /// Match a raw registry version string. Strings that do not parse as a
    /// version never match.
    pub fn matches_str(&self, version: &str) -> bool {
        coerce(&normalize_version(version)).is_some_and(|v| self.matches(&v))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_alternative(alt: &str) -> Result<Alternative, String> {
    let mut req = VersionReq {
        comparators: Vec::new(),
    };
    let mut excluded = Vec::new();

    for term in alt.split(',').flat_map(split_at_operators) {
        let term = term.split('@').next().unwrap_or_default();
        if term.is_empty() || term == "*" || term.eq_ignore_ascii_case("x") {
            continue;
        }

        let (op, version) = OPERATORS
            .iter()
            .find_map(|op| term.strip_prefix(op).map(|rest| (*op, rest)))
            .unwrap_or(("", term));
        let version =
            comparator_version(version).ok_or_else(|| format!("bad version in '{term}'"))?;
        if version.is_empty() {
            continue;
        }

        if op == "!=" {
            let v = coerce(&version).ok_or_else(|| format!("bad version in '{term}'"))?;
            excluded.push(v);
            continue;
        }
        let op = match op {
            "" | "==" => "=",
            op => op,
        };
        let comparator =
            Comparator::parse(&format!("{op}{version}")).map_err(|e| format!("'{term}': {e}"))?;
        req.comparators.push(comparator);
    }

    Ok(Alternative { req, excluded })
}

/// `>=1.0<2.0` → `[">=1.0", "<2.0"]`.
fn split_at_operators(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_is_op = false;
    for (i, c) in s.char_indices() {
        let is_op = OPERATOR_CHARS.contains(&c);
        if is_op && !prev_is_op && i > start {
            parts.push(&s[start..i]);
            start = i;
        }
        prev_is_op = is_op;
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

/// Version operand of a comparator: drops a `v` prefix and trailing
/// wildcard segments, lowercases stability suffixes and pads the numeric
/// part to three components when a suffix is present. Returns an empty
/// string for a pure wildcard.
fn comparator_version(raw: &str) -> Option<String> {
    let v = raw.strip_prefix('v').unwrap_or(raw);

    let split = v
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '*' || c == 'x' || c == 'X'))
        .unwrap_or(v.len());
    let (core, rest) = v.split_at(split);

    let mut parts: Vec<&str> = core.trim_end_matches('.').split('.').collect();
    if let Some(pos) = parts
        .iter()
        .position(|p| *p == "*" || p.eq_ignore_ascii_case("x"))
    {
        if !rest.is_empty() {
            return None;
        }
        parts.truncate(pos);
        return if parts.iter().all(|p| is_number(p)) {
            Some(parts.join("."))
        } else {
            None
        };
    }
    if parts.len() > 3 || !parts.iter().all(|p| is_number(p)) {
        return None;
    }
    if rest.is_empty() {
        return Some(parts.join("."));
    }

    while parts.len() < 3 {
        parts.push("0");
    }
    let suffix = rest.trim_start_matches('-').to_ascii_lowercase();
    if suffix.starts_with('+') {
        return Some(format!("{}{suffix}", parts.join(".")));
    }
    Some(format!("{}-{suffix}", parts.join(".")))
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Trim and strip all internal whitespace. Hyphen ranges are expanded
/// first since their meaning depends on the spaces around the hyphen.
pub fn normalize_constraint(constraint: &str) -> String {
    let expanded = constraint
        .split("||")
        .map(expand_hyphen_range)
        .collect::<Vec<_>>()
        .join("||");
    expanded.chars().filter(|c| !c.is_whitespace()).collect()
}

fn expand_hyphen_range(alt: &str) -> String {
    let Some((low, high)) = alt.split_once(" - ") else {
        return alt.to_string();
    };
    let (low, high) = (low.trim(), high.trim());
    let numbers: Vec<&str> = high.split('.').collect();
    let upper = match numbers.as_slice() {
        [major] => major.parse::<u64>().ok().map(|m| format!("<{}.0.0", m + 1)),
        [major, minor] => minor
            .parse::<u64>()
            .ok()
            .map(|m| format!("<{major}.{}.0", m + 1)),
        _ => None,
    }
    .unwrap_or_else(|| format!("<={high}"));
    format!(">={low},{upper}")
}

/// `v1.2.3` → `1.2.3`, `1.0.0-dev` → `1.0.0-alpha`.
pub fn normalize_version(version: &str) -> String {
    let v = version.trim();
    let v = v.strip_prefix('v').unwrap_or(v);
    v.replace("-dev", "-alpha")
}

/// Greatest non-dev version in `versions` satisfying `constraint`.
///
/// A constraint that cannot be parsed falls back to
/// [`find_latest_stable`], so this only returns `None` when a valid
/// constraint excludes every candidate or there are no candidates at all.
pub fn find_matching_version<'a, I>(versions: I, constraint: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let versions: Vec<&str> = versions.into_iter().collect();
    let parsed = match Constraint::parse(constraint) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("{e}; falling back to latest stable");
            return find_latest_stable(versions);
        }
    };

    versions
        .into_iter()
        .filter(|v| !is_dev(v))
        .filter_map(|v| coerce(&normalize_version(v)).map(|ver| (ver, v)))
        .filter(|(ver, _)| parsed.matches(ver))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v.to_string())
}

/// Greatest parseable non-dev version; otherwise the first version given.
pub fn find_latest_stable<'a, I>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let versions: Vec<&str> = versions.into_iter().collect();
    versions
        .iter()
        .filter(|v| !is_dev(v))
        .filter_map(|v| coerce(&normalize_version(v)).map(|ver| (ver, *v)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v.to_string())
        .or_else(|| versions.first().map(|v| v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(constraint: &str, version: &str) -> bool {
        Constraint::parse(constraint).unwrap().matches_str(version)
    }

    #[test]
    fn normalize_constraint_strips_spaces() {
        assert_eq!(normalize_constraint("^1.0"), "^1.0");
        assert_eq!(normalize_constraint("^1.9 || ^2.4"), "^1.9||^2.4");
        assert_eq!(normalize_constraint("~1.2.3"), "~1.2.3");
        assert_eq!(
            normalize_constraint("^1.0  ||  ^2.0  ||  ^3.0"),
            "^1.0||^2.0||^3.0"
        );
        assert_eq!(normalize_constraint("  >=1.0 <2.0 "), ">=1.0<2.0");
    }

    #[test]
    fn normalize_constraint_expands_hyphen_ranges() {
        assert_eq!(normalize_constraint("1.0 - 2.0"), ">=1.0,<2.1.0");
        assert_eq!(normalize_constraint("1.0.0 - 2.3.4"), ">=1.0.0,<=2.3.4");
        assert_eq!(normalize_constraint("1 - 2 || ^4.0"), ">=1,<3.0.0||^4.0");
    }

    #[test]
    fn normalize_version_variants() {
        assert_eq!(normalize_version("v1.2.3"), "1.2.3");
        assert_eq!(normalize_version("1.0.0-dev"), "1.0.0-alpha");
        assert_eq!(normalize_version("2.3.4"), "2.3.4");
    }

    #[test]
    fn caret_and_tilde() {
        assert!(matches("^1.2", "1.9.0"));
        assert!(!matches("^1.2", "2.0.0"));
        assert!(!matches("^1.2", "1.1.9"));
        assert!(matches("~1.2.3", "1.2.9"));
        assert!(!matches("~1.2.3", "1.3.0"));
        assert!(matches("^0.3", "0.3.5"));
        assert!(!matches("^0.3", "0.4.0"));
    }

    #[test]
    fn alternatives() {
        assert!(matches("^1.9 || ^2.4", "1.9.1"));
        assert!(matches("^1.9 || ^2.4", "2.5.0"));
        assert!(!matches("^1.9 || ^2.4", "2.3.0"));
        assert!(matches("^1.0|^3.0", "3.1.0"));
    }

    #[test]
    fn conjunctions() {
        assert!(matches(">=1.0 <2.0", "1.5.0"));
        assert!(!matches(">=1.0 <2.0", "2.0.0"));
        assert!(matches(">=1.0,<2.0", "1.0.0"));
        assert!(!matches(">=1.0, !=1.2.0", "1.2.0"));
        assert!(matches(">=1.0, !=1.2.0", "1.2.1"));
    }

    #[test]
    fn bare_versions_are_exact() {
        assert!(matches("1.2.3", "1.2.3"));
        assert!(matches("v1.2.3", "1.2.3"));
        assert!(!matches("1.2.3", "1.2.4"));
        assert!(matches("==2.0.0", "v2.0.0"));
    }

    #[test]
    fn wildcards() {
        assert!(matches("*", "5.4.3"));
        assert!(matches("1.2.*", "1.2.7"));
        assert!(!matches("1.2.*", "1.3.0"));
        assert!(matches("2.x", "2.9.0"));
        assert!(!matches("2.x", "3.0.0"));
    }

    #[test]
    fn stability_flags_are_ignored() {
        assert!(matches("^1.0@dev", "1.4.0"));
        assert!(matches("^2.0@stable", "2.0.0"));
    }

    #[test]
    fn prereleases_need_an_explicit_prerelease_bound() {
        assert!(!matches("^3.0", "3.1.0-beta1"));
        assert!(matches(">=3.1.0-beta1", "3.1.0-beta2"));
        assert!(matches(">=3.1-beta", "3.1.0-rc1"));
    }

    #[test]
    fn invalid_constraints() {
        assert!(Constraint::parse("").is_err());
        assert!(Constraint::parse("dev-main").is_err());
        assert!(Constraint::parse("^banana").is_err());
        assert!(Constraint::parse("||").is_err());
    }

    #[test]
    fn matches_str_rejects_unparseable_versions() {
        let c = Constraint::parse("*").unwrap();
        assert!(!c.matches_str("dev-main"));
        assert!(!c.matches_str("1.2.3.4"));
    }

    #[test]
    fn display_is_normalized_source() {
        let c = Constraint::parse(" ^1.0 ||  ^2.0").unwrap();
        assert_eq!(c.to_string(), "^1.0||^2.0");
    }

    #[test]
    fn find_matching_picks_greatest_satisfying() {
        let versions = ["1.0.0", "1.5.0", "2.0.0", "1.9.9", "dev-main", "1.x-dev"];
        assert_eq!(
            find_matching_version(versions, "^1.0").as_deref(),
            Some("1.9.9")
        );
        assert_eq!(
            find_matching_version(versions, "^2.0").as_deref(),
            Some("2.0.0")
        );
        assert_eq!(find_matching_version(versions, "^3.0"), None);
    }

    #[test]
    fn find_matching_keeps_original_spelling() {
        let versions = ["v1.0.0", "v1.1.0"];
        assert_eq!(
            find_matching_version(versions, "^1.0").as_deref(),
            Some("v1.1.0")
        );
    }

    #[test]
    fn find_matching_skips_unparseable_candidates() {
        let versions = ["1.0.0.1", "banana", "1.0.0"];
        assert_eq!(
            find_matching_version(versions, ">=1.0").as_deref(),
            Some("1.0.0")
        );
    }

    #[test]
    fn malformed_constraint_falls_back_to_latest_stable() {
        let versions = ["1.0.0", "2.1.0", "dev-main"];
        assert_eq!(
            find_matching_version(versions, "dev-main as 2.0").as_deref(),
            Some("2.1.0")
        );
    }

    #[test]
    fn latest_stable_prefers_release_versions() {
        assert_eq!(
            find_latest_stable(["1.0.0", "3.0.0", "2.0.0", "4.x-dev"]).as_deref(),
            Some("3.0.0")
        );
        assert_eq!(
            find_latest_stable(["dev-main", "dev-feature"]).as_deref(),
            Some("dev-main")
        );
        assert_eq!(find_latest_stable(Vec::<&str>::new()), None);
    }
}
