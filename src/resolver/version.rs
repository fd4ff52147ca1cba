//! Version constraints and tag selection.
//!
//! Constraints are comma-separated comparators, with `||` between
//! alternatives:
//!
//! - `=`, `!=`, `>`, `>=`, `<`, `<=` compare against a version padded with
//!   zeros (`>= 1.2` is `>= 1.2.0`)
//! - `~>` is pessimistic: `~> 1.2` allows `>= 1.2.0, < 2.0.0`, and
//!   `~> 1.2.3` allows `>= 1.2.3, < 1.3.0`
//! - `^` and `~` follow Cargo's rules
//! - `x` and `*` are wildcards (`1.x`, `1.2.*`)
//! - a bare version is an exact match

use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};

use crate::resolver::errors::ConstraintError;

/// A parsed constraint expression.
#[derive(Debug, Clone)]
pub struct Constraint {
    raw: String,
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
    /// Whether a version satisfies any alternative.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(version))
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(ConstraintError::new(s, "empty constraint"));
        }

        let alternatives = raw
            .split("||")
            .map(|alt| parse_alternative(raw, alt))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Constraint {
            raw: raw.to_string(),
            alternatives,
        })
    }
}

const OPERATORS: [&str; 9] = ["~>", ">=", "<=", "!=", ">", "<", "=", "^", "~"];

fn parse_alternative(raw: &str, alt: &str) -> Result<Alternative, ConstraintError> {
    let mut comparators = Vec::new();
    let mut excluded = Vec::new();

    for term in alt.split(',') {
        let term = term.trim();
        if term.is_empty() {
            return Err(ConstraintError::new(raw, "empty comparator"));
        }

        let op = OPERATORS
            .iter()
            .find(|op| term.starts_with(**op))
            .copied()
            .unwrap_or("");
        let text = term[op.len()..].trim();
        if text.is_empty() {
            return Err(ConstraintError::new(raw, format!("`{}` has no version", term)));
        }
        let text = text.strip_prefix('v').unwrap_or(text);

        match op {
            "^" | "~" => comparators.push(format!("{}{}", op, text)),
            "!=" => {
                let version = parse_partial(raw, text)?;
                if version.wildcard {
                    return Err(ConstraintError::new(raw, "`!=` does not take wildcards"));
                }
                excluded.push(version.padded());
            }
            "~>" => {
                let version = parse_partial(raw, text)?;
                comparators.extend(pessimistic(raw, &version)?);
            }
            "" | "=" => {
                let version = parse_partial(raw, text)?;
                comparators.extend(exact(raw, &version)?);
            }
            _ => {
                let version = parse_partial(raw, text)?;
                comparators.push(format!("{}{}", op, version.padded()));
            }
        }
    }

    let req = if comparators.is_empty() {
        VersionReq::STAR
    } else {
        VersionReq::parse(&comparators.join(", "))
            .map_err(|e| ConstraintError::new(raw, e.to_string()))?
    };

    Ok(Alternative { req, excluded })
}

/// A version with possibly missing or wildcarded components.
#[derive(Debug)]
struct PartialVersion {
    numbers: Vec<u64>,
    wildcard: bool,
    full: Option<Version>,
}

impl PartialVersion {
    fn padded(&self) -> Version {
        if let Some(full) = &self.full {
            return full.clone();
        }
        let get = |i: usize| self.numbers.get(i).copied().unwrap_or(0);
        Version::new(get(0), get(1), get(2))
    }
}

fn parse_partial(raw: &str, text: &str) -> Result<PartialVersion, ConstraintError> {
    if let Ok(full) = Version::parse(text) {
        return Ok(PartialVersion {
            numbers: vec![full.major, full.minor, full.patch],
            wildcard: false,
            full: Some(full),
        });
    }

    let mut numbers = Vec::new();
    let mut wildcard = false;
    for segment in text.split('.') {
        if matches!(segment, "x" | "X" | "*") {
            wildcard = true;
            break;
        }
        let n = segment
            .parse()
            .map_err(|_| ConstraintError::new(raw, format!("`{}` is not a version", text)))?;
        numbers.push(n);
    }

    if numbers.len() > 3 {
        return Err(ConstraintError::new(raw, format!("`{}` has too many components", text)));
    }

    Ok(PartialVersion {
        numbers,
        wildcard,
        full: None,
    })
}

fn pessimistic(raw: &str, version: &PartialVersion) -> Result<Vec<String>, ConstraintError> {
    let lower = version.padded();
    let upper = match version.numbers.len() {
        0 => return Ok(Vec::new()),
        1 | 2 => bump_major(raw, &lower)?,
        _ => bump_minor(raw, &lower)?,
    };
    Ok(vec![format!(">={}", lower), format!("<{}", upper)])
}

fn exact(raw: &str, version: &PartialVersion) -> Result<Vec<String>, ConstraintError> {
    if !version.wildcard {
        return Ok(vec![format!("={}", version.padded())]);
    }

    let lower = version.padded();
    let upper = match version.numbers.len() {
        0 => return Ok(Vec::new()),
        1 => bump_major(raw, &lower)?,
        _ => bump_minor(raw, &lower)?,
    };
    Ok(vec![format!(">={}", lower), format!("<{}", upper)])
}

fn bump_major(raw: &str, v: &Version) -> Result<Version, ConstraintError> {
    v.major
        .checked_add(1)
        .map(|major| Version::new(major, 0, 0))
        .ok_or_else(|| ConstraintError::new(raw, format!("major version {} is too large", v.major)))
}

fn bump_minor(raw: &str, v: &Version) -> Result<Version, ConstraintError> {
    v.minor
        .checked_add(1)
        .map(|minor| Version::new(v.major, minor, 0))
        .ok_or_else(|| ConstraintError::new(raw, format!("minor version {} is too large", v.minor)))
}

/// Parse a tag as a version, ignoring a leading `v`.
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    let text = tag.strip_prefix('v').unwrap_or(tag);
    parse_version_lenient(text)
}

/// Parse a version string, allowing for incomplete versions.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}

/// Pick the highest tag satisfying a constraint. Unparsable tags are skipped.
pub fn select_tag<'a>(constraint: &Constraint, tags: &'a [String]) -> Option<&'a str> {
    let mut versions: Vec<(Version, &str)> = tags
        .iter()
        .filter_map(|tag| parse_tag_version(tag).map(|v| (v, tag.as_str())))
        .collect();
    versions.sort_by(|a, b| a.0.cmp(&b.0));

    versions
        .into_iter()
        .rev()
        .find(|(version, _)| constraint.matches(version))
        .map(|(_, tag)| tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Constraint {
        s.parse().unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pessimistic() {
        let minor = c("~> 1.2");
        assert!(minor.matches(&v("1.2.0")));
        assert!(minor.matches(&v("1.9.3")));
        assert!(!minor.matches(&v("2.0.0")));
        assert!(!minor.matches(&v("1.1.9")));

        let patch = c("~> 1.2.3");
        assert!(patch.matches(&v("1.2.9")));
        assert!(!patch.matches(&v("1.3.0")));

        let wildcard = c("~> 1.x");
        assert!(wildcard.matches(&v("1.0.0")));
        assert!(wildcard.matches(&v("1.1.0")));
        assert!(!wildcard.matches(&v("2.0.0")));
    }

    #[test]
    fn test_comparison_operators() {
        let range = c(">= 1.0, < 2.0");
        assert!(range.matches(&v("1.0.0")));
        assert!(range.matches(&v("1.5.0")));
        assert!(!range.matches(&v("2.0.0")));

        assert!(c("> 1.2").matches(&v("1.2.1")));
        assert!(!c("> 1.2").matches(&v("1.2.0")));
        assert!(c("<= 1.2").matches(&v("1.2.0")));
        assert!(!c("<= 1.2").matches(&v("1.2.1")));
    }

    #[test]
    fn test_exact_and_excluded() {
        assert!(c("1.2.0").matches(&v("1.2.0")));
        assert!(!c("1.2.0").matches(&v("1.2.1")));
        assert!(c("= v1.2").matches(&v("1.2.0")));
        assert!(c("1.2.x").matches(&v("1.2.7")));
        assert!(!c("1.2.x").matches(&v("1.3.0")));

        let not = c(">= 1.0, != 1.1.0");
        assert!(not.matches(&v("1.0.0")));
        assert!(!not.matches(&v("1.1.0")));
        assert!(not.matches(&v("1.2.0")));
    }

    #[test]
    fn test_caret_and_tilde() {
        assert!(c("^1.2").matches(&v("1.9.0")));
        assert!(!c("^1.2").matches(&v("2.0.0")));
        assert!(c("~1.2.3").matches(&v("1.2.9")));
        assert!(!c("~1.2.3").matches(&v("1.3.0")));
    }

    #[test]
    fn test_alternatives() {
        let either = c("1.x || >= 3.0");
        assert!(either.matches(&v("1.4.0")));
        assert!(!either.matches(&v("2.0.0")));
        assert!(either.matches(&v("3.1.0")));
    }

    #[test]
    fn test_invalid_constraints() {
        assert!("".parse::<Constraint>().is_err());
        assert!("master".parse::<Constraint>().is_err());
        assert!(">= ".parse::<Constraint>().is_err());
        assert!("1.2.3.4".parse::<Constraint>().is_err());
        assert!(">= 1.0,".parse::<Constraint>().is_err());

        let err = "feature/x".parse::<Constraint>().unwrap_err();
        assert_eq!(err.constraint, "feature/x");
    }

    #[test]
    fn test_upper_bound_overflow_is_an_error() {
        let max = u64::MAX;
        for raw in [
            format!("~> {}", max),
            format!("~> 1.{}.0", max),
            format!("{}.x", max),
            format!("1.{}.x", max),
        ] {
            let err = raw.parse::<Constraint>().unwrap_err();
            assert!(err.reason.contains("too large"), "{}: {}", raw, err);
        }
    }

    #[test]
    fn test_parse_tag_version() {
        assert_eq!(parse_tag_version("v1.2.0"), Some(v("1.2.0")));
        assert_eq!(parse_tag_version("1.2"), Some(v("1.2.0")));
        assert_eq!(parse_tag_version("v2"), Some(v("2.0.0")));
        assert_eq!(parse_tag_version("release-candidate"), None);
    }

    #[test]
    fn test_select_highest_matching_tag() {
        let available = tags(&["v1.0.0", "v2.0.0", "v1.1.0", "junk", "v1.0.5"]);

        assert_eq!(select_tag(&c("~> 1.x"), &available), Some("v1.1.0"));
        assert_eq!(select_tag(&c(">= 1.0"), &available), Some("v2.0.0"));
        assert_eq!(select_tag(&c("< 1.1"), &available), Some("v1.0.5"));
        assert_eq!(select_tag(&c("~> 3.0"), &available), None);
        assert_eq!(select_tag(&c("~> 1.0"), &[]), None);
    }
}
