//! Operator-supplied acceptable version ranges.
//!
//! A constraint is a comma-separated list of comparators that must all match:
//!
//! ```
//! use dzsync_core::{ParsedVersion, VersionConstraint};
//!
//! let constraint = VersionConstraint::parse(">= 0.6.9, < 0.7.2").unwrap();
//! assert!(constraint.satisfied_by(&ParsedVersion::parse("0.7.1").unwrap()));
//! assert!(!constraint.satisfied_by(&ParsedVersion::parse("0.7.2").unwrap()));
//! ```
//!
//! Comparison is always on the `major.minor.patch` core, so `0.7.1-1`
//! satisfies `= 0.7.1`.

use std::fmt;

use crate::error::CoreError;
use crate::version::ParsedVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
    Ne,
    /// `~>`: at least `version`, below the next release of its second-to-last
    /// segment.
    Pessimistic,
}

#[derive(Debug, Clone)]
struct Comparator {
    op: CompareOp,
    version: ParsedVersion,
    /// Exclusive upper bound, set for [`CompareOp::Pessimistic`] only.
    ceiling: Option<ParsedVersion>,
}

impl Comparator {
    fn matches(&self, candidate: &ParsedVersion) -> bool {
        match self.op {
            CompareOp::Gte => candidate >= &self.version,
            CompareOp::Gt => candidate > &self.version,
            CompareOp::Lte => candidate <= &self.version,
            CompareOp::Lt => candidate < &self.version,
            CompareOp::Eq => candidate == &self.version,
            CompareOp::Ne => candidate != &self.version,
            CompareOp::Pessimistic => {
                candidate >= &self.version
                    && self.ceiling.as_ref().map_or(true, |ceiling| candidate < ceiling)
            }
        }
    }
}

/// A parsed, immutable version range.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    comparators: Vec<Comparator>,
    raw: String,
}

impl VersionConstraint {
    /// Parse `>=`, `>`, `<=`, `<`, `=`, `==`, `!=` and `~>` comparators. A
    /// bare version means `=`.
    ///
    /// `~> 0.7.2` allows `>= 0.7.2, < 0.8.0`; `~> 0.7` allows
    /// `>= 0.7.0, < 1.0.0`.
    pub fn parse(constraint: &str) -> Result<Self, CoreError> {
        let raw = constraint.trim().to_string();
        let mut comparators = Vec::new();

        for part in raw.split(',').map(str::trim) {
            if part.is_empty() {
                return Err(CoreError::ConstraintParse {
                    constraint: raw.clone(),
                    reason: "empty comparator".to_string(),
                });
            }
            comparators.push(parse_comparator(&raw, part)?);
        }

        Ok(Self { comparators, raw })
    }

    /// Whether every comparator accepts the core of `version`.
    pub fn satisfied_by(&self, version: &ParsedVersion) -> bool {
        let core = version.core();
        self.comparators.iter().all(|c| c.matches(&core))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_comparator(raw: &str, part: &str) -> Result<Comparator, CoreError> {
    let invalid = || CoreError::ConstraintParse {
        constraint: raw.to_string(),
        reason: format!("invalid version in comparator '{part}'"),
    };

    if let Some(rest) = part.strip_prefix("~>") {
        return parse_pessimistic(rest.trim()).ok_or_else(invalid);
    }

    let (op, rest) = if let Some(rest) = part.strip_prefix(">=") {
        (CompareOp::Gte, rest)
    } else if let Some(rest) = part.strip_prefix("<=") {
        (CompareOp::Lte, rest)
    } else if let Some(rest) = part.strip_prefix("!=") {
        (CompareOp::Ne, rest)
    } else if let Some(rest) = part.strip_prefix("==") {
        (CompareOp::Eq, rest)
    } else if let Some(rest) = part.strip_prefix('=') {
        (CompareOp::Eq, rest)
    } else if let Some(rest) = part.strip_prefix('>') {
        (CompareOp::Gt, rest)
    } else if let Some(rest) = part.strip_prefix('<') {
        (CompareOp::Lt, rest)
    } else {
        (CompareOp::Eq, part)
    };

    let version = ParsedVersion::parse(rest.trim()).map_err(|_| invalid())?;

    Ok(Comparator {
        op,
        version,
        ceiling: None,
    })
}

/// `X.Y.Z` bumps the minor, `X.Y` bumps the major.
fn parse_pessimistic(text: &str) -> Option<Comparator> {
    let (version, ceiling) = match text.split('.').count() {
        2 => {
            let version = ParsedVersion::parse(&format!("{text}.0")).ok()?;
            let ceiling = ParsedVersion::new(version.major() + 1, 0, 0);
            (version, ceiling)
        }
        3 => {
            let version = ParsedVersion::parse(text).ok()?;
            let ceiling = ParsedVersion::new(version.major(), version.minor() + 1, 0);
            (version, ceiling)
        }
        _ => return None,
    };
    Some(Comparator {
        op: CompareOp::Pessimistic,
        version,
        ceiling: Some(ceiling),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn v(s: &str) -> ParsedVersion {
        ParsedVersion::parse(s).unwrap()
    }

    #[test]
    fn half_open_range_accepts_inside_and_rejects_upper_bound() {
        let c = VersionConstraint::parse(">=0.6.9, <0.7.2").unwrap();
        assert!(c.satisfied_by(&v("0.7.1")));
        assert!(c.satisfied_by(&v("0.6.9")));
        assert!(!c.satisfied_by(&v("0.7.2")));
        assert!(!c.satisfied_by(&v("0.6.8")));
    }

    #[rstest]
    #[case("0.7.1", "0.7.1-3", true)]
    #[case("= 0.7.1", "0.7.2", false)]
    #[case("== 0.7.1", "0.7.1", true)]
    #[case("!= 0.7.1", "0.7.1", false)]
    #[case("!= 0.7.1", "0.7.0", true)]
    #[case("> 0.7.1", "0.7.1", false)]
    #[case("<= 0.7.1", "0.7.1", true)]
    fn single_comparators(#[case] constraint: &str, #[case] target: &str, #[case] ok: bool) {
        let c = VersionConstraint::parse(constraint).unwrap();
        assert_eq!(c.satisfied_by(&v(target)), ok, "{constraint} vs {target}");
    }

    #[rstest]
    #[case("")]
    #[case(">=0.6.9,")]
    #[case(">= banana")]
    #[case("~> 1")]
    #[case("~> 0.7.x")]
    fn malformed_constraints_are_rejected(#[case] constraint: &str) {
        let err = VersionConstraint::parse(constraint).unwrap_err();
        assert!(matches!(err, CoreError::ConstraintParse { .. }), "got {err}");
    }

    #[rstest]
    #[case("~> 0.7.0", "0.7.0", true)]
    #[case("~> 0.7.0", "0.7.9", true)]
    #[case("~> 0.7.0", "0.8.0", false)]
    #[case("~> 0.7.2", "0.7.1", false)]
    #[case("~>0.7", "0.9.4", true)]
    #[case("~> 0.7", "1.0.0", false)]
    #[case("~> 0.7.0, != 0.7.3", "0.7.3", false)]
    fn pessimistic_comparator(#[case] constraint: &str, #[case] target: &str, #[case] ok: bool) {
        let c = VersionConstraint::parse(constraint).unwrap();
        assert_eq!(c.satisfied_by(&v(target)), ok, "{constraint} vs {target}");
    }

    #[test]
    fn display_keeps_original_text() {
        let c = VersionConstraint::parse(" >= 0.6.9, < 0.8.0 ").unwrap();
        assert_eq!(c.to_string(), ">= 0.6.9, < 0.8.0");
    }
}
