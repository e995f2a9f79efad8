use std::fmt;

use semver::Version;

use crate::specifier::operator::RangeOperator;
use crate::specifier::parser::parse_specifier;
use crate::specifier::range::VersionRange;

/// A parsed dependency version specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    /// `1.2.3`
    Exact { raw: String, version: Version },
    /// `^1.2.3`, `1.x`, `>=1.0.0 <2.0.0`, ...
    Range(SemverRange),
    /// `workspace:*`, `workspace:^1.0.0`
    WorkspaceProtocol(String),
    /// `npm:other-package@1.0.0`
    Alias(String),
    /// `file:../lib`, `link:../lib`, `./lib`
    File(String),
    /// `git+ssh://...`, `github:user/repo`, `user/repo`, `https://...`
    GitOrUrl(String),
    /// Dist-tags such as `latest` or `next`
    Tag(String),
    /// Anything else; never equal to any other specifier
    Unparsable(String),
}

/// A semver range specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemverRange {
    pub raw: String,
    pub shape: RangeShape,
    /// Version used to order this range against others
    pub anchor: Version,
    pub range: VersionRange,
}

/// How a semver range is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeShape {
    /// A single operator applied to a full version (`^1.2.3`), or `*`
    Simple(RangeOperator),
    /// A partial version, optionally with an operator (`1.x`, `^1.2`)
    Partial,
    /// Hyphen ranges, comparator sets and unions
    Complex,
}

impl Specifier {
    pub fn parse(raw: &str) -> Self {
        parse_specifier(raw)
    }

    /// The specifier exactly as written in the manifest
    pub fn raw(&self) -> &str {
        match self {
            Specifier::Exact { raw, .. } => raw,
            Specifier::Range(range) => &range.raw,
            Specifier::WorkspaceProtocol(raw)
            | Specifier::Alias(raw)
            | Specifier::File(raw)
            | Specifier::GitOrUrl(raw)
            | Specifier::Tag(raw)
            | Specifier::Unparsable(raw) => raw,
        }
    }

    /// Stable name of the specifier kind, used by `specifierTypes` selectors
    pub fn type_name(&self) -> &'static str {
        match self {
            Specifier::Exact { .. } => "exact",
            Specifier::Range(_) => "range",
            Specifier::WorkspaceProtocol(_) => "workspace-protocol",
            Specifier::Alias(_) => "alias",
            Specifier::File(_) => "file",
            Specifier::GitOrUrl(_) => "git-or-url",
            Specifier::Tag(_) => "tag",
            Specifier::Unparsable(_) => "unparsable",
        }
    }

    pub const TYPE_NAMES: [&'static str; 8] = [
        "exact",
        "range",
        "workspace-protocol",
        "alias",
        "file",
        "git-or-url",
        "tag",
        "unparsable",
    ];

    /// Exact versions and semver ranges are comparable; everything else is opaque
    pub fn is_semver(&self) -> bool {
        matches!(self, Specifier::Exact { .. } | Specifier::Range(_))
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Specifier::Exact { .. })
    }

    pub fn is_unparsable(&self) -> bool {
        matches!(self, Specifier::Unparsable(_))
    }

    /// Version used to order semver specifiers
    pub fn anchor(&self) -> Option<&Version> {
        match self {
            Specifier::Exact { version, .. } => Some(version),
            Specifier::Range(range) => Some(&range.anchor),
            _ => None,
        }
    }

    /// The operator when the specifier is a single operator on a full version
    pub fn operator(&self) -> Option<RangeOperator> {
        match self {
            Specifier::Exact { .. } => Some(RangeOperator::Exact),
            Specifier::Range(SemverRange {
                shape: RangeShape::Simple(operator),
                ..
            }) => Some(*operator),
            _ => None,
        }
    }

    /// The set of versions this specifier accepts
    pub fn version_range(&self) -> Option<VersionRange> {
        match self {
            Specifier::Exact { version, .. } => Some(VersionRange::exact(version.clone())),
            Specifier::Range(range) => Some(range.range.clone()),
            _ => None,
        }
    }

    /// Rewrite the specifier with another operator, keeping its version.
    ///
    /// Only exact versions and simple ranges on a full version can be
    /// rewritten; `*`, partial and complex ranges return None.
    pub fn with_operator(&self, operator: RangeOperator) -> Option<Specifier> {
        let version = match self {
            Specifier::Exact { version, .. } => version,
            Specifier::Range(SemverRange {
                shape: RangeShape::Simple(current),
                anchor,
                ..
            }) if *current != RangeOperator::Any => anchor,
            _ => return None,
        };
        Some(Specifier::parse(&operator.apply(version)))
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", RangeOperator::Caret, Some("^1.2.3"))]
    #[case("^1.2.3", RangeOperator::Tilde, Some("~1.2.3"))]
    #[case(">=1.2.3", RangeOperator::Exact, Some("1.2.3"))]
    #[case("~1.2.3", RangeOperator::Any, Some("*"))]
    #[case("*", RangeOperator::Caret, None)]
    #[case("1.x", RangeOperator::Caret, None)]
    #[case(">=1.0.0 <2.0.0", RangeOperator::Caret, None)]
    #[case("workspace:*", RangeOperator::Caret, None)]
    fn with_operator(
        #[case] raw: &str,
        #[case] operator: RangeOperator,
        #[case] expected: Option<&str>,
    ) {
        let rewritten = Specifier::parse(raw).with_operator(operator);
        assert_eq!(rewritten.as_ref().map(Specifier::raw), expected);
    }

    #[rstest]
    #[case("1.2.3", Some(RangeOperator::Exact))]
    #[case("^1.2.3", Some(RangeOperator::Caret))]
    #[case("*", Some(RangeOperator::Any))]
    #[case("^1.2", None)]
    #[case("latest", None)]
    fn operator(#[case] raw: &str, #[case] expected: Option<RangeOperator>) {
        assert_eq!(Specifier::parse(raw).operator(), expected);
    }

    #[test]
    fn version_range_of_exact_contains_only_itself() {
        let range = Specifier::parse("1.2.3").version_range().unwrap();
        assert!(range.satisfies(&Version::new(1, 2, 3)));
        assert!(!range.satisfies(&Version::new(1, 2, 4)));
    }

    #[test]
    fn opaque_specifiers_have_no_anchor() {
        assert_eq!(Specifier::parse("workspace:^").anchor(), None);
        assert_eq!(Specifier::parse("workspace:^").version_range(), None);
    }
}
