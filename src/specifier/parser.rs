//! Classification of raw specifier strings

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::specifier::operator::RangeOperator;
use crate::specifier::range::VersionRange;
use crate::specifier::semver::{PartialVersion, parse_version};
use crate::specifier::types::{RangeShape, SemverRange, Specifier};

static GIT_OR_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(git\+[a-z]+://|git://|git@|github:|gitlab:|bitbucket:|gist:|https?://)")
        .expect("valid git/url regex")
});

/// `user/repo` and `user/repo#ref` GitHub shorthands
static GITHUB_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][\w.-]*/[\w.-]+(#\S*)?$").expect("valid github shorthand regex")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9._-]*$").expect("valid tag regex"));

const FILE_PREFIXES: [&str; 6] = ["file:", "link:", "./", "../", "/", "~/"];

/// Parse a raw specifier into its tagged variant. Never fails: anything not
/// recognized becomes [`Specifier::Unparsable`].
pub fn parse_specifier(raw: &str) -> Specifier {
    let trimmed = raw.trim();
    let owned = || trimmed.to_string();

    if trimmed.is_empty() {
        return Specifier::Unparsable(raw.to_string());
    }
    if trimmed.starts_with("workspace:") {
        return Specifier::WorkspaceProtocol(owned());
    }
    if trimmed.starts_with("npm:") {
        return Specifier::Alias(owned());
    }
    if FILE_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        return Specifier::File(owned());
    }
    if GIT_OR_URL.is_match(trimmed) || GITHUB_SHORTHAND.is_match(trimmed) {
        return Specifier::GitOrUrl(owned());
    }
    if let Some(version) = parse_version(trimmed) {
        return Specifier::Exact {
            raw: owned(),
            version,
        };
    }
    if let Some(range) = parse_semver_range(trimmed) {
        return Specifier::Range(range);
    }
    if TAG.is_match(trimmed) {
        return Specifier::Tag(owned());
    }
    Specifier::Unparsable(owned())
}

fn parse_semver_range(raw: &str) -> Option<SemverRange> {
    let range = VersionRange::parse(raw)?;

    if raw == "*" || raw.eq_ignore_ascii_case("x") {
        return Some(SemverRange {
            raw: raw.to_string(),
            shape: RangeShape::Simple(RangeOperator::Any),
            // `*` accepts every version, so it orders above all of them
            anchor: Version::new(u64::MAX, u64::MAX, u64::MAX),
            range,
        });
    }

    let is_single_comparator =
        !raw.contains("||") && !raw.contains(" - ") && !raw.contains(char::is_whitespace);

    let (shape, anchor) = match single_comparator(raw).filter(|_| is_single_comparator) {
        Some((operator, version)) => match version.full() {
            Some(full) => (RangeShape::Simple(operator), full.clone()),
            None => (RangeShape::Partial, version.ceiling()),
        },
        None => (RangeShape::Complex, range.base_version()),
    };

    Some(SemverRange {
        raw: raw.to_string(),
        shape,
        anchor,
        range,
    })
}

fn single_comparator(raw: &str) -> Option<(RangeOperator, PartialVersion)> {
    for operator in [
        RangeOperator::Gte,
        RangeOperator::Lte,
        RangeOperator::Gt,
        RangeOperator::Lt,
        RangeOperator::Caret,
        RangeOperator::Tilde,
    ] {
        if let Some(rest) = raw.strip_prefix(operator.as_str()) {
            return PartialVersion::parse(rest).map(|version| (operator, version));
        }
    }
    PartialVersion::parse(raw).map(|version| (RangeOperator::Exact, version))
}
