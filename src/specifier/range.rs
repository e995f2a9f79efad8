//! npm semver range grammar
//!
//! Supports npm semver range specifications:
//! - `1.2.3` - exact match
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `1`, `*` - wildcards and partial versions
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` - comparator sets (AND)
//! - `^1.0.0 || ^2.0.0` - unions (OR)
//!
//! Every range is normalized to a union of version intervals so that
//! membership and overlap are plain interval arithmetic.

use std::cmp::Ordering;

use semver::Version;

use crate::specifier::semver::PartialVersion;

/// One end of an interval
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: Version,
    inclusive: bool,
}

impl Bound {
    fn inclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    fn exclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }
}

/// A contiguous set of versions. `None` bounds are unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl Interval {
    fn unbounded() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    fn new(lower: Option<Bound>, upper: Option<Bound>) -> Self {
        Self { lower, upper }
    }

    fn exact(version: Version) -> Self {
        Self::new(
            Some(Bound::inclusive(version.clone())),
            Some(Bound::inclusive(version)),
        )
    }

    fn contains(&self, version: &Version) -> bool {
        let above_lower = match &self.lower {
            None => true,
            Some(bound) if bound.inclusive => version >= &bound.version,
            Some(bound) => version > &bound.version,
        };
        let below_upper = match &self.upper {
            None => true,
            Some(bound) if bound.inclusive => version <= &bound.version,
            Some(bound) => version < &bound.version,
        };
        above_lower && below_upper
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => match lower.version.cmp(&upper.version) {
                Ordering::Greater => true,
                Ordering::Equal => !(lower.inclusive && upper.inclusive),
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    /// Intersection of two intervals, or None when they share no version.
    fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lower = match (&self.lower, &other.lower) {
            (None, bound) | (bound, None) => bound.clone(),
            (Some(a), Some(b)) => Some(match a.version.cmp(&b.version) {
                Ordering::Greater => a.clone(),
                Ordering::Less => b.clone(),
                Ordering::Equal => Bound {
                    version: a.version.clone(),
                    inclusive: a.inclusive && b.inclusive,
                },
            }),
        };
        let upper = match (&self.upper, &other.upper) {
            (None, bound) | (bound, None) => bound.clone(),
            (Some(a), Some(b)) => Some(match a.version.cmp(&b.version) {
                Ordering::Less => a.clone(),
                Ordering::Greater => b.clone(),
                Ordering::Equal => Bound {
                    version: a.version.clone(),
                    inclusive: a.inclusive && b.inclusive,
                },
            }),
        };
        let interval = Interval::new(lower, upper);
        (!interval.is_empty()).then_some(interval)
    }

    /// Whether every version of `other` is also in this interval
    fn covers(&self, other: &Interval) -> bool {
        let lower = match (&self.lower, &other.lower) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => match a.version.cmp(&b.version) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => a.inclusive || !b.inclusive,
            },
        };
        let upper = match (&self.upper, &other.upper) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => match a.version.cmp(&b.version) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => a.inclusive || !b.inclusive,
            },
        };
        lower && upper
    }

    /// Lowest version in the interval, if bounded below.
    fn lower_version(&self) -> Option<&Version> {
        self.lower.as_ref().map(|bound| &bound.version)
    }
}

/// A parsed npm range: a union of intervals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    alternatives: Vec<Interval>,
}

impl VersionRange {
    /// Parse a version specification string
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // OR (||) has the lowest precedence
        let mut alternatives = Vec::new();
        for part in text.split("||") {
            if let Some(interval) = parse_comparator_set(part)? {
                alternatives.push(interval);
            }
        }

        Some(Self { alternatives })
    }

    /// A range containing exactly one version
    pub fn exact(version: Version) -> Self {
        Self {
            alternatives: vec![Interval::exact(version)],
        }
    }

    /// Check if a version satisfies this range
    pub fn satisfies(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|interval| interval.contains(version))
    }

    /// Check if at least one version satisfies both ranges
    pub fn intersects(&self, other: &VersionRange) -> bool {
        self.alternatives.iter().any(|a| {
            other
                .alternatives
                .iter()
                .any(|b| a.intersect(b).is_some())
        })
    }

    /// Check if every version satisfying `other` also satisfies this range
    ///
    /// Each alternative of `other` has to fit inside a single alternative
    /// here, so unions that only cover it together are not recognized.
    pub fn covers(&self, other: &VersionRange) -> bool {
        other
            .alternatives
            .iter()
            .all(|b| self.alternatives.iter().any(|a| a.covers(b)))
    }

    /// Returns true when no version can satisfy this range (e.g. `>2.0.0 <1.0.0`)
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Get the base version from this range (for ordering purposes)
    ///
    /// Uses the lower bound of the first alternative, or 0.0.0 when unbounded.
    pub fn base_version(&self) -> Version {
        self.alternatives
            .first()
            .and_then(Interval::lower_version)
            .cloned()
            .unwrap_or_else(|| Version::new(0, 0, 0))
    }
}

/// Parse a comparator set: a hyphen range, or whitespace-separated comparators.
///
/// Returns None when the set is malformed and Some(None) when it is valid but
/// matches no version.
fn parse_comparator_set(set: &str) -> Option<Option<Interval>> {
    let set = set.trim();
    if set.is_empty() {
        // npm treats an empty alternative as "*"
        return Some(Some(Interval::unbounded()));
    }

    if let Some(interval) = parse_hyphen(set) {
        return Some(Some(interval));
    }

    let mut interval = Interval::unbounded();
    for comparator in split_comparators(set) {
        let next = parse_comparator(&comparator)?;
        match interval.intersect(&next) {
            Some(narrowed) => interval = narrowed,
            None => return Some(None),
        }
    }
    Some(Some(interval))
}

/// Parse hyphen range like "1.0.0 - 2.0.0"
fn parse_hyphen(set: &str) -> Option<Interval> {
    let (from, to) = set.split_once(" - ")?;
    let from = PartialVersion::parse(from)?;
    let to = PartialVersion::parse(to)?;

    // A partial upper bound covers everything it leaves open: "1 - 2" is <3.0.0
    let upper = match to.next_excluded() {
        Some(next) => Bound::exclusive(next),
        None => Bound::inclusive(to.floor()),
    };
    Some(Interval::new(Some(Bound::inclusive(from.floor())), Some(upper)))
}

/// Split a comparator set on whitespace, re-attaching operators written
/// with a trailing space (`>= 1.2.3`).
fn split_comparators(set: &str) -> Vec<String> {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_operator: Option<&str> = None;

    for token in set.split_whitespace() {
        if matches!(token, ">" | ">=" | "<" | "<=" | "=" | "^" | "~") {
            pending_operator = Some(token);
            continue;
        }
        match pending_operator.take() {
            Some(operator) => comparators.push(format!("{operator}{token}")),
            None => comparators.push(token.to_string()),
        }
    }
    if let Some(operator) = pending_operator {
        comparators.push(operator.to_string());
    }
    comparators
}

/// Parse a single comparator into an interval
fn parse_comparator(comparator: &str) -> Option<Interval> {
    let comparator = comparator.trim();
    if comparator == "*" || comparator.eq_ignore_ascii_case("x") {
        return Some(Interval::unbounded());
    }

    let (operator, rest) = split_operator(comparator);
    let version = PartialVersion::parse(rest)?;
    let floor = version.floor();
    let next = version.next_excluded();

    let interval = match operator {
        ">=" => Interval::new(Some(Bound::inclusive(floor)), None),
        ">" => match next {
            // >1.2 means >=1.3.0
            Some(next) => Interval::new(Some(Bound::inclusive(next)), None),
            None => Interval::new(Some(Bound::exclusive(floor)), None),
        },
        "<" => Interval::new(None, Some(Bound::exclusive(floor))),
        "<=" => match next {
            // <=1.2 means <1.3.0
            Some(next) => Interval::new(None, Some(Bound::exclusive(next))),
            None => Interval::new(None, Some(Bound::inclusive(floor))),
        },
        "~" => {
            // ~1.2.3 -> >=1.2.3 <1.3.0, ~1 -> >=1.0.0 <2.0.0
            let upper = match version.minor {
                Some(minor) => Version::new(version.major, minor.saturating_add(1), 0),
                None => Version::new(version.major.saturating_add(1), 0, 0),
            };
            Interval::new(Some(Bound::inclusive(floor)), Some(Bound::exclusive(upper)))
        }
        "^" => {
            // ^1.2.3 -> >=1.2.3 <2.0.0
            // ^0.2.3 -> >=0.2.3 <0.3.0
            // ^0.0.3 -> >=0.0.3 <0.0.4
            // ^0.0 -> >=0.0.0 <0.1.0, ^0 -> >=0.0.0 <1.0.0
            let upper = match (version.major, version.minor, version.patch) {
                (major, _, _) if major > 0 => Version::new(major.saturating_add(1), 0, 0),
                (_, None, _) => Version::new(1, 0, 0),
                (_, Some(minor), _) if minor > 0 => Version::new(0, minor.saturating_add(1), 0),
                (_, Some(_), None) => Version::new(0, 1, 0),
                (_, Some(_), Some(patch)) => Version::new(0, 0, patch.saturating_add(1)),
            };
            Interval::new(Some(Bound::inclusive(floor)), Some(Bound::exclusive(upper)))
        }
        _ => match next {
            Some(next) => {
                Interval::new(Some(Bound::inclusive(floor)), Some(Bound::exclusive(next)))
            }
            None => Interval::exact(floor),
        },
    };
    Some(interval)
}

/// Split a leading comparison operator from a comparator
fn split_operator(comparator: &str) -> (&str, &str) {
    for operator in [">=", "<=", ">", "<", "^", "~", "="] {
        if let Some(rest) = comparator.strip_prefix(operator) {
            return (operator, rest.trim());
        }
    }
    ("", comparator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(version: &str) -> Version {
        Version::parse(version).unwrap()
    }

    #[rstest]
    #[case("1.0.0", "1.0.0", true)]
    #[case("1.0.0", "1.0.1", false)]
    #[case("^1.2.3", "1.9.9", true)]
    #[case("^1.2.3", "1.2.2", false)]
    #[case("^1.2.3", "2.0.0", false)]
    // ^0.x.y: major and minor must match
    #[case("^0.2.3", "0.2.9", true)]
    #[case("^0.2.3", "0.3.0", false)]
    // ^0.0.x: only patch must match
    #[case("^0.0.3", "0.0.3", true)]
    #[case("^0.0.3", "0.0.4", false)]
    #[case("~1.2.3", "1.2.9", true)]
    #[case("~1.2.3", "1.3.0", false)]
    #[case("~1", "1.9.0", true)]
    #[case(">=1.0.0", "1.0.0", true)]
    #[case(">1.0.0", "1.0.0", false)]
    #[case("<=1.0.0", "1.0.0", true)]
    #[case("<1.0.0", "1.0.0", false)]
    #[case("<= 1.0.0", "0.9.0", true)]
    #[case("*", "0.0.1", true)]
    #[case("x", "9.9.9", true)]
    #[case("1.x", "1.9.9", true)]
    #[case("1.x", "2.0.0", false)]
    #[case("1.2.X", "1.2.5", true)]
    #[case("1.2", "1.2.7", true)]
    #[case("1.2", "1.3.0", false)]
    #[case("1.0.0 - 2.0.0", "2.0.0", true)]
    #[case("1.0.0 - 2.0.0", "2.0.1", false)]
    #[case("1 - 2", "2.9.9", true)]
    #[case(">=1.0.0 <2.0.0", "1.5.0", true)]
    #[case(">=1.0.0 <2.0.0", "2.0.0", false)]
    #[case("^1.0.0 || ^2.0.0", "2.5.0", true)]
    #[case("^1.0.0 || ^2.0.0", "3.0.0", false)]
    fn satisfies(#[case] text: &str, #[case] version: &str, #[case] expected: bool) {
        let range = VersionRange::parse(text).unwrap();
        assert_eq!(range.satisfies(&v(version)), expected, "{text} vs {version}");
    }

    #[rstest]
    #[case("^1.0.0", "^1.5.0", true)]
    #[case("^1.0.0", "~1.9.0", true)]
    #[case("^1.0.0", "^2.0.0", false)]
    #[case(">=1.0.0", "<1.0.0", false)]
    #[case(">=1.0.0", "<=1.0.0", true)]
    #[case(">1.0.0", "<=1.0.0", false)]
    #[case("1.2.3", "^1.0.0", true)]
    #[case("1.2.3", "~1.3.0", false)]
    #[case("^1.0.0 || ^3.0.0", "~3.1.0", true)]
    #[case("*", "0.0.1", true)]
    fn intersects(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        let a = VersionRange::parse(a).unwrap();
        let b = VersionRange::parse(b).unwrap();
        assert_eq!(a.intersects(&b), expected);
        assert_eq!(b.intersects(&a), expected);
    }

    #[rstest]
    #[case("^1.0.0", "1.0.0", true)]
    #[case("^1.0.0", "~1.2.0", true)]
    #[case("~1.2.0", "^1.2.0", false)]
    #[case(">=1.0.0", "^1.5.0", true)]
    #[case(">=1.0.0", "<=1.0.0", false)]
    #[case("<=1.0.0", "<1.0.0", true)]
    #[case("<1.0.0", "<=1.0.0", false)]
    #[case("*", ">=2.0.0", true)]
    #[case("^1.0.0 || ^2.0.0", "~2.1.0", true)]
    #[case("1.0.0", "^1.0.0", false)]
    fn covers(#[case] outer: &str, #[case] inner: &str, #[case] expected: bool) {
        let outer = VersionRange::parse(outer).unwrap();
        let inner = VersionRange::parse(inner).unwrap();
        assert_eq!(outer.covers(&inner), expected, "{outer:?} covers {inner:?}");
    }

    #[rstest]
    #[case("abc")]
    #[case(">=")]
    #[case("^1.x.3")]
    #[case("1.0.0 - latest")]
    fn parse_rejects_malformed(#[case] text: &str) {
        assert_eq!(VersionRange::parse(text), None);
    }

    #[test]
    fn contradictory_comparators_match_nothing() {
        let range = VersionRange::parse(">2.0.0 <1.0.0").unwrap();
        assert!(range.is_empty());
        assert!(!range.satisfies(&v("1.5.0")));
    }

    #[rstest]
    #[case("^1.2.3", v("1.2.3"))]
    #[case(">=1.0.0 <2.0.0", v("1.0.0"))]
    #[case("<2.0.0", v("0.0.0"))]
    #[case("^2.0.0 || ^1.0.0", v("2.0.0"))]
    fn base_version(#[case] text: &str, #[case] expected: Version) {
        assert_eq!(VersionRange::parse(text).unwrap().base_version(), expected);
    }
}
