use std::cmp::Ordering;

use crate::specifier::types::Specifier;

/// Result of comparing two specifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Different,
    /// One side is semver-derived and the other is opaque, or either side is
    /// unparsable
    Incomparable,
}

/// Compare two specifiers for equality of what they declare.
///
/// Semver specifiers are equal when written identically; opaque specifiers
/// are equal on exact string equality.
pub fn compare(a: &Specifier, b: &Specifier) -> Comparison {
    if a.is_unparsable() || b.is_unparsable() || a.is_semver() != b.is_semver() {
        return Comparison::Incomparable;
    }
    if a.raw() == b.raw() {
        Comparison::Equal
    } else {
        Comparison::Different
    }
}

/// Order two semver specifiers by anchor version.
///
/// Returns None if either side is opaque.
pub fn order(a: &Specifier, b: &Specifier) -> Option<Ordering> {
    Some(a.anchor()?.cmp(b.anchor()?))
}

/// Whether two semver specifiers share a version and differ at most in operator
pub fn same_version(a: &Specifier, b: &Specifier) -> bool {
    order(a, b) == Some(Ordering::Equal)
}

/// Index of the preferred specifier among `candidates`.
///
/// `highest` selects the greatest anchor version, otherwise the lowest. Among
/// equal anchors an exact version beats a range; remaining ties go to the
/// earliest candidate.
pub fn preferred<'a, I>(candidates: I, highest: bool) -> Option<usize>
where
    I: IntoIterator<Item = &'a Specifier>,
{
    let mut best: Option<(usize, &Specifier)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let Some(anchor) = candidate.anchor() else {
            continue;
        };
        let replace = match best {
            None => true,
            Some((_, current)) => {
                let current_anchor = current.anchor().unwrap_or(anchor);
                let by_version = if highest {
                    anchor.cmp(current_anchor)
                } else {
                    current_anchor.cmp(anchor)
                };
                match by_version {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => candidate.is_exact() && !current.is_exact(),
                }
            }
        };
        if replace {
            best = Some((index, candidate));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn spec(raw: &str) -> Specifier {
        Specifier::parse(raw)
    }

    #[rstest]
    #[case("1.0.0", "1.0.0", Comparison::Equal)]
    #[case("1.0.0", "^1.0.0", Comparison::Different)]
    #[case("^1.0.0", "^2.0.0", Comparison::Different)]
    #[case("workspace:*", "workspace:*", Comparison::Equal)]
    #[case("workspace:*", "workspace:^", Comparison::Different)]
    #[case("latest", "github:user/repo", Comparison::Different)]
    #[case("1.0.0", "workspace:*", Comparison::Incomparable)]
    #[case("latest", "^1.0.0", Comparison::Incomparable)]
    #[case("", "", Comparison::Incomparable)]
    #[case("^^1", "1.0.0", Comparison::Incomparable)]
    fn compare_specifiers(#[case] a: &str, #[case] b: &str, #[case] expected: Comparison) {
        assert_eq!(compare(&spec(a), &spec(b)), expected);
        assert_eq!(compare(&spec(b), &spec(a)), expected);
    }

    #[rstest]
    #[case("1.2.0", "1.5.0", Some(Ordering::Less))]
    #[case("^1.5.0", "1.5.0", Some(Ordering::Equal))]
    #[case("*", "99.0.0", Some(Ordering::Greater))]
    #[case("1.x", "1.99.0", Some(Ordering::Greater))]
    #[case("workspace:*", "1.0.0", None)]
    fn order_by_anchor(#[case] a: &str, #[case] b: &str, #[case] expected: Option<Ordering>) {
        assert_eq!(order(&spec(a), &spec(b)), expected);
    }

    #[rstest]
    #[case(vec!["1.2.0", "1.5.0", "^1.3.0"], true, Some(1))]
    #[case(vec!["1.2.0", "1.5.0", "^1.3.0"], false, Some(0))]
    #[case(vec!["^1.5.0", "1.5.0"], true, Some(1))]
    #[case(vec!["1.5.0", "^1.5.0"], true, Some(0))]
    #[case(vec!["^1.5.0", "~1.5.0"], true, Some(0))]
    #[case(vec!["workspace:*", "1.0.0"], true, Some(1))]
    #[case(vec!["latest"], true, None)]
    fn preferred_specifier(
        #[case] raws: Vec<&str>,
        #[case] highest: bool,
        #[case] expected: Option<usize>,
    ) {
        let specifiers: Vec<Specifier> = raws.into_iter().map(spec).collect();
        assert_eq!(preferred(&specifiers, highest), expected);
    }
}
