use std::fmt;
use std::str::FromStr;

use semver::Version;

/// The leading operator of a simple semver specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeOperator {
    /// `*`
    Any,
    /// `^1.2.3`
    Caret,
    /// `~1.2.3`
    Tilde,
    /// `>1.2.3`
    Gt,
    /// `>=1.2.3`
    Gte,
    /// `<1.2.3`
    Lt,
    /// `<=1.2.3`
    Lte,
    /// `1.2.3`
    Exact,
}

impl RangeOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeOperator::Any => "*",
            RangeOperator::Caret => "^",
            RangeOperator::Tilde => "~",
            RangeOperator::Gt => ">",
            RangeOperator::Gte => ">=",
            RangeOperator::Lt => "<",
            RangeOperator::Lte => "<=",
            RangeOperator::Exact => "",
        }
    }

    /// Write a version with this operator
    pub fn apply(&self, version: &Version) -> String {
        match self {
            RangeOperator::Any => "*".to_string(),
            _ => format!("{}{}", self.as_str(), version),
        }
    }

    /// Whether `<op><version>` is satisfied by `<version>` itself.
    ///
    /// `>1.2.3` and `<1.2.3` exclude the version they are written with.
    pub fn admits_own_version(&self) -> bool {
        !matches!(self, RangeOperator::Gt | RangeOperator::Lt)
    }
}

impl FromStr for RangeOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(RangeOperator::Any),
            "^" => Ok(RangeOperator::Caret),
            "~" => Ok(RangeOperator::Tilde),
            ">" => Ok(RangeOperator::Gt),
            ">=" => Ok(RangeOperator::Gte),
            "<" => Ok(RangeOperator::Lt),
            "<=" => Ok(RangeOperator::Lte),
            "" => Ok(RangeOperator::Exact),
            _ => Err(format!("Unknown range operator: {s:?}")),
        }
    }
}

impl fmt::Display for RangeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RangeOperator::Any, "*")]
    #[case(RangeOperator::Caret, "^1.2.3")]
    #[case(RangeOperator::Tilde, "~1.2.3")]
    #[case(RangeOperator::Gte, ">=1.2.3")]
    #[case(RangeOperator::Exact, "1.2.3")]
    fn apply(#[case] operator: RangeOperator, #[case] expected: &str) {
        assert_eq!(operator.apply(&Version::new(1, 2, 3)), expected);
    }

    #[rstest]
    #[case("^", RangeOperator::Caret)]
    #[case("", RangeOperator::Exact)]
    #[case("<=", RangeOperator::Lte)]
    fn from_str_round_trips_as_str(#[case] input: &str, #[case] expected: RangeOperator) {
        let operator: RangeOperator = input.parse().unwrap();
        assert_eq!(operator, expected);
        assert_eq!(operator.as_str(), input);
    }

    #[test]
    fn from_str_rejects_unknown_operator() {
        assert!("=>".parse::<RangeOperator>().is_err());
    }
}
