use crate::specifier::{RangeOperator, Specifier};

/// Which version wins in a standard group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreferVersion {
    #[default]
    HighestSemver,
    LowestSemver,
}

impl PreferVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferVersion::HighestSemver => "highestSemver",
            PreferVersion::LowestSemver => "lowestSemver",
        }
    }
}

impl std::str::FromStr for PreferVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highestSemver" => Ok(PreferVersion::HighestSemver),
            "lowestSemver" => Ok(PreferVersion::LowestSemver),
            _ => Err(format!("Unknown preferVersion: {s:?}")),
        }
    }
}

/// Policy of a version group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Every instance uses the highest (or lowest) semver version in use
    Standard(PreferVersion),
    /// Every instance uses this exact specifier
    Pinned(Specifier),
    /// The dependency must not be used at all
    Banned,
    /// Excluded from detection
    Ignored,
    /// Every semver range must overlap with every other
    SameRange,
    /// Every instance uses the version declared by these packages
    SnappedTo(Vec<String>),
}

impl VersionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            VersionPolicy::Standard(_) => "standard",
            VersionPolicy::Pinned(_) => "pinned",
            VersionPolicy::Banned => "banned",
            VersionPolicy::Ignored => "ignored",
            VersionPolicy::SameRange => "sameRange",
            VersionPolicy::SnappedTo(_) => "snappedTo",
        }
    }
}

/// Policy of a semver group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemverPolicy {
    /// No preference; the implicit catch-all
    Unconstrained,
    Ignored,
    /// Semver specifiers must use this operator
    Range(RangeOperator),
}

impl SemverPolicy {
    /// The operator instances of this group should be written with
    pub fn operator(&self) -> Option<RangeOperator> {
        match self {
            SemverPolicy::Range(operator) => Some(*operator),
            SemverPolicy::Unconstrained | SemverPolicy::Ignored => None,
        }
    }
}
