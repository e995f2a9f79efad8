use serde::Serialize;

use crate::instance::InstanceId;

/// Why an instance disagrees with its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    /// Differs from the highest semver version in the group
    HighestSemverMismatch,
    /// Differs from the lowest semver version in the group
    LowestSemverMismatch,
    /// Differs from the version of the package developed in the workspace
    LocalVersionMismatch,
    /// Differs from the pinned version
    PinMismatch,
    /// Differs from the version used by the snapped-to packages
    SnapToMismatch,
    /// Right version, wrong range operator for its semver group
    SemverRangeMismatch,
    /// The dependency is banned
    Banned,
    /// Semver and non-semver specifiers are mixed
    IncompatibleSpecifierKind,
    /// Non-semver specifiers differ from each other
    NonSemverMismatch,
    /// Semver ranges do not overlap
    SameRangeMismatch,
    /// None of the snapped-to packages depend on it
    SnapToSourceNotFound,
    /// The snapped-to packages disagree with each other
    SnapToSourceAmbiguous,
    /// The semver group's range would exclude the expected version
    RangeConflict,
    /// The local package's own version is not an exact semver version
    InvalidLocalVersion,
    /// Depends on a local package whose own version is invalid
    DependsOnInvalidLocalVersion,
    /// Policies never rewrite a package's own version
    RefuseToChangeLocal,
    /// The specifier could not be parsed
    UnparsableSpecifier,
}

impl Reason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Reason::HighestSemverMismatch => "highest-semver-mismatch",
            Reason::LowestSemverMismatch => "lowest-semver-mismatch",
            Reason::LocalVersionMismatch => "local-version-mismatch",
            Reason::PinMismatch => "pin-mismatch",
            Reason::SnapToMismatch => "snap-to-mismatch",
            Reason::SemverRangeMismatch => "semver-range-mismatch",
            Reason::Banned => "banned",
            Reason::IncompatibleSpecifierKind => "incompatible-specifier-kind",
            Reason::NonSemverMismatch => "non-semver-mismatch",
            Reason::SameRangeMismatch => "same-range-mismatch",
            Reason::SnapToSourceNotFound => "snap-to-source-not-found",
            Reason::SnapToSourceAmbiguous => "snap-to-source-ambiguous",
            Reason::RangeConflict => "range-conflict",
            Reason::InvalidLocalVersion => "invalid-local-version",
            Reason::DependsOnInvalidLocalVersion => "depends-on-invalid-local-version",
            Reason::RefuseToChangeLocal => "refuse-to-change-local",
            Reason::UnparsableSpecifier => "unparsable-specifier",
        }
    }

    /// Whether this reason concerns a semver group's range operator rather
    /// than the version a version group expects
    pub fn is_range(&self) -> bool {
        matches!(self, Reason::SemverRangeMismatch | Reason::RangeConflict)
    }

    /// Whether the fix engine can resolve mismatches with this reason
    pub fn is_fixable(&self) -> bool {
        matches!(
            self,
            Reason::HighestSemverMismatch
                | Reason::LowestSemverMismatch
                | Reason::LocalVersionMismatch
                | Reason::PinMismatch
                | Reason::SnapToMismatch
                | Reason::SemverRangeMismatch
        )
    }
}

/// The version group a mismatch belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub index: usize,
    pub label: String,
    pub policy: &'static str,
}

/// Instances of one dependency that disagree with their group in the same way
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub group: GroupRef,
    pub dependency: String,
    pub instances: Vec<InstanceId>,
    /// The specifier currently written
    pub actual: String,
    /// The specifier the instances should use, when one can be determined
    pub expected: Option<String>,
    pub reason: Reason,
}

impl Mismatch {
    pub fn is_fixable(&self) -> bool {
        self.reason.is_fixable() && self.expected.is_some()
    }
}

/// A single instance's disagreement, before coalescing
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
    pub instance: InstanceId,
    pub actual: String,
    pub reason: Reason,
    pub expected: Option<String>,
}
