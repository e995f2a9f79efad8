//! Partitioning instances into version groups and semver groups
//!
//! # Modules
//!
//! - [`selector`]: name, type, package and specifier-kind predicates
//! - [`policy`]: the closed set of version and semver policies
//! - [`version_group`] / [`semver_group`]: compiled groups
//! - [`assign`]: first-match assignment of instances to groups

pub mod assign;
pub mod policy;
pub mod selector;
pub mod semver_group;
pub mod version_group;

pub use assign::{Assignment, GroupSet, assign, first_match, local_package_names};
pub use policy::{PreferVersion, SemverPolicy, VersionPolicy};
pub use selector::GroupSelector;
pub use semver_group::SemverGroup;
pub use version_group::VersionGroup;

/// A group that owns instances through a selector
pub trait Grouped {
    fn selector(&self) -> &GroupSelector;
}
