//! Version specifier parsing and comparison
//!
//! # Architecture
//!
//! ```text
//! raw string ──> parser ──> Specifier ─┬─> compare()   Equal / Different / Incomparable
//!                  │                   ├─> order()     anchor version ordering
//!                  │                   └─> preferred() highest / lowest pick
//!                  ▼
//!               range ──> VersionRange (union of intervals)
//!                           ├─> satisfies()
//!                           └─> intersects()
//! ```
//!
//! Exact versions and semver ranges are comparable with each other. Workspace
//! links, aliases, file links, git/url sources and dist-tags are opaque and
//! only ever compared by string equality.

pub mod compare;
pub mod operator;
pub mod parser;
pub mod range;
pub mod semver;
pub mod types;

pub use compare::{Comparison, compare, order, preferred, same_version};
pub use operator::RangeOperator;
pub use range::VersionRange;
pub use types::{RangeShape, SemverRange, Specifier};
