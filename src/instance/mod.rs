//! Flattening manifests into dependency instances

pub mod collector;
pub mod dependency_type;
pub mod types;

pub use collector::{CollectOptions, collect_instances};
pub use dependency_type::{DependencyLocation, DependencyType, Strategy, TypeFilter};
pub use types::{DependencyInstance, InstanceId};
