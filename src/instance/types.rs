use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::instance::dependency_type::{DependencyLocation, DependencyType};
use crate::specifier::Specifier;

/// Position of an instance in the collected list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InstanceId(pub usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One declared dependency entry within one manifest
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyInstance {
    pub id: InstanceId,
    /// Index of the owning manifest in the slice passed to the collector
    pub manifest_index: usize,
    pub manifest_path: PathBuf,
    /// `name` of the owning manifest, or its path when unnamed
    pub package_name: String,
    /// Dependency name (`react`, `@scope/pkg`)
    pub name: String,
    pub location: DependencyLocation,
    pub specifier: Specifier,
}

impl DependencyInstance {
    pub fn dependency_type(&self) -> &DependencyType {
        &self.location.dependency_type
    }

    /// The specifier exactly as written
    pub fn raw(&self) -> &str {
        self.specifier.raw()
    }

    /// Whether this is the owning package's own `version`
    pub fn is_local(&self) -> bool {
        self.location.dependency_type == DependencyType::Local
    }
}
