use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::instance::dependency_type::{
    DependencyLocation, DependencyType, Strategy, enabled_locations,
};
use crate::instance::types::{DependencyInstance, InstanceId};
use crate::manifest::Manifest;
use crate::specifier::Specifier;

/// What to collect from each manifest
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Locations to read, in collection order
    pub locations: Vec<DependencyLocation>,
    /// Only dependency names matching this regex are collected
    pub name_filter: Option<Regex>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            locations: DependencyType::BUILTIN
                .iter()
                .filter_map(DependencyType::location)
                .collect(),
            name_filter: None,
        }
    }
}

impl CollectOptions {
    /// Build options from `dependencyTypes`, `customTypes` and `filter`.
    ///
    /// Invalid entries are reported and left out.
    pub fn from_config(config: &Config) -> (Self, Vec<ConfigError>) {
        let mut issues = Vec::new();
        let locations = enabled_locations(config, &mut issues);

        let name_filter = config.filter.as_deref().and_then(|pattern| {
            Regex::new(pattern)
                .inspect_err(|e| {
                    issues.push(ConfigError::InvalidFilter {
                        pattern: pattern.to_string(),
                        message: e.to_string(),
                    })
                })
                .ok()
        });

        (
            Self {
                locations,
                name_filter,
            },
            issues,
        )
    }
}

/// Flatten every dependency declaration across `manifests`.
///
/// Order is deterministic: manifest order, then location order, then key
/// order within each location. Non-string values are skipped.
pub fn collect_instances(
    manifests: &[Manifest],
    options: &CollectOptions,
) -> Vec<DependencyInstance> {
    let mut instances = Vec::new();

    for (manifest_index, manifest) in manifests.iter().enumerate() {
        let package_name = manifest.package_name();

        for location in &options.locations {
            for (name, raw) in read_location(manifest, location) {
                if let Some(filter) = &options.name_filter
                    && !filter.is_match(&name)
                {
                    continue;
                }

                instances.push(DependencyInstance {
                    id: InstanceId(instances.len()),
                    manifest_index,
                    manifest_path: manifest.path().to_path_buf(),
                    package_name: package_name.clone(),
                    name,
                    location: location.clone(),
                    specifier: Specifier::parse(&raw),
                });
            }
        }
    }

    debug!(
        "Collected {} instances from {} manifests",
        instances.len(),
        manifests.len()
    );
    instances
}

/// Read `(name, specifier)` pairs declared at `location`
fn read_location(manifest: &Manifest, location: &DependencyLocation) -> Vec<(String, String)> {
    let Some(value) = manifest.pointer(&location.pointer) else {
        return Vec::new();
    };

    match &location.strategy {
        Strategy::VersionsByName => value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(name, version)| {
                        version.as_str().map(|v| (name.clone(), v.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default(),
        Strategy::NameAtVersion => value
            .as_str()
            .and_then(split_name_at_version)
            .map(|(name, version)| vec![(name.to_string(), version.to_string())])
            .unwrap_or_default(),
        Strategy::VersionOnly => value
            .as_str()
            .map(|version| {
                vec![(
                    location.dependency_type.as_str().to_string(),
                    version.to_string(),
                )]
            })
            .unwrap_or_default(),
        Strategy::NameAndVersion { name_pointer } => {
            let name = manifest.pointer(name_pointer).and_then(Value::as_str);
            match (name, value.as_str()) {
                (Some(name), Some(version)) if !name.is_empty() => {
                    vec![(name.to_string(), version.to_string())]
                }
                _ => Vec::new(),
            }
        }
    }
}

/// Split `name@version`, allowing a leading `@` in scoped names
fn split_name_at_version(value: &str) -> Option<(&str, &str)> {
    let at = value.get(1..)?.find('@')? + 1;
    let (name, version) = (&value[..at], &value[at + 1..]);
    (!name.is_empty()).then_some((name, version))
}
