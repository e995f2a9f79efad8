//! Shared fixtures for unit tests

use serde_json::{Map, Value};

use crate::instance::{CollectOptions, DependencyInstance, collect_instances};
use crate::manifest::Manifest;

/// A manifest at `packages/<name>/package.json` with `name` as its first key
pub fn package(name: &str, contents: Value) -> Manifest {
    let mut object = Map::new();
    object.insert("name".to_string(), Value::String(name.to_string()));
    if let Value::Object(rest) = contents {
        object.extend(rest);
    }
    let raw = serde_json::to_string_pretty(&Value::Object(object)).unwrap() + "\n";
    Manifest::parse(format!("packages/{name}/package.json"), &raw).unwrap()
}

/// Collect instances with every built-in dependency type enabled
pub fn instances_of(manifests: &[Manifest]) -> Vec<DependencyInstance> {
    collect_instances(manifests, &CollectOptions::default())
}
