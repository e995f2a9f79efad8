//! Opt-in normalization of package.json layout
//!
//! Shortens `bugs` and `repository` to their url and puts keys in a
//! predictable order. Only values are moved around; nothing is added or
//! dropped apart from the object wrappers of the two shorthand fields.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::FormatConfig;
use crate::manifest::Manifest;

static GITHUB_URL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+github\.com/").expect("valid github url regex"));

/// What formatting would change in a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatKind {
    /// `bugs` can be written as its url
    BugsShorthand,
    /// `repository` can be written as its shortened url
    RepositoryShorthand,
    /// `exports` conditions are out of order
    ExportsOrder,
    /// A field listed in `sortAz` is not alphabetical
    AlphabeticalOrder,
    /// Top-level fields are out of order
    FieldOrder,
}

impl FormatKind {
    pub fn code(&self) -> &'static str {
        match self {
            FormatKind::BugsShorthand => "bugs-shorthand",
            FormatKind::RepositoryShorthand => "repository-shorthand",
            FormatKind::ExportsOrder => "exports-order",
            FormatKind::AlphabeticalOrder => "alphabetical-order",
            FormatKind::FieldOrder => "field-order",
        }
    }
}

/// One field of one manifest that is not formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatMismatch {
    pub manifest: PathBuf,
    pub package: String,
    /// JSON pointer of the field, empty for the key order of the whole file
    pub property: String,
    pub kind: FormatKind,
}

/// Formatted copies of the input manifests and what changed in them
#[derive(Debug, Default)]
pub struct FormatResult {
    pub manifests: Vec<Manifest>,
    pub mismatches: Vec<FormatMismatch>,
}

/// Format a copy of every manifest. Inputs are never modified.
pub fn format(manifests: &[Manifest], config: &FormatConfig) -> FormatResult {
    let mut result = FormatResult::default();
    for manifest in manifests {
        let mut formatted = manifest.clone();
        for (property, kind) in format_manifest(&mut formatted, config) {
            debug!("{}: {} at {:?}", manifest.path().display(), kind.code(), property);
            result.mismatches.push(FormatMismatch {
                manifest: manifest.path().to_path_buf(),
                package: manifest.package_name(),
                property,
                kind,
            });
        }
        result.manifests.push(formatted);
    }
    result
}

/// Apply each rule in turn, later rules seeing the output of earlier ones
fn format_manifest(manifest: &mut Manifest, config: &FormatConfig) -> Vec<(String, FormatKind)> {
    let mut changes = Vec::new();
    let mut replace = |manifest: &mut Manifest, property: String, kind: FormatKind, value: Value| {
        if manifest.replace_value(&property, value) {
            changes.push((property, kind));
        }
    };

    if config.format_bugs {
        if let Some(url) = manifest.pointer("/bugs/url").cloned() {
            replace(manifest, "/bugs".to_string(), FormatKind::BugsShorthand, url);
        }
    }
    if config.format_repository {
        if let Some(url) = shorthand_repository(manifest) {
            replace(manifest, "/repository".to_string(), FormatKind::RepositoryShorthand, url);
        }
    }
    if let Some(mut exports) = manifest.pointer("/exports").cloned() {
        sort_nested_keys(&config.sort_exports, &mut exports);
        replace(manifest, "/exports".to_string(), FormatKind::ExportsOrder, exports);
    }
    for field in &config.sort_az {
        let property = field_pointer(field);
        if let Some(mut value) = manifest.pointer(&property).cloned() {
            sort_alphabetically(&mut value);
            replace(manifest, property, FormatKind::AlphabeticalOrder, value);
        }
    }
    if let Some(mut root) = manifest.contents().as_object().cloned() {
        sort_keys_with_priority(&config.sort_first, config.sort_packages, &mut root);
        replace(manifest, String::new(), FormatKind::FieldOrder, Value::Object(root));
    }

    changes
}

/// The repository url without its host, unless the repository is a
/// directory of a larger one
fn shorthand_repository(manifest: &Manifest) -> Option<Value> {
    if manifest.pointer("/repository/directory").is_some() {
        return None;
    }
    let url = manifest.pointer("/repository/url")?.as_str()?;
    Some(Value::String(GITHUB_URL_PREFIX.replace(url, "").into_owned()))
}

/// JSON pointer of a top-level field
fn field_pointer(field: &str) -> String {
    format!("/{}", field.replace('~', "~0").replace('/', "~1"))
}

fn sort_nested_keys(order: &[String], value: &mut Value) {
    if let Value::Object(object) = value {
        sort_keys_with_priority(order, false, object);
        for nested in object.values_mut() {
            sort_nested_keys(order, nested);
        }
    }
}

/// Move the keys named in `order` to the front in that order. The rest keep
/// their order, or are sorted alphabetically when `sort_rest` is set.
fn sort_keys_with_priority(order: &[String], sort_rest: bool, object: &mut Map<String, Value>) {
    let rank = |key: &str| order.iter().position(|first| first == key);
    let mut entries: Vec<(String, Value)> = std::mem::take(object).into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| match (rank(a), rank(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) if sort_rest => collate(a, b),
        (None, None) => Ordering::Equal,
    });
    *object = entries.into_iter().collect();
}

/// Sort object keys, or an array made only of strings
fn sort_alphabetically(value: &mut Value) {
    match value {
        Value::Object(object) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(object).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| collate(a, b));
            *object = entries.into_iter().collect();
        }
        Value::Array(items) if items.iter().all(Value::is_string) => {
            items.sort_by(|a, b| collate(a.as_str().unwrap_or_default(), b.as_str().unwrap_or_default()));
        }
        _ => {}
    }
}

/// Case-insensitive order, ties broken by byte order
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
