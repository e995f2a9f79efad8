use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = ".depsyncrc.json";

/// Manifest globs used when neither the CLI nor the config names any
pub const DEFAULT_SOURCES: [&str; 2] = ["package.json", "packages/*/package.json"];

/// Keyword in a `dependencies` selector standing for every package developed
/// in the workspace
pub const LOCAL_KEYWORD: &str = "$LOCAL";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Enabled dependency types; empty or `["**"]` enables all
    pub dependency_types: Vec<String>,
    /// User-defined dependency locations, keyed by type name
    pub custom_types: IndexMap<String, CustomTypeConfig>,
    /// Regex restricting which dependency names are collected
    pub filter: Option<String>,
    /// Manifest globs, relative to the working directory
    pub source: Vec<String>,
    pub version_groups: Vec<VersionGroupConfig>,
    pub semver_groups: Vec<SemverGroupConfig>,
    /// Rules for `--format`
    #[serde(flatten)]
    pub format: FormatConfig,
}

/// How `--format` normalizes a manifest
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatConfig {
    /// Replace `bugs` with its `url` when it has one
    pub format_bugs: bool,
    /// Replace `repository` with its shortened `url` unless it names a directory
    pub format_repository: bool,
    /// Fields whose object keys or string items are sorted alphabetically
    pub sort_az: Vec<String>,
    /// Condition order applied to `exports` at every depth
    pub sort_exports: Vec<String>,
    /// Top-level fields written first, in this order
    pub sort_first: Vec<String>,
    /// Sort the remaining top-level fields alphabetically
    pub sort_packages: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            format_bugs: true,
            format_repository: true,
            sort_az: strings(&[
                "bin",
                "contributors",
                "dependencies",
                "devDependencies",
                "keywords",
                "peerDependencies",
                "resolutions",
                "scripts",
            ]),
            sort_exports: strings(&[
                "types",
                "node-addons",
                "node",
                "browser",
                "module",
                "import",
                "require",
                "development",
                "production",
                "script",
                "default",
            ]),
            sort_first: strings(&["name", "description", "version", "author"]),
            sort_packages: true,
        }
    }
}

/// A user-defined dependency location
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomTypeConfig {
    /// One of `versionsByName`, `name@version`, `version`, `name~version`
    pub strategy: String,
    /// Dotted path to the field, e.g. `volta.node`
    pub path: String,
    /// Dotted path to the name field, for the `name~version` strategy
    #[serde(default)]
    pub name_path: Option<String>,
}

/// Predicate fields shared by version groups and semver groups
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorConfig {
    /// Absent matches every dependency; present but empty matches none
    pub dependencies: Option<Vec<String>>,
    pub dependency_types: Vec<String>,
    pub packages: Vec<String>,
    pub specifier_types: Vec<String>,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionGroupConfig {
    #[serde(flatten)]
    pub selector: SelectorConfig,
    pub is_banned: bool,
    pub is_ignored: bool,
    pub pin_version: Option<String>,
    /// Only `sameRange` is recognized
    pub policy: Option<String>,
    pub snap_to: Option<Vec<String>>,
    /// `highestSemver` (default) or `lowestSemver`
    pub prefer_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SemverGroupConfig {
    #[serde(flatten)]
    pub selector: SelectorConfig,
    pub is_ignored: bool,
    /// Range operator such as `^`, `~`, `>=` or `` for exact versions
    pub range: Option<String>,
}

/// Configuration problems. Loading errors are fatal; every other variant is
/// reported alongside results without stopping detection.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid filter regex {pattern:?}: {message}")]
    InvalidFilter { pattern: String, message: String },

    #[error("Custom type {name:?} has unknown strategy {strategy:?}")]
    UnknownStrategy { name: String, strategy: String },

    #[error("Custom type {name:?} with strategy name~version needs a namePath")]
    MissingNamePath { name: String },

    #[error("Group {group} has an invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        group: String,
        pattern: String,
        message: String,
    },

    #[error("Group {group} has an empty dependencies list and matches nothing")]
    EmptyDependencies { group: String },

    #[error("Group {group} has unknown policy {policy:?}")]
    UnknownPolicy { group: String, policy: String },

    #[error("Group {group} has unknown preferVersion {value:?}")]
    UnknownPreferVersion { group: String, value: String },

    #[error("Group {group} sets several policies; using {used}")]
    ConflictingPolicy { group: String, used: &'static str },

    #[error("Group {group} has unknown range {range:?}")]
    UnknownRange { group: String, range: String },

    #[error("Group {group} pins an unparsable version {version:?}")]
    UnparsablePin { group: String, version: String },

    #[error("Group {group} has unknown specifier type {name:?}")]
    UnknownSpecifierType { group: String, name: String },
}

impl Config {
    /// Read configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(ConfigError::Parse)
    }

    /// Source globs, falling back to [`DEFAULT_SOURCES`]
    pub fn sources(&self) -> Vec<String> {
        if self.source.is_empty() {
            DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            self.source.clone()
        }
    }
}
