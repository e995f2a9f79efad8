//! Where dependencies are declared inside a manifest

use std::fmt;

use crate::config::{Config, ConfigError, CustomTypeConfig};

/// Kind of dependency declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyType {
    /// The manifest's own `name` and `version`
    Local,
    /// `dependencies`
    Prod,
    /// `devDependencies`
    Dev,
    /// `peerDependencies`
    Peer,
    /// `optionalDependencies`
    Optional,
    /// `overrides`
    Overrides,
    /// `pnpm.overrides`
    PnpmOverrides,
    /// `resolutions`
    Resolutions,
    /// `packageManager` (`pnpm@8.15.0`)
    PackageManager,
    /// `engines`
    Engines,
    /// A location declared under `customTypes`
    Custom(String),
}

impl DependencyType {
    /// Built-in types in collection order
    pub const BUILTIN: [DependencyType; 10] = [
        DependencyType::Local,
        DependencyType::Prod,
        DependencyType::Dev,
        DependencyType::Peer,
        DependencyType::Optional,
        DependencyType::Overrides,
        DependencyType::PnpmOverrides,
        DependencyType::Resolutions,
        DependencyType::PackageManager,
        DependencyType::Engines,
    ];

    /// Returns the name used in configuration
    pub fn as_str(&self) -> &str {
        match self {
            DependencyType::Local => "local",
            DependencyType::Prod => "prod",
            DependencyType::Dev => "dev",
            DependencyType::Peer => "peer",
            DependencyType::Optional => "optional",
            DependencyType::Overrides => "overrides",
            DependencyType::PnpmOverrides => "pnpmOverrides",
            DependencyType::Resolutions => "resolutions",
            DependencyType::PackageManager => "packageManager",
            DependencyType::Engines => "engines",
            DependencyType::Custom(name) => name,
        }
    }

    /// Where a built-in type is declared; None for custom types
    pub fn location(&self) -> Option<DependencyLocation> {
        let (pointer, strategy) = match self {
            DependencyType::Local => (
                "/version",
                Strategy::NameAndVersion {
                    name_pointer: "/name".to_string(),
                },
            ),
            DependencyType::Prod => ("/dependencies", Strategy::VersionsByName),
            DependencyType::Dev => ("/devDependencies", Strategy::VersionsByName),
            DependencyType::Peer => ("/peerDependencies", Strategy::VersionsByName),
            DependencyType::Optional => ("/optionalDependencies", Strategy::VersionsByName),
            DependencyType::Overrides => ("/overrides", Strategy::VersionsByName),
            DependencyType::PnpmOverrides => ("/pnpm/overrides", Strategy::VersionsByName),
            DependencyType::Resolutions => ("/resolutions", Strategy::VersionsByName),
            DependencyType::PackageManager => ("/packageManager", Strategy::NameAtVersion),
            DependencyType::Engines => ("/engines", Strategy::VersionsByName),
            DependencyType::Custom(_) => return None,
        };
        Some(DependencyLocation {
            dependency_type: self.clone(),
            pointer: pointer.to_string(),
            strategy,
        })
    }
}

impl std::str::FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DependencyType::BUILTIN
            .iter()
            .find(|builtin| builtin.as_str() == s)
            .cloned()
            .ok_or_else(|| format!("Unknown dependency type: {s:?}"))
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How names and versions are stored at a location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `{ "react": "18.0.0" }`
    VersionsByName,
    /// `"pnpm@8.15.0"`
    NameAtVersion,
    /// `"18.0.0"`, named after the dependency type
    VersionOnly,
    /// Name and version in separate fields
    NameAndVersion { name_pointer: String },
}

impl Strategy {
    fn from_config(name: &str, custom: &CustomTypeConfig) -> Result<Self, ConfigError> {
        match custom.strategy.as_str() {
            "versionsByName" => Ok(Strategy::VersionsByName),
            "name@version" => Ok(Strategy::NameAtVersion),
            "version" => Ok(Strategy::VersionOnly),
            "name~version" => match &custom.name_path {
                Some(path) => Ok(Strategy::NameAndVersion {
                    name_pointer: to_pointer(path),
                }),
                None => Err(ConfigError::MissingNamePath {
                    name: name.to_string(),
                }),
            },
            _ => Err(ConfigError::UnknownStrategy {
                name: name.to_string(),
                strategy: custom.strategy.clone(),
            }),
        }
    }
}

/// A dependency type with the JSON pointer and strategy used to read it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyLocation {
    pub dependency_type: DependencyType,
    pub pointer: String,
    pub strategy: Strategy,
}

/// Convert a dotted path (`pnpm.overrides`) to a JSON pointer (`/pnpm/overrides`)
pub fn to_pointer(path: &str) -> String {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Name filter with `**` and `!negation` support.
///
/// - empty or containing `**`: everything is allowed
/// - listed names are allowed, unlisted names are not
/// - `!name` disallows a name; once any negation is present, unlisted names
///   are allowed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilter {
    allowed: Vec<String>,
    denied: Vec<String>,
    allow_unlisted: bool,
}

impl TypeFilter {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let mut filter = Self {
            allow_unlisted: names.is_empty(),
            ..Self::default()
        };
        for name in names.iter().map(AsRef::as_ref) {
            if name == "**" {
                filter.allow_unlisted = true;
            } else if let Some(negated) = name.strip_prefix('!') {
                filter.denied.push(negated.to_string());
                filter.allow_unlisted = true;
            } else {
                filter.allowed.push(name.to_string());
            }
        }
        filter
    }

    pub fn allows(&self, name: &str) -> bool {
        if self.denied.iter().any(|denied| denied == name) {
            return false;
        }
        self.allow_unlisted || self.allowed.iter().any(|allowed| allowed == name)
    }

    /// Every name mentioned, with negations stripped
    pub fn mentioned(&self) -> impl Iterator<Item = &str> {
        self.allowed
            .iter()
            .chain(self.denied.iter())
            .map(String::as_str)
    }
}

/// Locations enabled by `dependencyTypes`, built-ins first, then custom types
/// in declaration order
pub fn enabled_locations(config: &Config, issues: &mut Vec<ConfigError>) -> Vec<DependencyLocation> {
    let filter = TypeFilter::new(&config.dependency_types);

    let mut locations: Vec<DependencyLocation> = DependencyType::BUILTIN
        .iter()
        .filter(|dependency_type| filter.allows(dependency_type.as_str()))
        .filter_map(DependencyType::location)
        .collect();

    let custom = config
        .custom_types
        .iter()
        .filter(|(name, _)| filter.allows(name))
        .filter_map(|(name, custom)| match Strategy::from_config(name, custom) {
            Ok(strategy) => Some(DependencyLocation {
                dependency_type: DependencyType::Custom(name.clone()),
                pointer: to_pointer(&custom.path),
                strategy,
            }),
            Err(issue) => {
                issues.push(issue);
                None
            }
        });

    locations.extend(custom);
    locations
}
