//! Predicates deciding which instances a group owns

use regex::Regex;

use crate::config::{ConfigError, LOCAL_KEYWORD, SelectorConfig};
use crate::instance::{DependencyInstance, TypeFilter};
use crate::specifier::Specifier;

#[derive(Debug, Clone)]
enum NamePattern {
    Exact(String),
    Glob(glob::Pattern),
    Regex(Regex),
}

impl NamePattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(exact) => exact == name,
            NamePattern::Glob(pattern) => pattern.matches(name),
            NamePattern::Regex(regex) => regex.is_match(name),
        }
    }
}

/// Names to include and exclude.
///
/// A list with no positive pattern includes every name not excluded.
#[derive(Debug, Clone, Default)]
struct NamePatterns {
    include: Vec<NamePattern>,
    exclude: Vec<NamePattern>,
    restricted: bool,
}

impl NamePatterns {
    fn compile(
        patterns: &[String],
        local_names: &[String],
        group: &str,
        issues: &mut Vec<ConfigError>,
    ) -> Self {
        let mut compiled = Self::default();

        for raw in patterns {
            let (negated, pattern) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            if !negated {
                compiled.restricted = true;
            }

            let parsed: Vec<NamePattern> = if pattern == LOCAL_KEYWORD {
                local_names
                    .iter()
                    .map(|name| NamePattern::Exact(name.clone()))
                    .collect()
            } else {
                match parse_pattern(pattern) {
                    Ok(parsed) => vec![parsed],
                    Err(message) => {
                        issues.push(ConfigError::InvalidPattern {
                            group: group.to_string(),
                            pattern: raw.clone(),
                            message,
                        });
                        Vec::new()
                    }
                }
            };

            if negated {
                compiled.exclude.extend(parsed);
            } else {
                compiled.include.extend(parsed);
            }
        }
        compiled
    }

    fn matches(&self, name: &str) -> bool {
        let included = !self.restricted || self.include.iter().any(|p| p.matches(name));
        included && !self.exclude.iter().any(|p| p.matches(name))
    }
}

/// `/regex/`, a glob when it contains `*`, `?` or `[`, else an exact name
fn parse_pattern(pattern: &str) -> Result<NamePattern, String> {
    if let Some(body) = pattern
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
        .filter(|body| !body.is_empty())
    {
        return Regex::new(body)
            .map(NamePattern::Regex)
            .map_err(|e| e.to_string());
    }
    if pattern.contains(['*', '?', '[']) {
        return glob::Pattern::new(pattern)
            .map(NamePattern::Glob)
            .map_err(|e| e.to_string());
    }
    Ok(NamePattern::Exact(pattern.to_string()))
}

/// Selector shared by version groups and semver groups
#[derive(Debug, Clone)]
pub struct GroupSelector {
    label: String,
    dependencies: NamePatterns,
    dependency_types: TypeFilter,
    packages: NamePatterns,
    specifier_types: TypeFilter,
    matches_nothing: bool,
}

impl GroupSelector {
    /// A selector matching every instance
    pub fn any(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            dependencies: NamePatterns::default(),
            dependency_types: TypeFilter::new::<&str>(&[]),
            packages: NamePatterns::default(),
            specifier_types: TypeFilter::new::<&str>(&[]),
            matches_nothing: false,
        }
    }

    /// Compile a selector. `group` names the group in reported issues, and is
    /// its label when none is configured. `local_names` are the packages
    /// developed in the workspace, for `$LOCAL`.
    pub fn compile(
        config: &SelectorConfig,
        group: &str,
        local_names: &[String],
        issues: &mut Vec<ConfigError>,
    ) -> Self {
        let matches_nothing = matches!(&config.dependencies, Some(names) if names.is_empty());
        if matches_nothing {
            issues.push(ConfigError::EmptyDependencies {
                group: group.to_string(),
            });
        }

        let dependencies = NamePatterns::compile(
            config.dependencies.as_deref().unwrap_or_default(),
            local_names,
            group,
            issues,
        );
        let packages = NamePatterns::compile(&config.packages, &[], group, issues);

        let specifier_types = TypeFilter::new(&config.specifier_types);
        for name in specifier_types.mentioned() {
            if !Specifier::TYPE_NAMES.iter().any(|known| *known == name) {
                issues.push(ConfigError::UnknownSpecifierType {
                    group: group.to_string(),
                    name: name.to_string(),
                });
            }
        }

        let label = if config.label.is_empty() {
            group.to_string()
        } else {
            config.label.clone()
        };

        Self {
            label,
            dependencies,
            dependency_types: TypeFilter::new(&config.dependency_types),
            packages,
            specifier_types,
            matches_nothing,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, instance: &DependencyInstance) -> bool {
        !self.matches_nothing
            && self.dependencies.matches(&instance.name)
            && self
                .dependency_types
                .allows(instance.dependency_type().as_str())
            && self.packages.matches(&instance.package_name)
            && self.specifier_types.allows(instance.specifier.type_name())
    }
}
