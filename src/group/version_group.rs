use tracing::debug;

use crate::config::{ConfigError, VersionGroupConfig};
use crate::group::Grouped;
use crate::group::policy::{PreferVersion, VersionPolicy};
use crate::group::selector::GroupSelector;
use crate::specifier::Specifier;

pub const DEFAULT_VERSION_GROUP_LABEL: &str = "Default Version Group";

#[derive(Debug, Clone)]
pub struct VersionGroup {
    /// Position in declaration order; the catch-all comes last
    pub index: usize,
    pub selector: GroupSelector,
    pub policy: VersionPolicy,
}

impl VersionGroup {
    /// Compile a configured group. Problems are pushed to `issues` and the
    /// group keeps its best-effort policy so that group indices stay stable.
    pub fn from_config(
        index: usize,
        config: &VersionGroupConfig,
        local_names: &[String],
        issues: &mut Vec<ConfigError>,
    ) -> Self {
        let name = describe(index, &config.selector.label);
        let selector = GroupSelector::compile(&config.selector, &name, local_names, issues);
        let policy = policy_from_config(config, &name, issues);
        debug!("{} uses policy {}", name, policy.name());

        Self {
            index,
            selector,
            policy,
        }
    }

    /// The implicit group owning every instance no configured group matched
    pub fn catch_all(index: usize) -> Self {
        Self {
            index,
            selector: GroupSelector::any(DEFAULT_VERSION_GROUP_LABEL),
            policy: VersionPolicy::Standard(PreferVersion::HighestSemver),
        }
    }

    pub fn label(&self) -> &str {
        self.selector.label()
    }
}

impl Grouped for VersionGroup {
    fn selector(&self) -> &GroupSelector {
        &self.selector
    }
}

fn describe(index: usize, label: &str) -> String {
    if label.is_empty() {
        format!("versionGroups[{index}]")
    } else {
        format!("versionGroups[{index}] ({label})")
    }
}

/// Pick the policy. When several are set the first of banned, ignored,
/// pinned, sameRange, snappedTo, standard wins and a conflict is reported.
fn policy_from_config(
    config: &VersionGroupConfig,
    name: &str,
    issues: &mut Vec<ConfigError>,
) -> VersionPolicy {
    let same_range = match config.policy.as_deref() {
        None => false,
        Some("sameRange") => true,
        Some(other) => {
            issues.push(ConfigError::UnknownPolicy {
                group: name.to_string(),
                policy: other.to_string(),
            });
            false
        }
    };

    let mut candidates: Vec<VersionPolicy> = Vec::new();
    if config.is_banned {
        candidates.push(VersionPolicy::Banned);
    }
    if config.is_ignored {
        candidates.push(VersionPolicy::Ignored);
    }
    if let Some(pin) = &config.pin_version {
        let specifier = Specifier::parse(pin);
        if specifier.is_unparsable() {
            issues.push(ConfigError::UnparsablePin {
                group: name.to_string(),
                version: pin.clone(),
            });
        }
        candidates.push(VersionPolicy::Pinned(specifier));
    }
    if same_range {
        candidates.push(VersionPolicy::SameRange);
    }
    if let Some(sources) = &config.snap_to {
        candidates.push(VersionPolicy::SnappedTo(sources.clone()));
    }
    if let Some(prefer) = &config.prefer_version {
        let prefer = prefer.parse().unwrap_or_else(|e| {
            debug!("{}: {}", name, e);
            issues.push(ConfigError::UnknownPreferVersion {
                group: name.to_string(),
                value: prefer.clone(),
            });
            PreferVersion::default()
        });
        candidates.push(VersionPolicy::Standard(prefer));
    }

    let mut candidates = candidates.into_iter();
    let policy = candidates
        .next()
        .unwrap_or(VersionPolicy::Standard(PreferVersion::default()));
    if candidates.next().is_some() {
        issues.push(ConfigError::ConflictingPolicy {
            group: name.to_string(),
            used: policy.name(),
        });
    }
    policy
}
