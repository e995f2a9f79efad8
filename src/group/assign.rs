use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::group::Grouped;
use crate::group::semver_group::SemverGroup;
use crate::group::version_group::VersionGroup;
use crate::instance::{DependencyInstance, InstanceId};

/// Compiled version and semver groups, each ending with its catch-all
#[derive(Debug, Clone)]
pub struct GroupSet {
    pub version_groups: Vec<VersionGroup>,
    pub semver_groups: Vec<SemverGroup>,
}

impl GroupSet {
    /// Compile the groups declared in `config`. Names of packages developed
    /// in the workspace (for `$LOCAL`) are taken from `instances`.
    pub fn compile(config: &Config, instances: &[DependencyInstance]) -> (Self, Vec<ConfigError>) {
        let local_names = local_package_names(instances);
        let mut issues = Vec::new();

        let mut version_groups: Vec<VersionGroup> = config
            .version_groups
            .iter()
            .enumerate()
            .map(|(index, group)| VersionGroup::from_config(index, group, &local_names, &mut issues))
            .collect();
        version_groups.push(VersionGroup::catch_all(version_groups.len()));

        let mut semver_groups: Vec<SemverGroup> = config
            .semver_groups
            .iter()
            .enumerate()
            .map(|(index, group)| SemverGroup::from_config(index, group, &local_names, &mut issues))
            .collect();
        semver_groups.push(SemverGroup::catch_all(semver_groups.len()));

        (
            Self {
                version_groups,
                semver_groups,
            },
            issues,
        )
    }
}

/// Names of the packages whose own `version` was collected, in first-seen order
pub fn local_package_names(instances: &[DependencyInstance]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for instance in instances.iter().filter(|instance| instance.is_local()) {
        if !names.contains(&instance.name) {
            names.push(instance.name.clone());
        }
    }
    names
}

/// Group index of every instance, indexed by [`InstanceId`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    version_groups: Vec<usize>,
    semver_groups: Vec<usize>,
}

impl Assignment {
    pub fn version_group(&self, id: InstanceId) -> usize {
        self.version_groups[id.0]
    }

    pub fn semver_group(&self, id: InstanceId) -> usize {
        self.semver_groups[id.0]
    }

    /// Instances owned by a version group, in collection order
    pub fn version_group_members(&self, group: usize) -> impl Iterator<Item = InstanceId> + '_ {
        self.version_groups
            .iter()
            .enumerate()
            .filter(move |(_, owner)| **owner == group)
            .map(|(id, _)| InstanceId(id))
    }
}

/// Index of the first group whose selector matches
pub fn first_match<G: Grouped>(groups: &[G], instance: &DependencyInstance) -> Option<usize> {
    groups
        .iter()
        .position(|group| group.selector().matches(instance))
}

/// Assign every instance to exactly one version group and one semver group.
///
/// Groups are tried in declaration order and the first match wins. The
/// trailing catch-all groups match everything, so every instance is owned.
pub fn assign(instances: &[DependencyInstance], groups: &GroupSet) -> Assignment {
    let last_version = groups.version_groups.len().saturating_sub(1);
    let last_semver = groups.semver_groups.len().saturating_sub(1);

    let (version_groups, semver_groups): (Vec<usize>, Vec<usize>) = instances
        .iter()
        .map(|instance| {
            let version = first_match(&groups.version_groups, instance).unwrap_or(last_version);
            let semver = first_match(&groups.semver_groups, instance).unwrap_or(last_semver);
            debug!(
                "{} {} in {}: version group {}, semver group {}",
                instance.dependency_type(),
                instance.name,
                instance.package_name,
                version,
                semver
            );
            (version, semver)
        })
        .unzip();

    Assignment {
        version_groups,
        semver_groups,
    }
}
