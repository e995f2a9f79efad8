//! Mismatch detection
//!
//! Every version group is evaluated per dependency name. Snapped groups are
//! evaluated after all others, sources first, so that they see the
//! specifiers their source packages will have once fixable mismatches are
//! applied.
//!
//! ```text
//! instances ──► assign ──► per group, per dependency ──► evaluate ──► coalesce
//! ```

mod evaluate;
pub mod mismatch;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::group::{Assignment, GroupSet, VersionGroup, VersionPolicy, assign};
use crate::instance::{DependencyInstance, InstanceId};

use evaluate::{Context, evaluate};
pub use mismatch::{GroupRef, Mismatch, Reason};
use mismatch::Finding;

/// Result of running detection over a set of instances
#[derive(Debug)]
pub struct Detection {
    pub groups: GroupSet,
    pub assignment: Assignment,
    /// Ordered by version group, then by first appearance of the dependency
    pub mismatches: Vec<Mismatch>,
    /// Configuration problems found while compiling groups
    pub issues: Vec<ConfigError>,
}

impl Detection {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn fixable(&self) -> impl Iterator<Item = &Mismatch> {
        self.mismatches.iter().filter(|mismatch| mismatch.is_fixable())
    }
}

/// Compile the configured groups and detect mismatches
pub fn detect(instances: &[DependencyInstance], config: &Config) -> Detection {
    let (groups, issues) = GroupSet::compile(config, instances);
    let mut detection = detect_with_groups(instances, groups);
    detection.issues = issues;
    detection
}

/// Detect mismatches using already compiled groups
pub fn detect_with_groups(instances: &[DependencyInstance], groups: GroupSet) -> Detection {
    let assignment = assign(instances, &groups);
    let mut ctx = Context::new(instances, &groups, &assignment);
    let mut mismatches = Vec::new();

    let (snapped, others): (Vec<&VersionGroup>, Vec<&VersionGroup>) = groups
        .version_groups
        .iter()
        .partition(|group| matches!(group.policy, VersionPolicy::SnappedTo(_)));

    let snapped = snap_order(snapped, instances, &assignment);
    for group in others.into_iter().chain(snapped) {
        for (dependency, members) in dependencies_of(instances, &assignment, group.index) {
            let findings = evaluate(&ctx, &group.policy, &members);
            debug!(
                "{} in {}: {} of {} instances mismatched",
                dependency,
                group.label(),
                findings.len(),
                members.len()
            );
            ctx.project(&findings);
            mismatches.extend(coalesce(group, dependency, findings));
        }
    }
    mismatches.sort_by_key(|mismatch| mismatch.group.index);

    info!(
        "{} instances checked, {} mismatches found",
        instances.len(),
        mismatches.len()
    );

    Detection {
        groups,
        assignment,
        mismatches,
        issues: Vec::new(),
    }
}

/// Order snapped groups so that a group reading a package's version comes
/// after the snapped group that owns that package's instances.
///
/// Groups that depend on each other in a cycle keep their declaration order.
fn snap_order<'g>(
    snapped: Vec<&'g VersionGroup>,
    instances: &[DependencyInstance],
    assignment: &Assignment,
) -> Vec<&'g VersionGroup> {
    let count = snapped.len();
    // readers[j]: positions of the groups that read a package owned by group j
    let mut readers: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut waiting_on = vec![0usize; count];
    for (owner, owner_group) in snapped.iter().enumerate() {
        for (reader, reader_group) in snapped.iter().enumerate() {
            let VersionPolicy::SnappedTo(sources) = &reader_group.policy else {
                continue;
            };
            let feeds = owner != reader
                && instances.iter().any(|instance| {
                    assignment.version_group(instance.id) == owner_group.index
                        && sources.contains(&instance.package_name)
                });
            if feeds {
                readers[owner].push(reader);
                waiting_on[reader] += 1;
            }
        }
    }

    let mut done = vec![false; count];
    let mut order = Vec::with_capacity(count);
    while order.len() < count {
        let ready = (0..count).find(|&position| !done[position] && waiting_on[position] == 0);
        let next = match ready {
            Some(position) => position,
            None => {
                let Some(position) = (0..count).find(|&position| !done[position]) else {
                    break;
                };
                warn!(
                    "{} snaps to packages in a cycle of snapped groups",
                    snapped[position].label()
                );
                position
            }
        };
        done[next] = true;
        for &reader in &readers[next] {
            waiting_on[reader] = waiting_on[reader].saturating_sub(1);
        }
        order.push(snapped[next]);
    }
    order
}

/// Members of a version group keyed by dependency name, in first-seen order
fn dependencies_of<'a>(
    instances: &'a [DependencyInstance],
    assignment: &Assignment,
    group: usize,
) -> IndexMap<&'a str, Vec<&'a DependencyInstance>> {
    let mut dependencies: IndexMap<&str, Vec<&DependencyInstance>> = IndexMap::new();
    for InstanceId(id) in assignment.version_group_members(group) {
        let instance = &instances[id];
        dependencies
            .entry(instance.name.as_str())
            .or_default()
            .push(instance);
    }
    dependencies
}

/// Merge findings that share a reason, actual and expected specifier
fn coalesce(group: &VersionGroup, dependency: &str, findings: Vec<Finding>) -> Vec<Mismatch> {
    let mut merged: IndexMap<(Reason, String, Option<String>), Vec<InstanceId>> = IndexMap::new();
    for finding in findings {
        merged
            .entry((finding.reason, finding.actual, finding.expected))
            .or_default()
            .push(finding.instance);
    }

    merged
        .into_iter()
        .map(|((reason, actual, expected), instances)| Mismatch {
            group: GroupRef {
                index: group.index,
                label: group.label().to_string(),
                policy: group.policy.name(),
            },
            dependency: dependency.to_string(),
            instances,
            actual,
            expected,
            reason,
        })
        .collect()
}

#[cfg(test)]
mod tests;
