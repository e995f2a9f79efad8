use std::collections::HashMap;

use crate::detect::mismatch::{Finding, Reason};
use crate::group::{Assignment, GroupSet, PreferVersion, VersionPolicy};
use crate::instance::{DependencyInstance, InstanceId};
use crate::specifier::{
    Comparison, RangeOperator, Specifier, VersionRange, compare, preferred, same_version,
};

/// State shared by every policy while detecting
pub(crate) struct Context<'a> {
    pub instances: &'a [DependencyInstance],
    pub groups: &'a GroupSet,
    pub assignment: &'a Assignment,
    /// Specifiers instances will have once the fixable findings so far are applied
    pub projected: HashMap<InstanceId, String>,
}

impl<'a> Context<'a> {
    pub fn new(
        instances: &'a [DependencyInstance],
        groups: &'a GroupSet,
        assignment: &'a Assignment,
    ) -> Self {
        Self {
            instances,
            groups,
            assignment,
            projected: HashMap::new(),
        }
    }

    /// Record the fixable findings of one dependency so later groups see
    /// their outcome
    pub fn project(&mut self, findings: &[Finding]) {
        for finding in findings.iter().filter(|finding| finding.reason.is_fixable()) {
            if let Some(expected) = &finding.expected {
                self.projected.insert(finding.instance, expected.clone());
            }
        }
    }

    fn current_value(&self, instance: &'a DependencyInstance) -> &str {
        self.projected
            .get(&instance.id)
            .map(String::as_str)
            .unwrap_or_else(|| instance.raw())
    }

    /// Operator the owning semver group wants, if it has a say.
    ///
    /// A package's own version and instances of pinned groups are never
    /// range-constrained.
    fn preferred_operator(&self, instance: &DependencyInstance) -> Option<RangeOperator> {
        if instance.is_local() {
            return None;
        }
        let version_group = &self.groups.version_groups[self.assignment.version_group(instance.id)];
        if matches!(version_group.policy, VersionPolicy::Pinned(_)) {
            return None;
        }
        self.groups.semver_groups[self.assignment.semver_group(instance.id)]
            .policy
            .operator()
    }

    /// The specifier an instance will have once its semver group's operator
    /// is applied
    fn planned(&self, instance: &DependencyInstance) -> Specifier {
        self.preferred_operator(instance)
            .and_then(|operator| instance.specifier.with_operator(operator))
            .unwrap_or_else(|| instance.specifier.clone())
    }
}

fn finding(instance: &DependencyInstance, reason: Reason, expected: Option<String>) -> Finding {
    Finding {
        instance: instance.id,
        actual: instance.raw().to_string(),
        reason,
        expected,
    }
}

/// Evaluate one dependency's instances within one version group
pub(crate) fn evaluate(
    ctx: &Context<'_>,
    policy: &VersionPolicy,
    members: &[&DependencyInstance],
) -> Vec<Finding> {
    let mut findings = match policy {
        VersionPolicy::Ignored => Vec::new(),
        VersionPolicy::Banned => banned(members),
        VersionPolicy::Pinned(pin) => pinned(pin, members),
        VersionPolicy::SameRange => same_range(ctx, members),
        VersionPolicy::SnappedTo(sources) => snapped_to(ctx, sources, members),
        VersionPolicy::Standard(prefer) => standard(ctx, *prefer, members),
    };
    findings.sort_by_key(|finding| finding.instance);
    findings
}

/// Check an instance against the specifier its group settled on, applying
/// the operator its semver group prefers
fn check_against(
    ctx: &Context<'_>,
    instance: &DependencyInstance,
    base: &Specifier,
    reason: Reason,
) -> Option<Finding> {
    if instance.specifier.is_unparsable() {
        return Some(finding(instance, Reason::UnparsableSpecifier, None));
    }

    let ranged = ctx
        .preferred_operator(instance)
        .and_then(|operator| Some((operator, base.with_operator(operator)?)));
    let expected = match &ranged {
        Some((operator, _)) if !operator.admits_own_version() => {
            return Some(finding(instance, Reason::RangeConflict, None));
        }
        Some((_, expected)) => expected,
        None => base,
    };

    match compare(&instance.specifier, expected) {
        Comparison::Equal => None,
        Comparison::Incomparable => Some(finding(instance, Reason::IncompatibleSpecifierKind, None)),
        Comparison::Different => {
            let reason = if ranged.is_some() && same_version(&instance.specifier, expected) {
                Reason::SemverRangeMismatch
            } else {
                reason
            };
            Some(finding(instance, reason, Some(expected.raw().to_string())))
        }
    }
}

fn banned(members: &[&DependencyInstance]) -> Vec<Finding> {
    members
        .iter()
        .map(|instance| {
            let reason = if instance.is_local() {
                Reason::RefuseToChangeLocal
            } else {
                Reason::Banned
            };
            finding(instance, reason, None)
        })
        .collect()
}

fn pinned(pin: &Specifier, members: &[&DependencyInstance]) -> Vec<Finding> {
    members
        .iter()
        .filter_map(|instance| {
            if instance.specifier.is_unparsable() {
                return Some(finding(instance, Reason::UnparsableSpecifier, None));
            }
            match compare(&instance.specifier, pin) {
                Comparison::Equal => None,
                _ if instance.is_local() => Some(finding(instance, Reason::RefuseToChangeLocal, None)),
                Comparison::Different => Some(finding(
                    instance,
                    Reason::PinMismatch,
                    Some(pin.raw().to_string()),
                )),
                Comparison::Incomparable => {
                    Some(finding(instance, Reason::IncompatibleSpecifierKind, None))
                }
            }
        })
        .collect()
}

/// Findings for opaque specifiers, which only agree when identical and never
/// with semver ones
fn opaque_findings(
    opaque: &[&DependencyInstance],
    has_semver: bool,
    findings: &mut Vec<Finding>,
) {
    let all_same = opaque.windows(2).all(|pair| pair[0].raw() == pair[1].raw());
    for instance in opaque {
        if has_semver {
            findings.push(finding(instance, Reason::IncompatibleSpecifierKind, None));
        } else if !all_same {
            findings.push(finding(instance, Reason::NonSemverMismatch, None));
        }
    }
}

fn standard(
    ctx: &Context<'_>,
    prefer: PreferVersion,
    members: &[&DependencyInstance],
) -> Vec<Finding> {
    if members.iter().any(|instance| instance.is_local()) {
        return with_local(ctx, members);
    }

    let mut findings = Vec::new();
    let (unparsable, parsable): (Vec<&DependencyInstance>, Vec<&DependencyInstance>) = members
        .iter()
        .copied()
        .partition(|instance| instance.specifier.is_unparsable());
    let (semver, opaque): (Vec<&DependencyInstance>, Vec<&DependencyInstance>) = parsable
        .into_iter()
        .partition(|instance| instance.specifier.is_semver());

    for instance in &unparsable {
        findings.push(finding(instance, Reason::UnparsableSpecifier, None));
    }

    // Rank by what each instance will become, so an instance its semver group
    // turns into `*` outranks the rest before the fix rather than after it
    let planned: Vec<Specifier> = semver.iter().map(|instance| ctx.planned(instance)).collect();
    let highest = prefer == PreferVersion::HighestSemver;
    if let Some(index) = preferred(&planned, highest) {
        // `*` has no version of its own to carry over
        let base = if planned[index].operator() == Some(RangeOperator::Any) {
            &planned[index]
        } else {
            &semver[index].specifier
        };
        let reason = if highest {
            Reason::HighestSemverMismatch
        } else {
            Reason::LowestSemverMismatch
        };
        for instance in &semver {
            match check_against(ctx, instance, base, reason) {
                Some(found) => findings.push(found),
                None if !opaque.is_empty() => {
                    findings.push(finding(instance, Reason::IncompatibleSpecifierKind, None));
                }
                None => {}
            }
        }
    }
    opaque_findings(&opaque, !semver.is_empty(), &mut findings);

    findings
}

/// Standard policy for a dependency developed in the workspace: its own
/// version is authoritative
fn with_local(ctx: &Context<'_>, members: &[&DependencyInstance]) -> Vec<Finding> {
    let locals: Vec<&DependencyInstance> = members
        .iter()
        .copied()
        .filter(|instance| instance.is_local())
        .collect();
    let local = locals[0];
    let valid = local.specifier.is_exact() && locals.iter().all(|other| other.raw() == local.raw());

    if !valid {
        return members
            .iter()
            .map(|instance| {
                let reason = if instance.is_local() {
                    Reason::InvalidLocalVersion
                } else {
                    Reason::DependsOnInvalidLocalVersion
                };
                finding(instance, reason, None)
            })
            .collect();
    }

    members
        .iter()
        .filter(|instance| !instance.is_local())
        .filter(|instance| !matches!(instance.specifier, Specifier::WorkspaceProtocol(_)))
        .filter_map(|instance| {
            check_against(ctx, instance, &local.specifier, Reason::LocalVersionMismatch)
        })
        .collect()
}

/// What a semver group's operator does to one instance of a sameRange group
enum Rewrite {
    Keep,
    /// The operator excludes the version, or the rewritten range neither
    /// contains nor fits within the current one
    Conflict,
    /// The rewritten range contains the current one
    Widen(Specifier, VersionRange),
    /// The rewritten range fits within the current one
    Narrow(Specifier, VersionRange),
}

impl Rewrite {
    fn of(ctx: &Context<'_>, instance: &DependencyInstance, range: &VersionRange) -> Self {
        let Some(operator) = ctx.preferred_operator(instance) else {
            return Rewrite::Keep;
        };
        if !operator.admits_own_version() {
            return Rewrite::Conflict;
        }
        let Some(rewritten) = instance
            .specifier
            .with_operator(operator)
            .filter(|rewritten| rewritten.raw() != instance.raw())
        else {
            return Rewrite::Keep;
        };
        let Some(rewritten_range) = rewritten.version_range() else {
            return Rewrite::Keep;
        };
        if rewritten_range.covers(range) {
            Rewrite::Widen(rewritten, rewritten_range)
        } else if range.covers(&rewritten_range) {
            Rewrite::Narrow(rewritten, rewritten_range)
        } else {
            Rewrite::Conflict
        }
    }
}

fn same_range(ctx: &Context<'_>, members: &[&DependencyInstance]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut semver = Vec::new();
    let mut opaque = Vec::new();
    for instance in members.iter().copied() {
        if instance.specifier.is_unparsable() {
            findings.push(finding(instance, Reason::UnparsableSpecifier, None));
        } else if let Some(range) = instance.specifier.version_range() {
            semver.push((instance, range));
        } else {
            opaque.push(instance);
        }
    }

    let rewrites: Vec<Rewrite> = semver
        .iter()
        .map(|(instance, range)| Rewrite::of(ctx, instance, range))
        .collect();
    let disjoint: Vec<bool> = semver
        .iter()
        .enumerate()
        .map(|(position, (_, range))| {
            semver
                .iter()
                .enumerate()
                .any(|(other, (_, other_range))| other != position && !range.intersects(other_range))
        })
        .collect();

    for (position, (instance, _)) in semver.iter().enumerate() {
        if disjoint[position] {
            findings.push(finding(instance, Reason::SameRangeMismatch, None));
            continue;
        }
        let rewritten = match &rewrites[position] {
            Rewrite::Keep => continue,
            Rewrite::Conflict => None,
            Rewrite::Widen(rewritten, _) => Some(rewritten),
            Rewrite::Narrow(rewritten, narrowed) => {
                // Must overlap whatever every other instance ends up as,
                // including rewrites that might be applied alongside it
                let fits = semver
                    .iter()
                    .zip(&rewrites)
                    .zip(&disjoint)
                    .enumerate()
                    .filter(|(other, _)| *other != position)
                    .all(|(_, (((_, other_range), other_rewrite), other_disjoint))| {
                        match other_rewrite {
                            Rewrite::Widen(_, widened) if !other_disjoint => narrowed.intersects(widened),
                            Rewrite::Narrow(_, other_narrowed) => {
                                narrowed.intersects(other_range) && narrowed.intersects(other_narrowed)
                            }
                            _ => narrowed.intersects(other_range),
                        }
                    });
                fits.then_some(rewritten)
            }
        };
        findings.push(match rewritten {
            Some(rewritten) => finding(
                instance,
                Reason::SemverRangeMismatch,
                Some(rewritten.raw().to_string()),
            ),
            None => finding(instance, Reason::RangeConflict, None),
        });
    }
    opaque_findings(&opaque, !semver.is_empty(), &mut findings);

    findings
}

fn snapped_to(
    ctx: &Context<'_>,
    sources: &[String],
    members: &[&DependencyInstance],
) -> Vec<Finding> {
    let Some(first) = members.first() else {
        return Vec::new();
    };
    let is_source = |instance: &DependencyInstance| sources.contains(&instance.package_name);

    let mut values: Vec<&str> = Vec::new();
    for instance in ctx
        .instances
        .iter()
        .filter(|instance| instance.name == first.name && !instance.is_local() && is_source(*instance))
    {
        let value = ctx.current_value(instance);
        if !values.contains(&value) {
            values.push(value);
        }
    }

    let targets = members.iter().copied().filter(|instance| !is_source(*instance));
    match values.as_slice() {
        [value] => {
            let base = Specifier::parse(value);
            targets
                .filter_map(|instance| {
                    if instance.is_local() {
                        return (compare(&instance.specifier, &base) != Comparison::Equal)
                            .then(|| finding(instance, Reason::RefuseToChangeLocal, None));
                    }
                    check_against(ctx, instance, &base, Reason::SnapToMismatch)
                })
                .collect()
        }
        _ => {
            let reason = if values.is_empty() {
                Reason::SnapToSourceNotFound
            } else {
                Reason::SnapToSourceAmbiguous
            };
            targets
                .filter(|instance| !instance.is_local())
                .map(|instance| finding(instance, reason, None))
                .collect()
        }
    }
}
