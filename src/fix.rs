//! Applying fixable mismatches to manifests
//!
//! The input manifests are never touched: fixes are applied to copies, which
//! the caller hands to the writer. Applying the same fixes twice changes
//! nothing the second time.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detect::{Mismatch, Reason};
use crate::instance::{DependencyInstance, InstanceId};
use crate::manifest::Manifest;

/// One specifier rewritten in one manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    pub instance: InstanceId,
    pub manifest: PathBuf,
    pub dependency: String,
    pub dependency_type: String,
    pub previous: String,
    pub next: String,
}

/// Why a mismatch, or one of its instances, was left alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum SkipReason {
    /// No correct specifier can be derived
    Unfixable { reason: Reason },
    /// The instance was already claimed by another fix with a different value
    ConflictingFix { instance: InstanceId, planned: String },
    /// The specifier could not be found where it was collected from
    TargetMissing { instance: InstanceId, message: String },
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::Unfixable { .. } => "unfixable",
            SkipReason::ConflictingFix { .. } => "conflicting-fix",
            SkipReason::TargetMissing { .. } => "target-missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFix {
    pub mismatch: Mismatch,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct FixResult {
    /// Copies of the input manifests with fixes applied
    pub manifests: Vec<Manifest>,
    pub applied: Vec<AppliedFix>,
    pub skipped: Vec<SkippedFix>,
}

struct PlannedEdit<'a> {
    instance: &'a DependencyInstance,
    next: &'a str,
    mismatch: &'a Mismatch,
}

/// Apply every fixable mismatch to copies of `manifests`.
///
/// `instances` must be the instances the mismatches were detected from.
pub fn fix(
    manifests: &[Manifest],
    instances: &[DependencyInstance],
    mismatches: &[Mismatch],
) -> FixResult {
    let mut skipped = Vec::new();
    let mut claimed: HashMap<InstanceId, &str> = HashMap::new();
    let mut edits: BTreeMap<usize, Vec<PlannedEdit<'_>>> = BTreeMap::new();

    for mismatch in mismatches {
        let next = match mismatch.expected.as_deref() {
            Some(next) if mismatch.reason.is_fixable() => next,
            _ => {
                debug!(
                    "Not fixing {} in {}: {}",
                    mismatch.dependency,
                    mismatch.group.label,
                    mismatch.reason.code()
                );
                skipped.push(SkippedFix {
                    mismatch: mismatch.clone(),
                    reason: SkipReason::Unfixable {
                        reason: mismatch.reason,
                    },
                });
                continue;
            }
        };

        for &id in &mismatch.instances {
            let Some(instance) = instances.get(id.0) else {
                skipped.push(SkippedFix {
                    mismatch: mismatch.clone(),
                    reason: SkipReason::TargetMissing {
                        instance: id,
                        message: format!("no instance {id}"),
                    },
                });
                continue;
            };
            match claimed.get(&id) {
                Some(planned) if *planned != next => {
                    warn!(
                        "Conflicting fixes for {} in {}: {} and {}",
                        instance.name, instance.package_name, planned, next
                    );
                    skipped.push(SkippedFix {
                        mismatch: mismatch.clone(),
                        reason: SkipReason::ConflictingFix {
                            instance: id,
                            planned: planned.to_string(),
                        },
                    });
                }
                Some(_) => {}
                None => {
                    claimed.insert(id, next);
                    edits
                        .entry(instance.manifest_index)
                        .or_default()
                        .push(PlannedEdit {
                            instance,
                            next,
                            mismatch,
                        });
                }
            }
        }
    }

    let mut fixed = manifests.to_vec();
    let mut applied = Vec::new();
    for (manifest_index, planned) in edits {
        let Some(manifest) = fixed.get_mut(manifest_index) else {
            for edit in planned {
                skipped.push(missing(edit, "manifest not loaded".to_string()));
            }
            continue;
        };
        for edit in planned {
            let instance = edit.instance;
            match manifest.set_specifier(&instance.location, &instance.name, edit.next) {
                Ok(true) => {
                    info!(
                        "{}: {} {} -> {}",
                        manifest.path().display(),
                        instance.name,
                        instance.raw(),
                        edit.next
                    );
                    applied.push(AppliedFix {
                        instance: instance.id,
                        manifest: manifest.path().to_path_buf(),
                        dependency: instance.name.clone(),
                        dependency_type: instance.dependency_type().to_string(),
                        previous: instance.raw().to_string(),
                        next: edit.next.to_string(),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Cannot fix {} in {}: {}", instance.name, manifest.path().display(), e);
                    skipped.push(missing(edit, e.to_string()));
                }
            }
        }
    }
    applied.sort_by_key(|fix| fix.instance);

    FixResult {
        manifests: fixed,
        applied,
        skipped,
    }
}

fn missing(edit: PlannedEdit<'_>, message: String) -> SkippedFix {
    SkippedFix {
        mismatch: edit.mismatch.clone(),
        reason: SkipReason::TargetMissing {
            instance: edit.instance.id,
            message,
        },
    }
}
