//! Structured results of a run, rendered as text or JSON

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::detect::{Detection, Mismatch, Reason};
use crate::fix::{AppliedFix, FixResult, SkippedFix};
use crate::format::FormatMismatch;
use crate::instance::{DependencyInstance, InstanceId};
use crate::manifest::{LoadFailure, WriteOutcome};

/// A file that could not be loaded or written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProblem {
    pub path: PathBuf,
    pub message: String,
}

/// Where a mismatched instance is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceReport {
    pub id: InstanceId,
    pub package: String,
    pub manifest: PathBuf,
    pub dependency_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchReport {
    pub group_index: usize,
    pub group: String,
    pub policy: &'static str,
    pub dependency: String,
    pub reason: Reason,
    pub fixable: bool,
    pub actual: String,
    pub expected: Option<String>,
    pub instances: Vec<InstanceReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub manifests: usize,
    pub instances: usize,
    pub mismatches: usize,
    pub fixable: usize,
    pub applied: usize,
    pub skipped: usize,
    pub written: usize,
    pub format_mismatches: usize,
}

/// Everything a `lint` or `fix` run found and did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: Summary,
    pub load_failures: Vec<FileProblem>,
    pub config_issues: Vec<String>,
    pub mismatches: Vec<MismatchReport>,
    pub format_mismatches: Vec<FormatMismatch>,
    pub applied: Vec<AppliedFix>,
    pub skipped: Vec<SkippedFix>,
    pub write_failures: Vec<FileProblem>,
}

impl Report {
    /// Report the detection over `instances` loaded from `manifests` files
    pub fn new(manifests: usize, instances: &[DependencyInstance], detection: &Detection) -> Self {
        let mismatches: Vec<MismatchReport> = detection
            .mismatches
            .iter()
            .map(|mismatch| mismatch_report(mismatch, instances))
            .collect();

        Self {
            summary: Summary {
                manifests,
                instances: instances.len(),
                mismatches: mismatches.len(),
                fixable: detection.fixable().count(),
                ..Summary::default()
            },
            config_issues: detection.issues.iter().map(ToString::to_string).collect(),
            mismatches,
            ..Self::default()
        }
    }

    pub fn with_load_failures(mut self, failures: &[LoadFailure]) -> Self {
        self.load_failures = failures
            .iter()
            .map(|failure| FileProblem {
                path: failure.path.clone(),
                message: failure.error.to_string(),
            })
            .collect();
        self
    }

    pub fn with_format(mut self, mismatches: &[FormatMismatch]) -> Self {
        self.summary.format_mismatches = mismatches.len();
        self.format_mismatches = mismatches.to_vec();
        self
    }

    pub fn with_fix(mut self, result: &FixResult) -> Self {
        self.summary.applied = result.applied.len();
        self.summary.skipped = result.skipped.len();
        self.applied = result.applied.clone();
        self.skipped = result.skipped.clone();
        self
    }

    pub fn with_write(mut self, outcome: &WriteOutcome) -> Self {
        self.summary.written = outcome.written.len();
        self.write_failures = outcome
            .failures
            .iter()
            .map(|failure| FileProblem {
                path: failure.path.clone(),
                message: failure.error.to_string(),
            })
            .collect();
        self
    }

    /// Whether anything still needs attention after a `lint` run
    pub fn has_mismatches(&self) -> bool {
        !self.mismatches.is_empty()
            || !self.format_mismatches.is_empty()
            || !self.load_failures.is_empty()
    }

    /// Whether anything still needs attention after a `fix` run
    pub fn has_unresolved(&self) -> bool {
        !self.skipped.is_empty() || !self.load_failures.is_empty() || !self.write_failures.is_empty()
    }
}

fn mismatch_report(mismatch: &Mismatch, instances: &[DependencyInstance]) -> MismatchReport {
    MismatchReport {
        group_index: mismatch.group.index,
        group: mismatch.group.label.clone(),
        policy: mismatch.group.policy,
        dependency: mismatch.dependency.clone(),
        reason: mismatch.reason,
        fixable: mismatch.is_fixable(),
        actual: mismatch.actual.clone(),
        expected: mismatch.expected.clone(),
        instances: mismatch
            .instances
            .iter()
            .filter_map(|id| instances.get(id.0))
            .map(|instance| InstanceReport {
                id: instance.id,
                package: instance.package_name.clone(),
                manifest: instance.manifest_path.clone(),
                dependency_type: instance.dependency_type().to_string(),
            })
            .collect(),
    }
}

pub fn render_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Human-readable rendering, mismatches grouped by version group and dependency
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();

    for problem in &report.load_failures {
        line(&mut out, format!("! failed to load {}: {}", problem.path.display(), problem.message));
    }
    for issue in &report.config_issues {
        line(&mut out, format!("! config: {issue}"));
    }

    let mut groups: IndexMap<(usize, &str), IndexMap<&str, Vec<&MismatchReport>>> = IndexMap::new();
    for mismatch in &report.mismatches {
        groups
            .entry((mismatch.group_index, mismatch.group.as_str()))
            .or_default()
            .entry(mismatch.dependency.as_str())
            .or_default()
            .push(mismatch);
    }

    for ((_, label), dependencies) in &groups {
        line(&mut out, format!("= {label} ="));
        for (dependency, mismatches) in dependencies {
            line(&mut out, format!("  {dependency}"));
            for mismatch in mismatches {
                let target = match &mismatch.expected {
                    Some(expected) => format!("{} -> {}", mismatch.actual, expected),
                    None => mismatch.actual.clone(),
                };
                line(&mut out, format!("    {} [{}]", target, mismatch.reason.code()));
                for instance in &mismatch.instances {
                    line(
                        &mut out,
                        format!("      in {} ({})", instance.package, instance.dependency_type),
                    );
                }
            }
        }
    }

    if !report.format_mismatches.is_empty() {
        line(&mut out, "= Format =");
        for mismatch in &report.format_mismatches {
            let property = if mismatch.property.is_empty() {
                String::new()
            } else {
                format!(" {}", mismatch.property)
            };
            line(
                &mut out,
                format!("  {}{} [{}]", mismatch.package, property, mismatch.kind.code()),
            );
        }
    }

    for fix in &report.applied {
        line(
            &mut out,
            format!(
                "fixed {} in {}: {} -> {}",
                fix.dependency,
                fix.manifest.display(),
                fix.previous,
                fix.next
            ),
        );
    }
    for skipped in &report.skipped {
        line(
            &mut out,
            format!(
                "skipped {} ({}): {}",
                skipped.mismatch.dependency,
                skipped.mismatch.actual,
                skipped.reason.code()
            ),
        );
    }
    for problem in &report.write_failures {
        line(&mut out, format!("! failed to write {}: {}", problem.path.display(), problem.message));
    }

    let summary = &report.summary;
    out.push_str(&format!(
        "{} manifests, {} instances, {} mismatches ({} fixable)",
        summary.manifests, summary.instances, summary.mismatches, summary.fixable
    ));
    if summary.format_mismatches > 0 {
        out.push_str(&format!(", {} format mismatches", summary.format_mismatches));
    }
    if summary.applied > 0 || summary.skipped > 0 || summary.written > 0 {
        out.push_str(&format!(
            ", {} fixed, {} skipped, {} files written",
            summary.applied, summary.skipped, summary.written
        ));
    }
    out.push('\n');
    out
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}
