use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::manifest::Manifest;
use crate::test_support::{instances_of, package};

fn run(config: Value, manifests: &[Manifest]) -> Detection {
    let config: Config = serde_json::from_value(config).unwrap();
    detect(&instances_of(manifests), &config)
}

/// `(dependency, actual, expected, reason)` of every mismatch
fn summary(detection: &Detection) -> Vec<(&str, &str, Option<&str>, Reason)> {
    detection
        .mismatches
        .iter()
        .map(|mismatch| {
            (
                mismatch.dependency.as_str(),
                mismatch.actual.as_str(),
                mismatch.expected.as_deref(),
                mismatch.reason,
            )
        })
        .collect()
}

fn foo_in(versions: &[&str]) -> Vec<Manifest> {
    versions
        .iter()
        .enumerate()
        .map(|(index, version)| {
            package(
                &format!("pkg-{index}"),
                json!({ "dependencies": { "foo": version } }),
            )
        })
        .collect()
}

#[test]
fn standard_prefers_highest_semver_version() {
    let detection = run(json!({}), &foo_in(&["1.2.0", "1.5.0", "^1.3.0"]));

    assert_eq!(
        summary(&detection),
        vec![
            ("foo", "1.2.0", Some("1.5.0"), Reason::HighestSemverMismatch),
            ("foo", "^1.3.0", Some("1.5.0"), Reason::HighestSemverMismatch),
        ]
    );
    assert_eq!(detection.fixable().count(), 2);
}

#[test]
fn standard_can_prefer_lowest_semver_version() {
    let detection = run(
        json!({ "versionGroups": [{ "dependencies": ["foo"], "preferVersion": "lowestSemver" }] }),
        &foo_in(&["1.2.0", "1.5.0", "^1.3.0"]),
    );

    assert_eq!(
        summary(&detection),
        vec![
            ("foo", "1.5.0", Some("1.2.0"), Reason::LowestSemverMismatch),
            ("foo", "^1.3.0", Some("1.2.0"), Reason::LowestSemverMismatch),
        ]
    );
}

#[test]
fn identical_specifiers_are_clean() {
    let detection = run(json!({}), &foo_in(&["^2.0.0", "^2.0.0"]));
    assert!(detection.is_clean());
}

#[test]
fn mixing_semver_and_opaque_specifiers_is_not_fixable() {
    let detection = run(json!({}), &foo_in(&["1.0.0", "workspace:*"]));

    assert_eq!(
        summary(&detection),
        vec![
            ("foo", "1.0.0", None, Reason::IncompatibleSpecifierKind),
            ("foo", "workspace:*", None, Reason::IncompatibleSpecifierKind),
        ]
    );
    assert_eq!(detection.fixable().count(), 0);
}

#[rstest]
#[case(&["latest", "next"], 2)]
#[case(&["github:user/foo", "github:user/foo"], 0)]
fn opaque_specifiers_must_be_identical(#[case] versions: &[&str], #[case] expected: usize) {
    let detection = run(json!({}), &foo_in(versions));

    assert_eq!(detection.mismatches.len(), expected);
    assert!(
        detection
            .mismatches
            .iter()
            .all(|mismatch| mismatch.reason == Reason::NonSemverMismatch)
    );
}

#[test]
fn unparsable_specifier_is_reported_on_its_own() {
    let detection = run(json!({}), &foo_in(&["1.0.0", ""]));

    assert_eq!(
        summary(&detection),
        vec![("foo", "", None, Reason::UnparsableSpecifier)]
    );
}

#[test]
fn pinned_version_overrides_everything() {
    let detection = run(
        json!({ "versionGroups": [{ "dependencies": ["foo"], "pinVersion": "3.272.0" }] }),
        &foo_in(&["3.270.0", "3.272.0", "^3.272.0"]),
    );

    assert_eq!(
        summary(&detection),
        vec![
            ("foo", "3.270.0", Some("3.272.0"), Reason::PinMismatch),
            ("foo", "^3.272.0", Some("3.272.0"), Reason::PinMismatch),
        ]
    );
    assert_eq!(detection.mismatches[0].group.policy, "pinned");
}

#[test]
fn pinned_group_ignores_semver_range() {
    let detection = run(
        json!({
            "versionGroups": [{ "dependencies": ["foo"], "pinVersion": "1.0.0" }],
            "semverGroups": [{ "range": "^" }]
        }),
        &foo_in(&["1.0.0"]),
    );
    assert!(detection.is_clean());
}

#[test]
fn banned_instances_are_coalesced() {
    let detection = run(
        json!({ "versionGroups": [{ "dependencies": ["foo"], "isBanned": true }] }),
        &foo_in(&["4.0.0", "4.0.0"]),
    );

    assert_eq!(detection.mismatches.len(), 1);
    let mismatch = &detection.mismatches[0];
    assert_eq!(mismatch.reason, Reason::Banned);
    assert_eq!(mismatch.instances, vec![InstanceId(0), InstanceId(1)]);
    assert!(!mismatch.is_fixable());
}

#[test]
fn ignored_group_reports_nothing() {
    let detection = run(
        json!({ "versionGroups": [{ "dependencies": ["foo"], "isIgnored": true }] }),
        &foo_in(&["1.0.0", "2.0.0", "latest"]),
    );
    assert!(detection.is_clean());
}

#[test]
fn local_package_version_is_authoritative() {
    let detection = run(
        json!({}),
        &[
            package("core", json!({ "version": "1.0.0" })),
            package("app", json!({ "dependencies": { "core": "^0.9.0" } })),
            package("web", json!({ "dependencies": { "core": "workspace:*" } })),
            package("cli", json!({ "dependencies": { "core": "1.0.0" } })),
        ],
    );

    assert_eq!(
        summary(&detection),
        vec![("core", "^0.9.0", Some("1.0.0"), Reason::LocalVersionMismatch)]
    );
}

#[test]
fn local_version_is_never_rewritten_to_match_others() {
    let detection = run(
        json!({}),
        &[
            package("core", json!({ "version": "1.0.0" })),
            package("app", json!({ "dependencies": { "core": "2.0.0" } })),
        ],
    );

    assert_eq!(detection.mismatches.len(), 1);
    assert_eq!(detection.mismatches[0].actual, "2.0.0");
    assert_eq!(detection.mismatches[0].expected.as_deref(), Some("1.0.0"));
}

#[test]
fn invalid_local_version_blocks_dependents() {
    let detection = run(
        json!({}),
        &[
            package("core", json!({ "version": "^1.0.0" })),
            package("app", json!({ "dependencies": { "core": "1.0.0" } })),
        ],
    );

    assert_eq!(
        summary(&detection),
        vec![
            ("core", "^1.0.0", None, Reason::InvalidLocalVersion),
            ("core", "1.0.0", None, Reason::DependsOnInvalidLocalVersion),
        ]
    );
}

#[test]
fn semver_group_rewrites_operator() {
    let detection = run(
        json!({ "semverGroups": [{ "range": "^" }] }),
        &foo_in(&["1.0.0", "1.0.0"]),
    );

    assert_eq!(
        summary(&detection),
        vec![("foo", "1.0.0", Some("^1.0.0"), Reason::SemverRangeMismatch)]
    );
    assert_eq!(detection.mismatches[0].instances.len(), 2);
}

#[test]
fn semver_group_applies_to_the_chosen_version() {
    let detection = run(
        json!({ "semverGroups": [{ "range": "~" }] }),
        &foo_in(&["1.0.0", "~1.2.0"]),
    );

    assert_eq!(
        summary(&detection),
        vec![("foo", "1.0.0", Some("~1.2.0"), Reason::HighestSemverMismatch)]
    );
}

#[test]
fn range_excluding_its_own_version_conflicts() {
    let detection = run(
        json!({ "semverGroups": [{ "range": ">" }] }),
        &foo_in(&["1.0.0"]),
    );

    assert_eq!(
        summary(&detection),
        vec![("foo", "1.0.0", None, Reason::RangeConflict)]
    );
}

#[rstest]
#[case(&[">=1.0.0", "^1.2.0", "1.x"], vec![])]
#[case(&["^1.0.0", "^2.0.0"], vec!["^1.0.0", "^2.0.0"])]
#[case(&[">=1.0.0", "<2.0.0", "^3.0.0"], vec!["<2.0.0", "^3.0.0"])]
fn same_range_requires_overlap(#[case] versions: &[&str], #[case] expected: Vec<&str>) {
    let detection = run(
        json!({ "versionGroups": [{ "dependencies": ["foo"], "policy": "sameRange" }] }),
        &foo_in(versions),
    );

    let actual: Vec<&str> = detection
        .mismatches
        .iter()
        .map(|mismatch| mismatch.actual.as_str())
        .collect();
    assert_eq!(actual, expected);
    assert!(
        detection
            .mismatches
            .iter()
            .all(|mismatch| mismatch.reason == Reason::SameRangeMismatch)
    );
}

#[test]
fn snapped_group_follows_fixed_source_version() {
    let detection = run(
        json!({
            "versionGroups": [{
                "dependencies": ["react"],
                "packages": ["app"],
                "snapTo": ["mobile"]
            }]
        }),
        &[
            package("mobile", json!({ "dependencies": { "react": "17.0.2" } })),
            package("web", json!({ "dependencies": { "react": "18.0.0" } })),
            package("app", json!({ "dependencies": { "react": "16.0.0" } })),
        ],
    );

    assert_eq!(
        summary(&detection),
        vec![
            ("react", "16.0.0", Some("18.0.0"), Reason::SnapToMismatch),
            ("react", "17.0.2", Some("18.0.0"), Reason::HighestSemverMismatch),
        ]
    );
    assert_eq!(detection.mismatches[0].group.index, 0);
}

#[rstest]
#[case(json!(["missing"]), Reason::SnapToSourceNotFound)]
#[case(json!(["mobile", "web"]), Reason::SnapToSourceAmbiguous)]
fn snapped_group_needs_one_source_version(#[case] snap_to: Value, #[case] expected: Reason) {
    let detection = run(
        json!({
            "versionGroups": [
                { "dependencies": ["react"], "packages": ["app"], "snapTo": snap_to },
                { "dependencies": ["react"], "isIgnored": true }
            ]
        }),
        &[
            package("mobile", json!({ "dependencies": { "react": "17.0.2" } })),
            package("web", json!({ "dependencies": { "react": "18.0.0" } })),
            package("app", json!({ "dependencies": { "react": "16.0.0" } })),
        ],
    );

    assert_eq!(
        summary(&detection),
        vec![("react", "16.0.0", None, expected)]
    );
}

#[test]
fn mismatches_are_ordered_by_group_then_dependency() {
    let detection = run(
        json!({ "versionGroups": [{ "dependencies": ["zod"], "pinVersion": "3.0.0" }] }),
        &[
            package("a", json!({ "dependencies": { "react": "17.0.0", "zod": "2.0.0" } })),
            package("b", json!({ "dependencies": { "react": "18.0.0", "lodash": "4.0.0" } })),
            package("c", json!({ "dependencies": { "lodash": "3.0.0" } })),
        ],
    );

    let order: Vec<(usize, &str)> = detection
        .mismatches
        .iter()
        .map(|mismatch| (mismatch.group.index, mismatch.dependency.as_str()))
        .collect();
    assert_eq!(order, vec![(0, "zod"), (1, "react"), (1, "lodash")]);
}

#[test]
fn detection_is_deterministic() {
    let manifests = foo_in(&["1.0.0", "^1.1.0", "latest", "2.0.0"]);
    let first = run(json!({}), &manifests);
    let second = run(json!({}), &manifests);
    assert_eq!(first.mismatches, second.mismatches);
}

#[test]
fn config_issues_are_carried() {
    let detection = run(
        json!({ "versionGroups": [{ "dependencies": ["foo"], "policy": "loose" }] }),
        &foo_in(&["1.0.0"]),
    );
    assert_eq!(detection.issues.len(), 1);
}

#[test]
fn star_range_is_ranked_before_it_is_applied() {
    let detection = run(
        json!({ "semverGroups": [{ "dependencyTypes": ["dev"], "range": "*" }] }),
        &[
            package("a", json!({ "devDependencies": { "foo": "1.0.0" } })),
            package("b", json!({ "dependencies": { "foo": "2.0.0" } })),
        ],
    );

    assert_eq!(
        summary(&detection),
        vec![
            ("foo", "1.0.0", Some("*"), Reason::HighestSemverMismatch),
            ("foo", "2.0.0", Some("*"), Reason::HighestSemverMismatch),
        ]
    );
}

#[test]
fn same_range_rejects_operator_excluding_its_version() {
    let detection = run(
        json!({
            "versionGroups": [{ "dependencies": ["foo"], "policy": "sameRange" }],
            "semverGroups": [{ "dependencyTypes": ["dev"], "range": ">" }]
        }),
        &[
            package("a", json!({ "dependencies": { "foo": "1.0.0" } })),
            package("b", json!({ "devDependencies": { "foo": "1.0.0" } })),
        ],
    );

    assert_eq!(
        summary(&detection),
        vec![("foo", "1.0.0", None, Reason::RangeConflict)]
    );
    assert_eq!(detection.mismatches[0].instances, vec![InstanceId(1)]);
}

#[rstest]
#[case(&["1.0.0", "^1.0.0"], "^", vec![("1.0.0", Some("^1.0.0"), Reason::SemverRangeMismatch)])]
#[case(&["^1.0.0", "^1.2.0"], "", vec![
    ("^1.0.0", None, Reason::RangeConflict),
    ("^1.2.0", None, Reason::RangeConflict),
])]
#[case(&["^1.2.0", "~1.2.0"], "", vec![
    ("^1.2.0", Some("1.2.0"), Reason::SemverRangeMismatch),
    ("~1.2.0", Some("1.2.0"), Reason::SemverRangeMismatch),
])]
#[case(&["1.2.0", "~1.2.0"], "^", vec![
    ("1.2.0", Some("^1.2.0"), Reason::SemverRangeMismatch),
    ("~1.2.0", Some("^1.2.0"), Reason::SemverRangeMismatch),
])]
#[case(&["1.2.0", ">=1.0.0"], "<=", vec![
    ("1.2.0", Some("<=1.2.0"), Reason::SemverRangeMismatch),
    (">=1.0.0", None, Reason::RangeConflict),
])]
fn same_range_rewrites_only_when_ranges_still_overlap(
    #[case] versions: &[&str],
    #[case] range: &str,
    #[case] expected: Vec<(&str, Option<&str>, Reason)>,
) {
    let detection = run(
        json!({
            "versionGroups": [{ "dependencies": ["foo"], "policy": "sameRange" }],
            "semverGroups": [{ "range": range }]
        }),
        &foo_in(versions),
    );

    let actual: Vec<(&str, Option<&str>, Reason)> = summary(&detection)
        .into_iter()
        .map(|(_, actual, expected, reason)| (actual, expected, reason))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn chained_snapped_groups_read_their_sources_after_they_are_fixed() {
    let detection = run(
        json!({
            "versionGroups": [
                { "packages": ["a"], "snapTo": ["b"] },
                { "packages": ["b"], "snapTo": ["c"] }
            ]
        }),
        &[
            package("c", json!({ "dependencies": { "react": "18.0.0" } })),
            package("b", json!({ "dependencies": { "react": "17.0.0" } })),
            package("a", json!({ "dependencies": { "react": "16.0.0" } })),
        ],
    );

    assert_eq!(
        summary(&detection),
        vec![
            ("react", "16.0.0", Some("18.0.0"), Reason::SnapToMismatch),
            ("react", "17.0.0", Some("18.0.0"), Reason::SnapToMismatch),
        ]
    );
}

fn react_in(versions: &[(&str, &str)]) -> Vec<Manifest> {
    versions
        .iter()
        .map(|(name, version)| package(name, json!({ "dependencies": { "react": version } })))
        .collect()
}

/// Fixing everything fixable and detecting again leaves nothing to fix
#[rstest]
#[case::star_range(
    json!({ "semverGroups": [{ "dependencyTypes": ["dev"], "range": "*" }] }),
    vec![
        package("a", json!({ "devDependencies": { "foo": "1.0.0" } })),
        package("b", json!({ "dependencies": { "foo": "2.0.0" } })),
    ]
)]
#[case::lowest_with_star_range(
    json!({
        "versionGroups": [{ "preferVersion": "lowestSemver" }],
        "semverGroups": [{ "dependencyTypes": ["dev"], "range": "*" }]
    }),
    vec![
        package("a", json!({ "devDependencies": { "foo": "1.0.0" } })),
        package("b", json!({ "dependencies": { "foo": "2.0.0" } })),
    ]
)]
#[case::gte_range(
    json!({ "semverGroups": [{ "dependencyTypes": ["dev"], "range": ">=" }] }),
    vec![
        package("a", json!({ "devDependencies": { "foo": "1.0.0" } })),
        package("b", json!({ "dependencies": { "foo": "1.5.0" } })),
    ]
)]
#[case::lt_range(
    json!({ "semverGroups": [{ "dependencyTypes": ["dev"], "range": "<" }] }),
    vec![
        package("a", json!({ "devDependencies": { "foo": "1.0.0" } })),
        package("b", json!({ "dependencies": { "foo": "1.5.0" } })),
        package("c", json!({ "dependencies": { "foo": "1.2.0" } })),
    ]
)]
#[case::same_range_with_gt_range(
    json!({
        "versionGroups": [{ "dependencies": ["foo"], "policy": "sameRange" }],
        "semverGroups": [
            { "dependencyTypes": ["dev"], "range": ">" },
            { "dependencyTypes": ["peer"], "range": "^" }
        ]
    }),
    vec![
        package("a", json!({ "dependencies": { "foo": "1.0.0" } })),
        package("b", json!({ "devDependencies": { "foo": "1.0.0" } })),
        package("c", json!({ "peerDependencies": { "foo": "1.0.0" } })),
    ]
)]
#[case::same_range_with_exact_range(
    json!({
        "versionGroups": [{ "dependencies": ["foo"], "policy": "sameRange" }],
        "semverGroups": [{ "dependencyTypes": ["dev"], "range": "" }]
    }),
    vec![
        package("a", json!({ "dependencies": { "foo": "^1.2.0" } })),
        package("b", json!({ "devDependencies": { "foo": "^1.2.0" } })),
        package("c", json!({ "devDependencies": { "foo": "~1.2.0" } })),
    ]
)]
#[case::chained_snap(
    json!({
        "versionGroups": [
            { "packages": ["a"], "snapTo": ["b"] },
            { "packages": ["b"], "snapTo": ["c"] }
        ]
    }),
    react_in(&[("c", "18.0.0"), ("b", "17.0.0"), ("a", "16.0.0")])
)]
#[case::multi_source_snap(
    json!({
        "versionGroups": [{ "packages": ["app"], "snapTo": ["mobile", "web"] }]
    }),
    react_in(&[("mobile", "17.0.2"), ("web", "18.0.0"), ("app", "16.0.0")])
)]
fn one_fix_pass_converges(#[case] config: Value, #[case] manifests: Vec<Manifest>) {
    let config: Config = serde_json::from_value(config).unwrap();
    let instances = instances_of(&manifests);
    let first = detect(&instances, &config);
    let fixed = crate::fix::fix(&manifests, &instances, &first.mismatches);

    let second = detect(&instances_of(&fixed.manifests), &config);

    assert!(!fixed.applied.is_empty());
    assert_eq!(second.fixable().count(), 0, "{:?}", summary(&second));
}
