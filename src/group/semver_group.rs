use crate::config::{ConfigError, SemverGroupConfig};
use crate::group::Grouped;
use crate::group::policy::SemverPolicy;
use crate::group::selector::GroupSelector;
use crate::specifier::RangeOperator;

pub const DEFAULT_SEMVER_GROUP_LABEL: &str = "Default Semver Group";

#[derive(Debug, Clone)]
pub struct SemverGroup {
    pub index: usize,
    pub selector: GroupSelector,
    pub policy: SemverPolicy,
}

impl SemverGroup {
    pub fn from_config(
        index: usize,
        config: &SemverGroupConfig,
        local_names: &[String],
        issues: &mut Vec<ConfigError>,
    ) -> Self {
        let name = if config.selector.label.is_empty() {
            format!("semverGroups[{index}]")
        } else {
            format!("semverGroups[{index}] ({})", config.selector.label)
        };
        let selector = GroupSelector::compile(&config.selector, &name, local_names, issues);

        let policy = if config.is_ignored {
            SemverPolicy::Ignored
        } else {
            match config.range.as_deref().map(str::parse::<RangeOperator>) {
                Some(Ok(operator)) => SemverPolicy::Range(operator),
                Some(Err(_)) => {
                    issues.push(ConfigError::UnknownRange {
                        group: name,
                        range: config.range.clone().unwrap_or_default(),
                    });
                    SemverPolicy::Unconstrained
                }
                None => SemverPolicy::Unconstrained,
            }
        };

        Self {
            index,
            selector,
            policy,
        }
    }

    /// The implicit group with no range preference
    pub fn catch_all(index: usize) -> Self {
        Self {
            index,
            selector: GroupSelector::any(DEFAULT_SEMVER_GROUP_LABEL),
            policy: SemverPolicy::Unconstrained,
        }
    }

    pub fn label(&self) -> &str {
        self.selector.label()
    }
}

impl Grouped for SemverGroup {
    fn selector(&self) -> &GroupSelector {
        &self.selector
    }
}
