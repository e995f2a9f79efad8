//! `lint` and `fix` pipelines behind the CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use tracing::{debug, info, warn};

use crate::config::{CONFIG_FILE_NAME, Config};
use crate::detect::{Detection, Reason, detect};
use crate::fix::fix as apply_fixes;
use crate::format::format as format_manifests;
use crate::instance::{CollectOptions, DependencyInstance, collect_instances};
use crate::manifest::{self, LoadOutcome, Manifest};
use crate::report::Report;

/// Options shared by `lint` and `fix`; set values override the config file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory sources and the default config file are resolved against
    pub cwd: PathBuf,
    pub config_path: Option<PathBuf>,
    pub sources: Vec<String>,
    pub types: Vec<String>,
    pub filter: Option<String>,
    pub checks: Checks,
}

/// Which kinds of problems a run looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checks {
    /// Versions expected by version groups
    pub versions: bool,
    /// Range operators expected by semver groups
    pub ranges: bool,
    /// Layout of each manifest
    pub format: bool,
}

impl Default for Checks {
    fn default() -> Self {
        Self {
            versions: true,
            ranges: true,
            format: false,
        }
    }
}

impl Checks {
    /// Checks selected on the command line; none selected means the defaults
    pub fn from_flags(versions: bool, ranges: bool, format: bool) -> Self {
        if !(versions || ranges || format) {
            return Self::default();
        }
        Self {
            versions,
            ranges,
            format,
        }
    }

    /// Whether mismatches with this reason are part of the run
    pub fn includes(&self, reason: Reason) -> bool {
        if reason.is_range() {
            self.ranges
        } else {
            self.versions
        }
    }
}

/// Read the config from `--config`, or from the working directory when present
pub fn load_config(options: &RunOptions) -> Result<Config> {
    let path = match &options.config_path {
        Some(path) => options.cwd.join(path),
        None => {
            let default = options.cwd.join(CONFIG_FILE_NAME);
            if !default.is_file() {
                debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, options.cwd.display());
                return Ok(apply_overrides(Config::default(), options));
            }
            default
        }
    };
    let config = Config::from_file(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(apply_overrides(config, options))
}

fn apply_overrides(mut config: Config, options: &RunOptions) -> Config {
    if !options.sources.is_empty() {
        config.source = options.sources.clone();
    }
    if !options.types.is_empty() {
        config.dependency_types = options.types.clone();
    }
    if options.filter.is_some() {
        config.filter = options.filter.clone();
    }
    config
}

/// Expand source globs relative to `base` into manifest paths
pub fn resolve_sources(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str).with_context(|| format!("invalid source glob: {pattern}"))? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!("glob error: {}", e),
            }
        }
    }

    paths.sort();
    paths.dedup();
    debug!("Resolved {} manifests", paths.len());
    Ok(paths)
}

struct Loaded {
    config: Config,
    outcome: LoadOutcome,
}

async fn load(options: &RunOptions) -> Result<Loaded> {
    let config = load_config(options)?;
    let paths = resolve_sources(&options.cwd, &config.sources())?;
    let outcome = manifest::load(&paths).await;
    Ok(Loaded { config, outcome })
}

fn analyze(
    config: &Config,
    manifests: &[Manifest],
    checks: Checks,
) -> (Vec<DependencyInstance>, Detection) {
    let (collect, mut issues) = CollectOptions::from_config(config);
    let instances = collect_instances(manifests, &collect);
    let mut detection = detect(&instances, config);
    issues.append(&mut detection.issues);
    detection.issues = issues;
    detection
        .mismatches
        .retain(|mismatch| checks.includes(mismatch.reason));
    (instances, detection)
}

/// Detect mismatches without touching any file
pub async fn lint(options: &RunOptions) -> Result<Report> {
    let Loaded { config, outcome } = load(options).await?;
    let (instances, detection) = analyze(&config, &outcome.manifests, options.checks);

    let mut report = Report::new(outcome.manifests.len(), &instances, &detection)
        .with_load_failures(&outcome.failures);
    if options.checks.format {
        report = report.with_format(&format_manifests(&outcome.manifests, &config.format).mismatches);
    }
    Ok(report)
}

/// Detect mismatches, apply the fixable ones and write changed manifests
pub async fn fix(options: &RunOptions) -> Result<Report> {
    let Loaded { config, outcome } = load(options).await?;
    let (instances, detection) = analyze(&config, &outcome.manifests, options.checks);

    let mut result = apply_fixes(&outcome.manifests, &instances, &detection.mismatches);
    let mut format_mismatches = Vec::new();
    if options.checks.format {
        // Formatting runs last so the written file is both fixed and formatted
        let formatted = format_manifests(&result.manifests, &config.format);
        result.manifests = formatted.manifests;
        format_mismatches = formatted.mismatches;
    }
    let written = manifest::write(&result.manifests).await;

    Ok(Report::new(outcome.manifests.len(), &instances, &detection)
        .with_load_failures(&outcome.failures)
        .with_fix(&result)
        .with_format(&format_mismatches)
        .with_write(&written))
}
