use semver::Version;

/// Parse a full version string into a semver::Version.
///
/// npm tolerates a leading `v` or `=`, so both are stripped.
/// Partial versions like "1.2" are rejected here; see [`PartialVersion`].
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('=').unwrap_or(version);
    let version = version.strip_prefix('v').unwrap_or(version);
    Version::parse(version).ok()
}

/// A version with optional minor and patch components.
///
/// Examples:
/// - "1" -> major 1, minor None, patch None
/// - "1.2.x" -> major 1, minor Some(2), patch None
/// - "1.2.3-beta.1" -> full version with a prerelease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialVersion {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    full: Option<Version>,
}

impl PartialVersion {
    pub fn parse(version: &str) -> Option<Self> {
        let version = version.trim();
        let version = version.strip_prefix('=').unwrap_or(version);
        let version = version.strip_prefix('v').unwrap_or(version);
        if version.is_empty() {
            return None;
        }

        if let Ok(full) = Version::parse(version) {
            return Some(Self {
                major: full.major,
                minor: Some(full.minor),
                patch: Some(full.patch),
                full: Some(full),
            });
        }

        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() > 3 {
            return None;
        }

        let major = parse_component(parts[0])??;
        let minor = match parts.get(1) {
            Some(part) => parse_component(part)?,
            None => None,
        };
        let patch = match parts.get(2) {
            Some(part) => parse_component(part)?,
            None => None,
        };
        // "1.x.3" is not a valid x-range
        if minor.is_none() && patch.is_some() {
            return None;
        }

        Some(Self {
            major,
            minor,
            patch,
            full: None,
        })
    }

    /// Returns the version when every component is present.
    pub fn full(&self) -> Option<&Version> {
        self.full.as_ref()
    }

    /// Missing components are treated as zero.
    pub fn floor(&self) -> Version {
        match &self.full {
            Some(full) => full.clone(),
            None => Version::new(
                self.major,
                self.minor.unwrap_or(0),
                self.patch.unwrap_or(0),
            ),
        }
    }

    /// Missing components are treated as the greatest possible value.
    pub fn ceiling(&self) -> Version {
        match &self.full {
            Some(full) => full.clone(),
            None => Version::new(
                self.major,
                self.minor.unwrap_or(u64::MAX),
                self.patch.unwrap_or(u64::MAX),
            ),
        }
    }

    /// The first version outside the range covered by the missing components.
    ///
    /// - "1" -> 2.0.0
    /// - "1.2" -> 1.3.0
    /// - "1.2.3" -> None (already a single version)
    pub fn next_excluded(&self) -> Option<Version> {
        match (self.minor, self.patch) {
            (None, _) => Some(Version::new(self.major.saturating_add(1), 0, 0)),
            (Some(minor), None) => Some(Version::new(self.major, minor.saturating_add(1), 0)),
            (Some(_), Some(_)) => None,
        }
    }
}

/// Parse one dotted component: a number, or `x`/`X`/`*` for a wildcard.
///
/// Returns None on invalid input, Some(None) for a wildcard.
fn parse_component(part: &str) -> Option<Option<u64>> {
    if part == "*" || part.eq_ignore_ascii_case("x") {
        return Some(None);
    }
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u64>().ok().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", Some(Version::new(1, 2, 3)))]
    #[case("v1.2.3", Some(Version::new(1, 2, 3)))]
    #[case("=1.2.3", Some(Version::new(1, 2, 3)))]
    #[case("1.2", None)]
    #[case("latest", None)]
    fn parse_version_accepts_only_full_versions(
        #[case] input: &str,
        #[case] expected: Option<Version>,
    ) {
        assert_eq!(parse_version(input), expected);
    }

    #[rstest]
    #[case("1", Version::new(1, 0, 0), Some(Version::new(2, 0, 0)))]
    #[case("1.x", Version::new(1, 0, 0), Some(Version::new(2, 0, 0)))]
    #[case("1.2", Version::new(1, 2, 0), Some(Version::new(1, 3, 0)))]
    #[case("1.2.*", Version::new(1, 2, 0), Some(Version::new(1, 3, 0)))]
    #[case("1.2.3", Version::new(1, 2, 3), None)]
    fn partial_version_bounds(
        #[case] input: &str,
        #[case] floor: Version,
        #[case] next: Option<Version>,
    ) {
        let partial = PartialVersion::parse(input).unwrap();
        assert_eq!(partial.floor(), floor);
        assert_eq!(partial.next_excluded(), next);
    }

    #[test]
    fn partial_version_ceiling_fills_missing_components() {
        let partial = PartialVersion::parse("1.x").unwrap();
        assert_eq!(partial.ceiling(), Version::new(1, u64::MAX, u64::MAX));
    }

    #[rstest]
    #[case("")]
    #[case("1.x.3")]
    #[case("1.2.3.4")]
    #[case("a.b.c")]
    #[case("1.2.3-")]
    fn partial_version_rejects_invalid_input(#[case] input: &str) {
        assert_eq!(PartialVersion::parse(input), None);
    }
}
