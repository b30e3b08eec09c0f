use semver::Version;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid version '{version}'")]
    Invalid {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("version must increase: '{previous}' -> '{next}'")]
    NotIncreasing { previous: Version, next: Version },
}

/// Parses a version, padding missing minor/patch components with zeros so
/// that `1` and `1.0` are read as `1.0.0`.
///
/// # Errors
///
/// Returns [`VersionError::Invalid`] if the padded string is not valid semver.
pub fn parse_lenient(version: &str) -> Result<Version, VersionError> {
    let trimmed = version.trim();
    let (core, rest) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };

    let components = core.split('.').count();
    let padded = match components {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => trimmed.to_string(),
    };

    Version::parse(&padded).map_err(|source| VersionError::Invalid {
        version: version.to_string(),
        source,
    })
}

/// Increments the patch component; pre-release and build metadata are dropped.
#[must_use]
pub fn bump_patch(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch + 1)
}

/// # Errors
///
/// Returns [`VersionError::NotIncreasing`] unless `next` is a patch bump of
/// `previous` that keeps major and minor.
pub fn ensure_patch_increase(previous: &Version, next: &Version) -> Result<(), VersionError> {
    let same_line = previous.major == next.major && previous.minor == next.minor;
    if same_line && next > previous {
        return Ok(());
    }

    Err(VersionError::NotIncreasing {
        previous: previous.clone(),
        next: next.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_version() {
        assert_eq!(parse_lenient("1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_pads_two_components() {
        assert_eq!(parse_lenient("1.0").unwrap(), Version::new(1, 0, 0));
    }

    #[test]
    fn parse_pads_single_component() {
        assert_eq!(parse_lenient("2").unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn parse_keeps_prerelease_when_padding() {
        let version = parse_lenient("1.4-rc.1").unwrap();
        assert_eq!(version.to_string(), "1.4.0-rc.1");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_lenient("not-a-version"),
            Err(VersionError::Invalid { .. })
        ));
    }

    #[test]
    fn bump_patch_increments_patch_only() {
        let bumped = bump_patch(&Version::new(1, 2, 3));
        assert_eq!(bumped, Version::new(1, 2, 4));
    }

    #[test]
    fn bump_patch_drops_prerelease() {
        let version = Version::parse("1.2.3-dev.1").unwrap();
        assert_eq!(bump_patch(&version), Version::new(1, 2, 4));
    }

    #[test]
    fn bump_is_strictly_increasing() {
        let version = Version::new(0, 9, 41);
        let bumped = bump_patch(&version);
        ensure_patch_increase(&version, &bumped).unwrap();
    }

    #[test]
    fn minor_change_is_rejected() {
        let result = ensure_patch_increase(&Version::new(1, 2, 3), &Version::new(1, 3, 0));
        assert!(matches!(result, Err(VersionError::NotIncreasing { .. })));
    }

    #[test]
    fn equal_versions_are_rejected() {
        let version = Version::new(1, 2, 3);
        assert!(ensure_patch_increase(&version, &version).is_err());
    }
}
