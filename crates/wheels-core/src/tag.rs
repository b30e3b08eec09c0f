use std::fmt;
use std::str::FromStr;

use semver::Version;

use crate::error::CoreError;

/// A per-package release tag, `{name}/v{major}.{minor}.{patch}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageTag {
    pub package: String,
    pub version: Version,
}

impl PackageTag {
    #[must_use]
    pub fn new(package: impl Into<String>, version: Version) -> Self {
        Self {
            package: package.into(),
            version,
        }
    }

    /// Prefix shared by every tag of `package`, used for tag listing.
    #[must_use]
    pub fn prefix_for(package: &str) -> String {
        format!("{package}/v")
    }
}

impl fmt::Display for PackageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/v{}", self.package, self.version)
    }
}

impl FromStr for PackageTag {
    type Err = CoreError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidPackageTag {
            tag: tag.to_string(),
        };

        let (package, version) = tag.rsplit_once("/v").ok_or_else(invalid)?;
        if package.is_empty() {
            return Err(invalid());
        }
        let version = Version::parse(version).map_err(|_| invalid())?;

        Ok(Self::new(package, version))
    }
}

/// A workspace-wide release name such as `r7`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseName {
    prefix: String,
    number: u64,
}

impl ReleaseName {
    #[must_use]
    pub fn new(prefix: impl Into<String>, number: u64) -> Self {
        Self {
            prefix: prefix.into(),
            number,
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidReleaseName`] if `name` is not `prefix`
    /// followed by a decimal number.
    pub fn parse(prefix: &str, name: &str) -> Result<Self, CoreError> {
        name.strip_prefix(prefix)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .map(|number| Self::new(prefix, number))
            .ok_or_else(|| CoreError::InvalidReleaseName {
                name: name.to_string(),
            })
    }

    /// Picks the name following the highest existing release; names that do
    /// not follow the scheme are ignored.
    #[must_use]
    pub fn next_after<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> Self {
        let highest = existing
            .into_iter()
            .filter_map(|name| Self::parse(prefix, name).ok())
            .map(|release| release.number)
            .max()
            .unwrap_or(0);

        Self::new(prefix, highest + 1)
    }

    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl fmt::Display for ReleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}
