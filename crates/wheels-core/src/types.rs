use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use semver::Version;
use serde::{Deserialize, Serialize};

/// Where a requirement was declared in a member manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "kebab-case")]
pub enum DependencyGroup {
    Main,
    Optional(String),
    Group(String),
}

impl fmt::Display for DependencyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "dependencies"),
            Self::Optional(extra) => write!(f, "optional-dependencies.{extra}"),
            Self::Group(group) => write!(f, "dependency-groups.{group}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Canonical (PEP 503) name of the target distribution.
    pub name: String,
    /// Name as spelled in the manifest.
    pub raw_name: String,
    pub extras: BTreeSet<String>,
    pub specifier: Option<String>,
    pub marker: Option<String>,
    pub group: DependencyGroup,
}

impl Dependency {
    /// Returns the pinned version if the specifier is a single `==` clause.
    #[must_use]
    pub fn exact_pin(&self) -> Option<&str> {
        let spec = self.specifier.as_deref()?.trim();
        if spec.contains(',') {
            return None;
        }
        let pinned = spec.strip_prefix("==")?;
        if pinned.starts_with('=') {
            return None;
        }
        Some(pinned.trim())
    }

    #[must_use]
    pub fn is_exact_pin(&self) -> bool {
        self.exact_pin().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Canonical (PEP 503) name.
    pub name: String,
    pub version: Version,
    /// Absolute directory of the package.
    pub path: PathBuf,
    /// Directory relative to the workspace root, using `/` separators.
    pub relative_path: PathBuf,
    pub dependencies: Vec<Dependency>,
}

impl PackageInfo {
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join("pyproject.toml")
    }
}

/// A built or downloaded distribution file belonging to one package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub package: String,
    pub version: Version,
    pub path: PathBuf,
}

impl Artifact {
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
