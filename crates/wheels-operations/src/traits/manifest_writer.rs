use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;

use crate::Result;

pub trait ManifestWriter: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or written.
    fn write_version(&self, manifest_path: &Path, new_version: &Version) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the version does not match the expected value.
    fn verify_version(&self, manifest_path: &Path, expected: &Version) -> Result<()>;

    /// Rewrites every requirement on a package in `pins` to an exact pin.
    /// Returns the number of requirement strings changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or written.
    fn write_dependency_pins(
        &self,
        manifest_path: &Path,
        pins: &BTreeMap<String, Version>,
    ) -> Result<usize>;

    /// Raw manifest contents, kept so an edit can be undone.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read.
    fn snapshot(&self, manifest_path: &Path) -> Result<String>;

    /// Writes back contents taken by [`ManifestWriter::snapshot`].
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be written.
    fn restore(&self, manifest_path: &Path, contents: &str) -> Result<()>;
}
