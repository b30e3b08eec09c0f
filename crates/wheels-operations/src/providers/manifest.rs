use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use semver::Version;
use wheels_manifest::ManifestError;

use crate::Result;
use crate::traits::ManifestWriter;

pub struct FileSystemManifestWriter;

impl FileSystemManifestWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemManifestWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestWriter for FileSystemManifestWriter {
    fn write_version(&self, manifest_path: &Path, new_version: &Version) -> Result<()> {
        wheels_manifest::write_version(manifest_path, new_version)?;
        Ok(())
    }

    fn verify_version(&self, manifest_path: &Path, expected: &Version) -> Result<()> {
        wheels_manifest::verify_version(manifest_path, expected)?;
        Ok(())
    }

    fn write_dependency_pins(
        &self,
        manifest_path: &Path,
        pins: &BTreeMap<String, Version>,
    ) -> Result<usize> {
        Ok(wheels_manifest::write_dependency_pins(manifest_path, pins)?)
    }

    fn snapshot(&self, manifest_path: &Path) -> Result<String> {
        fs::read_to_string(manifest_path).map_err(|source| {
            ManifestError::Read {
                path: manifest_path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    fn restore(&self, manifest_path: &Path, contents: &str) -> Result<()> {
        fs::write(manifest_path, contents).map_err(|source| {
            ManifestError::Write {
                path: manifest_path.to_path_buf(),
                source,
            }
            .into()
        })
    }
}
