use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use wheels_core::PackageInfo;

use crate::config::ReleaseConfig;

/// Result of attributing changed files to packages.
///
/// This is a data transfer object with intentionally public fields for direct access.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileMapping {
    /// Package name -> files inside its directory. Only packages with at
    /// least one file appear.
    pub package_files: BTreeMap<String, Vec<PathBuf>>,
    /// Files outside every package directory.
    pub root_files: Vec<PathBuf>,
    pub ignored_files: Vec<PathBuf>,
}

impl FileMapping {
    #[must_use]
    pub fn files_for(&self, package: &str) -> &[PathBuf] {
        self.package_files
            .get(package)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Root files that match the configured shared-root patterns.
    pub fn shared_root_files<'a>(
        &'a self,
        config: &'a ReleaseConfig,
    ) -> impl Iterator<Item = &'a PathBuf> {
        self.root_files
            .iter()
            .filter(move |file| config.is_root_file(file))
    }
}

/// Attributes workspace-relative paths to the deepest package directory that
/// contains them, so a file in a nested package never counts for its parent.
#[must_use]
pub fn map_files_to_packages(
    packages: &[&PackageInfo],
    changed_files: &[PathBuf],
    config: &ReleaseConfig,
) -> FileMapping {
    let mut by_depth: Vec<&PackageInfo> = packages.to_vec();
    by_depth.sort_by(|a, b| {
        depth(&b.relative_path)
            .cmp(&depth(&a.relative_path))
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut mapping = FileMapping::default();

    for file in changed_files {
        if config.is_ignored(file) {
            mapping.ignored_files.push(file.clone());
            continue;
        }

        match by_depth
            .iter()
            .find(|package| file.starts_with(&package.relative_path))
        {
            Some(package) => mapping
                .package_files
                .entry(package.name.clone())
                .or_default()
                .push(file.clone()),
            None => mapping.root_files.push(file.clone()),
        }
    }

    mapping
}

fn depth(path: &Path) -> usize {
    path.components().count()
}
