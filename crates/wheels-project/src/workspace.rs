use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use wheels_core::PackageInfo;
use wheels_manifest::{WorkspaceManifest, read_project, read_workspace};

use crate::error::ProjectError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UvWorkspace {
    pub root: PathBuf,
    /// Members sorted by canonical name.
    pub packages: Vec<PackageInfo>,
}

impl UvWorkspace {
    #[must_use]
    pub fn root_manifest(&self) -> PathBuf {
        self.root.join("pyproject.toml")
    }
}

/// Finds the enclosing uv workspace and reads every member manifest.
///
/// # Errors
///
/// Returns `ProjectError` if no workspace root can be found, a member
/// manifest cannot be read, a package name is declared twice, or the
/// workspace has no members.
pub fn discover_workspace(start_dir: &Path) -> Result<UvWorkspace, ProjectError> {
    let start_dir = start_dir.canonicalize()?;

    let (root, manifest) = find_workspace_root(&start_dir)?;
    let packages = collect_packages(&root, &manifest)?;

    if packages.is_empty() {
        return Err(ProjectError::NoPackages { root });
    }

    Ok(UvWorkspace { root, packages })
}

fn find_workspace_root(start_dir: &Path) -> Result<(PathBuf, WorkspaceManifest), ProjectError> {
    let mut current = start_dir.to_path_buf();

    loop {
        let manifest_path = current.join("pyproject.toml");

        if manifest_path.exists() {
            if let Some(workspace) = read_workspace(&manifest_path)? {
                return Ok((current, workspace));
            }
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => {
                return Err(ProjectError::NotFound {
                    start_dir: start_dir.to_path_buf(),
                });
            }
        }
    }
}

fn collect_packages(
    root: &Path,
    manifest: &WorkspaceManifest,
) -> Result<Vec<PackageInfo>, ProjectError> {
    let mut member_dirs = Vec::new();
    for pattern in &manifest.members {
        member_dirs.extend(expand_glob_pattern(root, pattern, &manifest.exclude)?);
    }
    member_dirs.sort();
    member_dirs.dedup();

    let mut packages: BTreeMap<String, PackageInfo> = BTreeMap::new();

    for member_dir in member_dirs {
        let manifest_path = member_dir.join("pyproject.toml");
        if !manifest_path.exists() {
            continue;
        }

        let project = read_project(&manifest_path)?;
        let relative_path = member_dir
            .strip_prefix(root)
            .map_or_else(|_| member_dir.clone(), Path::to_path_buf);

        if let Some(existing) = packages.get(&project.name) {
            return Err(ProjectError::DuplicatePackage {
                name: project.name,
                first: existing.relative_path.clone(),
                second: relative_path,
            });
        }

        packages.insert(
            project.name.clone(),
            PackageInfo {
                name: project.name,
                version: project.version,
                path: member_dir,
                relative_path,
                dependencies: project.dependencies,
            },
        );
    }

    Ok(packages.into_values().collect())
}

fn expand_glob_pattern(
    root: &Path,
    pattern: &str,
    excludes: &[String],
) -> Result<Vec<PathBuf>, ProjectError> {
    let glob = GlobBuilder::new(pattern.trim_end_matches('/'))
        .literal_separator(true)
        .build()
        .map_err(|source| ProjectError::GlobPattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let mut exclude_matchers = Vec::with_capacity(excludes.len());
    for exclude in excludes {
        let matcher = GlobBuilder::new(exclude.trim_end_matches('/'))
            .literal_separator(true)
            .build()
            .map_err(|source| ProjectError::GlobPattern {
                pattern: exclude.clone(),
                source,
            })?
            .compile_matcher();
        exclude_matchers.push(matcher);
    }

    let mut dirs = Vec::new();
    collect_matching_dirs(root, root, &glob, &exclude_matchers, &mut dirs)?;

    Ok(dirs)
}

fn collect_matching_dirs(
    base: &Path,
    current: &Path,
    glob: &globset::GlobMatcher,
    excludes: &[globset::GlobMatcher],
    results: &mut Vec<PathBuf>,
) -> Result<(), ProjectError> {
    for entry in std::fs::read_dir(current)? {
        let path = entry?.path();

        if !path.is_dir() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(base) else {
            continue;
        };

        if relative
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'))
        {
            continue;
        }

        if excludes.iter().any(|ex| ex.is_match(relative)) {
            continue;
        }

        if glob.is_match(relative) {
            results.push(path.clone());
        }

        collect_matching_dirs(base, &path, glob, excludes, results)?;
    }

    Ok(())
}
