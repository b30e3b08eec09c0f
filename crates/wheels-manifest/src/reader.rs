use std::path::Path;

use semver::Version;
use toml_edit::{DocumentMut, Item, TableLike};
use wheels_core::{Dependency, DependencyGroup, canonicalize_name};

use crate::error::ManifestError;
use crate::requirement::Requirement;

/// Metadata of a workspace member read from its `pyproject.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectManifest {
    /// Canonical (PEP 503) name.
    pub name: String,
    pub raw_name: String,
    pub version: Version,
    pub dependencies: Vec<Dependency>,
}

/// The `[tool.uv.workspace]` table of a workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceManifest {
    pub members: Vec<String>,
    pub exclude: Vec<String>,
}

/// # Errors
///
/// Returns `ManifestError::Read` if the file cannot be read, or
/// `ManifestError::Parse` if the TOML is malformed.
pub fn read_document(path: &Path) -> Result<DocumentMut, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    content
        .parse::<DocumentMut>()
        .map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn project_table<'a>(
    doc: &'a DocumentMut,
    path: &Path,
) -> Result<&'a dyn TableLike, ManifestError> {
    doc.get("project")
        .and_then(Item::as_table_like)
        .ok_or_else(|| ManifestError::MissingField {
            path: path.to_path_buf(),
            field: "project".to_string(),
        })
}

fn required_str<'a>(
    table: &'a dyn TableLike,
    key: &str,
    path: &Path,
) -> Result<&'a str, ManifestError> {
    table
        .get(key)
        .and_then(Item::as_str)
        .ok_or_else(|| ManifestError::MissingField {
            path: path.to_path_buf(),
            field: format!("project.{key}"),
        })
}

fn parse_version(version: &str, path: &Path) -> Result<Version, ManifestError> {
    wheels_version::parse_lenient(version).map_err(|source| ManifestError::InvalidVersion {
        path: path.to_path_buf(),
        version: version.to_string(),
        source,
    })
}

/// # Errors
///
/// Returns `ManifestError::MissingField` if `[project].version` is absent
/// (dynamic versions are not supported), or `ManifestError::InvalidVersion`
/// if it cannot be parsed.
pub fn read_version(path: &Path) -> Result<Version, ManifestError> {
    let doc = read_document(path)?;
    let project = project_table(&doc, path)?;
    parse_version(required_str(project, "version", path)?, path)
}

/// Reads name, version and every declared requirement of a member.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, a required field is
/// missing, the version is malformed, or a requirement string is invalid.
pub fn read_project(path: &Path) -> Result<ProjectManifest, ManifestError> {
    let doc = read_document(path)?;
    let project = project_table(&doc, path)?;

    let raw_name = required_str(project, "name", path)?;
    let version = parse_version(required_str(project, "version", path)?, path)?;

    let mut dependencies = Vec::new();

    if let Some(item) = project.get("dependencies") {
        collect_requirements(item, &DependencyGroup::Main, path, &mut dependencies)?;
    }

    if let Some(extras) = project
        .get("optional-dependencies")
        .and_then(Item::as_table_like)
    {
        for (extra, item) in extras.iter() {
            let group = DependencyGroup::Optional(extra.to_string());
            collect_requirements(item, &group, path, &mut dependencies)?;
        }
    }

    if let Some(groups) = doc.get("dependency-groups").and_then(Item::as_table_like) {
        for (name, item) in groups.iter() {
            let group = DependencyGroup::Group(name.to_string());
            collect_requirements(item, &group, path, &mut dependencies)?;
        }
    }

    Ok(ProjectManifest {
        name: canonicalize_name(raw_name),
        raw_name: raw_name.to_string(),
        version,
        dependencies,
    })
}

// Non-string entries such as `{ include-group = "test" }` are skipped.
fn collect_requirements(
    item: &Item,
    group: &DependencyGroup,
    path: &Path,
    out: &mut Vec<Dependency>,
) -> Result<(), ManifestError> {
    let Some(array) = item.as_array() else {
        return Ok(());
    };

    for raw in array.iter().filter_map(toml_edit::Value::as_str) {
        let requirement =
            Requirement::parse(raw).map_err(|source| ManifestError::InvalidRequirement {
                path: path.to_path_buf(),
                source,
            })?;
        out.push(requirement.into_dependency(group.clone()));
    }

    Ok(())
}

fn string_list(item: Option<&Item>) -> Vec<String> {
    item.and_then(Item::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(toml_edit::Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Reads `[tool.uv.workspace]`. Returns `Ok(None)` if the manifest has no
/// workspace table.
///
/// # Errors
///
/// Returns `ManifestError::NoWorkspaceMembers` if the table exists but lists
/// no members.
pub fn read_workspace(path: &Path) -> Result<Option<WorkspaceManifest>, ManifestError> {
    let doc = read_document(path)?;

    let Some(workspace) = doc
        .get("tool")
        .and_then(|tool| tool.get("uv"))
        .and_then(|uv| uv.get("workspace"))
    else {
        return Ok(None);
    };

    let members = string_list(workspace.get("members"));
    if members.is_empty() {
        return Err(ManifestError::NoWorkspaceMembers {
            path: path.to_path_buf(),
        });
    }

    Ok(Some(WorkspaceManifest {
        members,
        exclude: string_list(workspace.get("exclude")),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("pyproject.toml");
        std::fs::write(&path, content).expect("write test file");
        (dir, path)
    }

    #[test]
    fn read_project_collects_all_dependency_sections() {
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "Beta_Pkg"
version = "1.0"
dependencies = ["alpha>=1.0", "requests"]

[project.optional-dependencies]
cli = ["click[colors]; python_version >= '3.10'"]

[dependency-groups]
dev = ["pytest", { include-group = "lint" }]
lint = ["ruff"]
"#,
        );

        let manifest = read_project(&path).expect("read project");
        assert_eq!(manifest.name, "beta-pkg");
        assert_eq!(manifest.raw_name, "Beta_Pkg");
        assert_eq!(manifest.version, Version::new(1, 0, 0));

        let names: Vec<(&str, String)> = manifest
            .dependencies
            .iter()
            .map(|dep| (dep.name.as_str(), dep.group.to_string()))
            .collect();
        assert_eq!(
            names,
            [
                ("alpha", "dependencies".to_string()),
                ("requests", "dependencies".to_string()),
                ("click", "optional-dependencies.cli".to_string()),
                ("pytest", "dependency-groups.dev".to_string()),
                ("ruff", "dependency-groups.lint".to_string()),
            ]
        );

        let click = &manifest.dependencies[2];
        assert!(click.extras.contains("colors"));
        assert_eq!(click.marker.as_deref(), Some("python_version >= '3.10'"));
    }

    #[test]
    fn read_project_requires_version() {
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "alpha"
dynamic = ["version"]
"#,
        );

        let result = read_project(&path);
        assert!(matches!(
            result,
            Err(ManifestError::MissingField { ref field, .. }) if field == "project.version"
        ));
    }

    #[test]
    fn read_project_rejects_bad_requirement() {
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "alpha"
version = "1.0.0"
dependencies = ["beta[oops"]
"#,
        );

        assert!(matches!(
            read_project(&path),
            Err(ManifestError::InvalidRequirement { .. })
        ));
    }

    #[test]
    fn read_project_reports_malformed_toml() {
        let (_dir, path) = write_manifest("[project\nname = ");
        assert!(matches!(read_project(&path), Err(ManifestError::Parse { .. })));
    }

    #[test]
    fn read_version_reads_project_version() {
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "alpha"
version = "0.3.7"
"#,
        );
        assert_eq!(read_version(&path).expect("read"), Version::new(0, 3, 7));
    }

    #[test]
    fn read_workspace_returns_members_and_excludes() {
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "root"
version = "0.0.0"

[tool.uv.workspace]
members = ["packages/*", "libs/core"]
exclude = ["packages/legacy"]
"#,
        );

        let workspace = read_workspace(&path).expect("read").expect("workspace");
        assert_eq!(workspace.members, ["packages/*", "libs/core"]);
        assert_eq!(workspace.exclude, ["packages/legacy"]);
    }

    #[test]
    fn read_workspace_without_table_is_none() {
        let (_dir, path) = write_manifest("[project]\nname = \"x\"\n");
        assert!(read_workspace(&path).expect("read").is_none());
    }

    #[test]
    fn read_workspace_with_empty_members_fails() {
        let (_dir, path) = write_manifest("[tool.uv.workspace]\nmembers = []\n");
        assert!(matches!(
            read_workspace(&path),
            Err(ManifestError::NoWorkspaceMembers { .. })
        ));
    }
}
