use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;
use toml_edit::{Array, DocumentMut, Item, Value, value};

use crate::error::ManifestError;
use crate::reader::{read_document, read_version};
use crate::requirement::Requirement;

fn write_document(path: &Path, doc: &DocumentMut) -> Result<(), ManifestError> {
    std::fs::write(path, doc.to_string()).map_err(|source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Replaces `[project].version`, keeping the value's surrounding whitespace
/// and trailing comment.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, parsed, or written, or
/// if it has no literal `[project].version`.
pub fn write_version(path: &Path, version: &Version) -> Result<(), ManifestError> {
    let mut doc = read_document(path)?;

    let project = doc
        .get_mut("project")
        .and_then(Item::as_table_like_mut)
        .ok_or_else(|| ManifestError::MissingField {
            path: path.to_path_buf(),
            field: "project".to_string(),
        })?;

    let item = project
        .get_mut("version")
        .ok_or_else(|| ManifestError::MissingField {
            path: path.to_path_buf(),
            field: "project.version".to_string(),
        })?;

    let decor = item.as_value().map(|existing| existing.decor().clone());
    *item = value(version.to_string());
    if let (Some(decor), Some(updated)) = (decor, item.as_value_mut()) {
        *updated.decor_mut() = decor;
    }

    write_document(path, &doc)
}

/// # Errors
///
/// Returns `ManifestError::VerificationFailed` if the version in the manifest
/// does not match the expected version.
pub fn verify_version(path: &Path, expected: &Version) -> Result<(), ManifestError> {
    let actual = read_version(path)?;

    if actual != *expected {
        return Err(ManifestError::VerificationFailed {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }

    Ok(())
}

/// Pins a single dependency; see [`write_dependency_pins`].
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, parsed, or written.
pub fn write_dependency_pin(
    path: &Path,
    dependency_name: &str,
    version: &Version,
) -> Result<usize, ManifestError> {
    let pins = BTreeMap::from([(wheels_core::canonicalize_name(dependency_name), version.clone())]);
    write_dependency_pins(path, &pins)
}

/// Rewrites every requirement on a package in `pins` (keyed by canonical
/// name) to `name[extras]==version; marker`, in `[project].dependencies`,
/// every `[project.optional-dependencies]` list and every
/// `[dependency-groups]` list.
///
/// The file is only written if something changed. Returns the number of
/// rewritten entries.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, parsed, or written, or if
/// a requirement string cannot be parsed.
pub fn write_dependency_pins(
    path: &Path,
    pins: &BTreeMap<String, Version>,
) -> Result<usize, ManifestError> {
    if pins.is_empty() {
        return Ok(0);
    }

    let mut doc = read_document(path)?;
    let mut rewritten = 0;

    for_each_dependency_array(&mut doc, |array| {
        rewritten += pin_entries(array, pins, path)?;
        Ok(())
    })?;

    if rewritten > 0 {
        write_document(path, &doc)?;
    }

    Ok(rewritten)
}

fn for_each_dependency_array(
    doc: &mut DocumentMut,
    mut visit: impl FnMut(&mut Array) -> Result<(), ManifestError>,
) -> Result<(), ManifestError> {
    if let Some(project) = doc.get_mut("project").and_then(Item::as_table_like_mut) {
        if let Some(deps) = project.get_mut("dependencies").and_then(Item::as_array_mut) {
            visit(deps)?;
        }

        if let Some(extras) = project
            .get_mut("optional-dependencies")
            .and_then(Item::as_table_like_mut)
        {
            for (_, item) in extras.iter_mut() {
                if let Some(array) = item.as_array_mut() {
                    visit(array)?;
                }
            }
        }
    }

    if let Some(groups) = doc
        .get_mut("dependency-groups")
        .and_then(Item::as_table_like_mut)
    {
        for (_, item) in groups.iter_mut() {
            if let Some(array) = item.as_array_mut() {
                visit(array)?;
            }
        }
    }

    Ok(())
}

fn pin_entries(
    array: &mut Array,
    pins: &BTreeMap<String, Version>,
    path: &Path,
) -> Result<usize, ManifestError> {
    let mut rewritten = 0;

    for entry in array.iter_mut() {
        let Some(raw) = entry.as_str().map(str::to_owned) else {
            continue;
        };

        let requirement =
            Requirement::parse(&raw).map_err(|source| ManifestError::InvalidRequirement {
                path: path.to_path_buf(),
                source,
            })?;

        let Some(version) = pins.get(&requirement.canonical_name()) else {
            continue;
        };

        let pinned = requirement.pinned(version).to_string();
        if pinned == raw {
            continue;
        }

        let decor = entry.decor().clone();
        *entry = Value::from(pinned);
        *entry.decor_mut() = decor;
        rewritten += 1;
    }

    Ok(rewritten)
}
