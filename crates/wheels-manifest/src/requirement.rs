use std::collections::BTreeSet;
use std::fmt;

use semver::Version;
use wheels_core::{Dependency, DependencyGroup, canonicalize_name};

use crate::error::RequirementError;

/// A PEP 508 requirement string split into its parts.
///
/// Only the pieces the release flow needs are modelled: the specifier and
/// marker are kept as opaque text so they round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Name as written, not normalized.
    pub name: String,
    pub extras: BTreeSet<String>,
    pub specifier: Option<String>,
    pub url: Option<String>,
    pub marker: Option<String>,
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')
}

fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let starts_ok = chars.next().is_some_and(|ch| ch.is_ascii_alphanumeric());
    let ends_ok = value.chars().last().is_some_and(|ch| ch.is_ascii_alphanumeric());
    starts_ok && ends_ok && value.chars().all(is_name_char)
}

impl Requirement {
    /// # Errors
    ///
    /// Returns [`RequirementError`] if the name, extras, URL or marker are
    /// malformed.
    pub fn parse(input: &str) -> Result<Self, RequirementError> {
        let error = |reason| RequirementError {
            requirement: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        let name_end = trimmed
            .find(|ch: char| !is_name_char(ch))
            .unwrap_or(trimmed.len());
        let name = &trimmed[..name_end];
        if !is_valid_identifier(name) {
            return Err(error("missing or malformed package name"));
        }

        let mut rest = trimmed[name_end..].trim_start();

        let mut extras = BTreeSet::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket
                .find(']')
                .ok_or_else(|| error("unclosed extras bracket"))?;
            for extra in after_bracket[..close].split(',').map(str::trim) {
                if extra.is_empty() {
                    continue;
                }
                if !is_valid_identifier(extra) {
                    return Err(error("malformed extra name"));
                }
                extras.insert(extra.to_string());
            }
            rest = after_bracket[close + 1..].trim_start();
        }

        let is_url = rest.starts_with('@');
        let (body, marker) = split_marker(rest, is_url);

        let marker = match marker {
            Some(marker) if marker.is_empty() => return Err(error("empty environment marker")),
            Some(marker) => Some(marker.to_string()),
            None => None,
        };

        let mut specifier = None;
        let mut url = None;

        if is_url {
            let location = body[1..].trim();
            if location.is_empty() {
                return Err(error("missing URL after '@'"));
            }
            url = Some(location.to_string());
        } else {
            let spec = body
                .strip_prefix('(')
                .and_then(|inner| inner.strip_suffix(')'))
                .unwrap_or(body)
                .trim();
            if !spec.is_empty() {
                if !spec.starts_with(['<', '>', '=', '!', '~']) {
                    return Err(error("unexpected text after package name"));
                }
                specifier = Some(spec.to_string());
            }
        }

        Ok(Self {
            name: name.to_string(),
            extras,
            specifier,
            url,
            marker,
        })
    }

    #[must_use]
    pub fn canonical_name(&self) -> String {
        canonicalize_name(&self.name)
    }

    /// Returns a copy pinned to exactly `version`, keeping name spelling,
    /// extras and marker. A direct URL reference is replaced by the pin.
    #[must_use]
    pub fn pinned(&self, version: &Version) -> Self {
        Self {
            specifier: Some(format!("=={version}")),
            url: None,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn into_dependency(self, group: DependencyGroup) -> Dependency {
        Dependency {
            name: self.canonical_name(),
            raw_name: self.name,
            extras: self.extras,
            specifier: self.specifier,
            marker: self.marker,
            group,
        }
    }
}

/// Splits off the environment marker. In the URL form the `;` must be
/// preceded by whitespace, since URLs may contain semicolons.
fn split_marker(rest: &str, is_url: bool) -> (&str, Option<&str>) {
    let position = if is_url {
        rest.char_indices()
            .zip(rest.chars().skip(1))
            .find(|((_, ch), next)| ch.is_whitespace() && *next == ';')
            .map(|((idx, ch), _)| idx + ch.len_utf8())
    } else {
        rest.find(';')
    };

    match position {
        Some(idx) => (rest[..idx].trim_end(), Some(rest[idx + 1..].trim())),
        None => (rest.trim_end(), None),
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;

        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }

        if let Some(url) = &self.url {
            write!(f, " @ {url}")?;
            if let Some(marker) = &self.marker {
                write!(f, " ; {marker}")?;
            }
            return Ok(());
        }

        if let Some(specifier) = &self.specifier {
            f.write_str(specifier)?;
        }

        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }

        Ok(())
    }
}
