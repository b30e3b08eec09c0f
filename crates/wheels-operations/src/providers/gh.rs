use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use semver::Version;
use serde::Deserialize;
use tracing::{debug, info};

use super::process::run_with_timeout;
use super::uv::is_distribution;
use crate::retry::classify;
use crate::traits::{ReleaseHost, ReleaseSpec};
use crate::types::{PublishedRelease, RemoteArtifact};
use crate::{OperationError, Result};

const DEFAULT_RELEASE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct ReleaseListEntry {
    #[serde(rename = "tagName")]
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseView {
    #[serde(default)]
    assets: Vec<AssetEntry>,
}

#[derive(Debug, Deserialize)]
struct AssetEntry {
    name: String,
}

#[derive(Debug)]
struct ReleaseAssets {
    tag: String,
    assets: Vec<String>,
}

/// GitHub Releases driven through the `gh` CLI.
///
/// The release/asset listing is fetched once and cached; creating a release
/// invalidates it.
pub struct GhReleaseHost {
    program: String,
    cwd: PathBuf,
    timeout: Duration,
    release_limit: usize,
    index: Mutex<Option<Arc<Vec<ReleaseAssets>>>>,
}

impl GhReleaseHost {
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: "gh".to_string(),
            cwd: cwd.into(),
            timeout,
            release_limit: DEFAULT_RELEASE_LIMIT,
            index: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn gh(&self, operation: &str, args: &[OsString]) -> Result<String> {
        run_with_timeout(&self.program, args, &self.cwd, self.timeout)
            .and_then(super::process::CommandOutput::into_success)
            .map(|output| output.stdout)
            .map_err(|err| classify(operation, err))
    }

    fn asset_index(&self) -> Result<Arc<Vec<ReleaseAssets>>> {
        let mut cached = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = cached.as_ref() {
            return Ok(Arc::clone(index));
        }

        let listing = self.gh(
            "gh release list",
            &os_args(&[
                "release",
                "list",
                "--json",
                "tagName",
                "--limit",
                &self.release_limit.to_string(),
            ]),
        )?;
        let releases: Vec<ReleaseListEntry> =
            serde_json::from_str(&listing).map_err(|source| OperationError::Json {
                context: "gh release list",
                source,
            })?;

        let mut index = Vec::with_capacity(releases.len());
        for release in releases {
            let view = self.gh(
                "gh release view",
                &os_args(&["release", "view", &release.tag_name, "--json", "assets"]),
            )?;
            let view: ReleaseView =
                serde_json::from_str(&view).map_err(|source| OperationError::Json {
                    context: "gh release view",
                    source,
                })?;
            index.push(ReleaseAssets {
                tag: release.tag_name,
                assets: view.assets.into_iter().map(|asset| asset.name).collect(),
            });
        }
        debug!(releases = index.len(), "indexed published releases");

        let index = Arc::new(index);
        *cached = Some(Arc::clone(&index));
        Ok(index)
    }
}

impl ReleaseHost for GhReleaseHost {
    fn find_artifacts(&self, package: &str, version: &Version) -> Result<Vec<RemoteArtifact>> {
        let index = self.asset_index()?;
        let mut found: Vec<RemoteArtifact> = Vec::new();

        // Releases are listed newest first; the newest copy of a file wins.
        for release in index.iter() {
            for asset in &release.assets {
                if matches_distribution(asset, package, version)
                    && !found.iter().any(|known| &known.file_name == asset)
                {
                    found.push(RemoteArtifact {
                        release: release.tag.clone(),
                        file_name: asset.clone(),
                    });
                }
            }
        }
        Ok(found)
    }

    fn download(&self, artifact: &RemoteArtifact, dest_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dest_dir)?;
        let args: Vec<OsString> = vec![
            "release".into(),
            "download".into(),
            artifact.release.clone().into(),
            "--pattern".into(),
            artifact.file_name.clone().into(),
            "--dir".into(),
            dest_dir.as_os_str().to_os_string(),
            "--clobber".into(),
        ];
        self.gh("gh release download", &args)?;
        Ok(dest_dir.join(&artifact.file_name))
    }

    /// `--target` names the release commit by SHA, so GitHub must already
    /// have it. The release stage checks this against the remote-tracking
    /// branch before tagging.
    fn create_release(&self, spec: &ReleaseSpec) -> Result<PublishedRelease> {
        let mut args: Vec<OsString> = vec![
            "release".into(),
            "create".into(),
            spec.name.clone().into(),
        ];
        args.extend(spec.artifacts.iter().map(|path| path.as_os_str().to_os_string()));
        args.extend([
            "--target".into(),
            spec.target_commit.clone().into(),
            "--title".into(),
            spec.title.clone().into(),
            "--notes".into(),
            spec.notes.clone().into(),
        ]);

        info!(release = %spec.name, artifacts = spec.artifacts.len(), "creating release");
        let stdout = self.gh("gh release create", &args)?;

        *self.index.lock().unwrap_or_else(PoisonError::into_inner) = None;

        let url = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| line.starts_with("http"))
            .map(ToString::to_string);
        Ok(PublishedRelease {
            name: spec.name.clone(),
            url,
        })
    }
}

fn os_args(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

/// Whether `file_name` is a wheel or sdist of `package` at `version`.
/// Distribution file names spell the canonical name with underscores.
pub(crate) fn matches_distribution(file_name: &str, package: &str, version: &Version) -> bool {
    if !is_distribution(file_name) {
        return false;
    }
    let stem = format!("{}-{version}", package.replace('-', "_"));
    file_name.starts_with(&format!("{stem}-")) || file_name == format!("{stem}.tar.gz")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_wheels_and_sdists_of_exact_version() {
        let version = Version::new(1, 0, 0);

        assert!(matches_distribution(
            "pkg_alpha-1.0.0-py3-none-any.whl",
            "pkg-alpha",
            &version
        ));
        assert!(matches_distribution("pkg_alpha-1.0.0.tar.gz", "pkg-alpha", &version));
        assert!(!matches_distribution(
            "pkg_alpha-1.0.01-py3-none-any.whl",
            "pkg-alpha",
            &version
        ));
        assert!(!matches_distribution(
            "pkg_alpha_extra-1.0.0-py3-none-any.whl",
            "pkg-alpha",
            &version
        ));
        assert!(!matches_distribution("pkg_alpha-1.0.0.zip", "pkg-alpha", &version));
    }

    #[test]
    fn release_list_parses_tag_names() -> anyhow::Result<()> {
        let listing = r#"[{"tagName":"r2"},{"tagName":"r1"}]"#;

        let releases: Vec<ReleaseListEntry> = serde_json::from_str(listing)?;

        let tags: Vec<&str> = releases.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["r2", "r1"]);
        Ok(())
    }

    #[test]
    fn release_view_tolerates_missing_assets() -> anyhow::Result<()> {
        let view: ReleaseView = serde_json::from_str("{}")?;
        assert!(view.assets.is_empty());

        let view: ReleaseView =
            serde_json::from_str(r#"{"assets":[{"name":"a-1.0.0.tar.gz","size":3}]}"#)?;
        assert_eq!(view.assets[0].name, "a-1.0.0.tar.gz");
        Ok(())
    }
}
