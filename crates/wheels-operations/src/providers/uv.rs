use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};
use wheels_core::{Artifact, PackageInfo};

use super::process::run_with_timeout;
use crate::traits::Builder;
use crate::{OperationError, Result};

/// Builds packages with `uv build <package-dir> --out-dir <staging>` and moves
/// the produced distributions into the dist directory.
pub struct UvBuilder {
    program: String,
    workspace_root: PathBuf,
    timeout: Duration,
}

impl UvBuilder {
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        workspace_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            workspace_root: workspace_root.into(),
            timeout,
        }
    }
}

impl Builder for UvBuilder {
    fn build(&self, package: &PackageInfo, dist_dir: &Path) -> Result<Vec<Artifact>> {
        fs::create_dir_all(dist_dir)?;
        // Staging inside the dist dir keeps the final rename on one filesystem.
        let staging = tempfile::Builder::new()
            .prefix(".lazy-wheels-build-")
            .tempdir_in(dist_dir)?;

        let args: Vec<OsString> = vec![
            "build".into(),
            package.path.clone().into_os_string(),
            "--out-dir".into(),
            staging.path().as_os_str().to_os_string(),
        ];

        info!(package = %package.name, version = %package.version, "building");
        run_with_timeout(&self.program, &args, &self.workspace_root, self.timeout)?
            .into_success()?;

        let artifacts = collect_distributions(package, staging.path(), dist_dir)?;
        if artifacts.is_empty() {
            return Err(OperationError::NoArtifactsProduced {
                package: package.name.clone(),
                out_dir: staging.path().to_path_buf(),
            });
        }
        Ok(artifacts)
    }
}

pub(crate) fn is_distribution(file_name: &str) -> bool {
    file_name.ends_with(".whl") || file_name.ends_with(".tar.gz")
}

fn collect_distributions(
    package: &PackageInfo,
    staging: &Path,
    dist_dir: &Path,
) -> Result<Vec<Artifact>> {
    let mut produced: Vec<PathBuf> = fs::read_dir(staging)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .is_some_and(|name| is_distribution(&name.to_string_lossy()))
        })
        .collect();
    produced.sort();

    let mut artifacts = Vec::with_capacity(produced.len());
    for source in produced {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = dist_dir.join(file_name);
        fs::rename(&source, &target)?;
        debug!(package = %package.name, artifact = %target.display(), "collected artifact");
        artifacts.push(Artifact {
            package: package.name.clone(),
            version: package.version.clone(),
            path: target,
        });
    }
    Ok(artifacts)
}
