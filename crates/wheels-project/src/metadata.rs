use std::path::Path;

use serde::Deserialize;

use crate::config::{MissingArtifactPolicy, RootChangePolicy};
use crate::error::ProjectError;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RootPyProject {
    #[serde(default)]
    pub(crate) tool: ToolSection,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ToolSection {
    #[serde(rename = "lazy-wheels")]
    pub(crate) lazy_wheels: Option<LazyWheelsMetadata>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct LazyWheelsMetadata {
    pub(crate) dist_dir: Option<String>,
    pub(crate) remote: Option<String>,
    pub(crate) release_prefix: Option<String>,
    pub(crate) commit_message: Option<String>,
    pub(crate) root_changes: Option<RootChangePolicy>,
    pub(crate) root_files: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) ignored_files: Vec<String>,
    pub(crate) missing_artifact: Option<MissingArtifactPolicy>,
    pub(crate) build_jobs: Option<usize>,
    pub(crate) fetch_jobs: Option<usize>,
    pub(crate) build_timeout_secs: Option<u64>,
    pub(crate) network_timeout_secs: Option<u64>,
    pub(crate) build_command: Option<String>,
    pub(crate) retry: Option<RetryMetadata>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct RetryMetadata {
    pub(crate) max_attempts: Option<u32>,
    pub(crate) base_delay_ms: Option<u64>,
    pub(crate) max_delay_ms: Option<u64>,
}

pub(crate) fn read_metadata(path: &Path) -> Result<Option<LazyWheelsMetadata>, ProjectError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProjectError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let root: RootPyProject =
        toml::from_str(&content).map_err(|source| ProjectError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(root.tool.lazy_wheels)
}
