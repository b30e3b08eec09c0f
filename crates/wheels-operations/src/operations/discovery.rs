use tracing::{debug, info};
use wheels_core::{PackageInfo, ReleaseName};
use wheels_project::{PackageGraph, ReleaseConfig, UvWorkspace};

use crate::Result;
use crate::traits::{GitProvider, ProjectProvider};
use crate::types::ReleaseRequest;

/// Everything known about the workspace before change detection.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub workspace: UvWorkspace,
    pub config: ReleaseConfig,
    pub graph: PackageGraph,
    pub head_sha: String,
    pub release_name: String,
}

impl Discovery {
    #[must_use]
    pub fn packages(&self) -> Vec<&PackageInfo> {
        self.graph.packages().collect()
    }
}

/// Reads the workspace, its configuration and dependency graph, and settles
/// the release name.
///
/// # Errors
///
/// Returns an error if the workspace or config cannot be read, the graph has
/// a cycle or duplicate package, or the repository cannot be queried.
pub fn discover<P, G>(project: &P, git: &G, request: &ReleaseRequest) -> Result<Discovery>
where
    P: ProjectProvider,
    G: GitProvider,
{
    let workspace = project.discover_workspace(&request.start_path)?;
    let mut config = project.load_config(&workspace)?;
    if let Some(jobs) = request.build_jobs {
        config = config.with_build_jobs(jobs);
    }

    let graph = PackageGraph::build(workspace.packages.clone())?;
    let head_sha = git.head_sha(&workspace.root)?;
    let release_name = match &request.release_name {
        Some(name) => name.clone(),
        None => next_release_name(git, &workspace, &config)?,
    };

    info!(
        root = %workspace.root.display(),
        packages = graph.len(),
        release = %release_name,
        "discovered workspace"
    );

    Ok(Discovery {
        workspace,
        config,
        graph,
        head_sha,
        release_name,
    })
}

fn next_release_name<G: GitProvider>(
    git: &G,
    workspace: &UvWorkspace,
    config: &ReleaseConfig,
) -> Result<String> {
    let prefix = config.release_prefix();
    let tags = git.list_tags(&workspace.root, prefix)?;
    let next = ReleaseName::next_after(prefix, tags.iter().map(|tag| tag.name.as_str()));
    debug!(existing = tags.len(), next = %next, "picked release name");
    Ok(next.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockGitProvider, MockProjectProvider};

    fn request() -> ReleaseRequest {
        ReleaseRequest {
            start_path: "/ws".into(),
            ..ReleaseRequest::default()
        }
    }

    #[test]
    fn first_release_name_is_r1() -> anyhow::Result<()> {
        let git = MockGitProvider::new("head");

        let discovery = discover(&MockProjectProvider::fixture(), &git, &request())?;

        assert_eq!(discovery.release_name, "r1");
        assert_eq!(discovery.graph.len(), 4);
        assert_eq!(discovery.head_sha, "head");
        Ok(())
    }

    #[test]
    fn release_name_follows_highest_existing() -> anyhow::Result<()> {
        let git = MockGitProvider::new("head")
            .with_tag("r5", "c5")
            .with_tag("r4", "c4")
            .with_tag("rc-notes", "c1")
            .with_tag("requests-shim/v1.0.0", "c1");

        let discovery = discover(&MockProjectProvider::fixture(), &git, &request())?;

        assert_eq!(discovery.release_name, "r6");
        Ok(())
    }

    #[test]
    fn explicit_name_is_used_verbatim() -> anyhow::Result<()> {
        let git = MockGitProvider::new("head").with_tag("r5", "c5");
        let request = ReleaseRequest {
            release_name: Some("spring-cleanup".to_string()),
            ..request()
        };

        let discovery = discover(&MockProjectProvider::fixture(), &git, &request)?;

        assert_eq!(discovery.release_name, "spring-cleanup");
        Ok(())
    }

    #[test]
    fn jobs_override_replaces_configured_bound() -> anyhow::Result<()> {
        let git = MockGitProvider::new("head");
        let request = ReleaseRequest {
            build_jobs: Some(3),
            ..request()
        };

        let discovery = discover(&MockProjectProvider::fixture(), &git, &request)?;

        assert_eq!(discovery.config.build_jobs(), 3);
        Ok(())
    }

    #[test]
    fn cycle_fails_discovery() {
        use crate::mocks::package;

        let project = MockProjectProvider::new(vec![
            package("alpha", "1.0.0", &["beta"]),
            package("beta", "1.0.0", &["alpha"]),
        ]);
        let git = MockGitProvider::new("head");

        let result = discover(&project, &git, &request());

        assert!(matches!(
            result,
            Err(crate::OperationError::Project(
                wheels_project::ProjectError::CyclicDependency { .. }
            ))
        ));
    }
}
