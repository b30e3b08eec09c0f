use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::info;

use super::detect::ChangeDetector;
use super::discovery::discover;
use super::propagate::propagate;
use crate::traits::{GitProvider, ProjectProvider};
use crate::types::{ChangeRecord, DirtySet, ReleaseRequest};
use crate::{OperationError, Result};

/// What a release would do, computed without building or writing anything.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    /// Packages that would be rebuilt, sorted.
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
    pub last_tags: BTreeMap<String, Option<String>>,
    pub release: String,
    #[serde(skip)]
    pub records: BTreeMap<String, ChangeRecord>,
    #[serde(skip)]
    pub dirty: DirtySet,
}

impl PlanOutput {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| OperationError::Json {
            context: "plan",
            source,
        })
    }

    /// `key=value` lines in the format of a CI step output file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn github_output(&self) -> Result<String> {
        Ok(format!(
            "changed={}\nunchanged={}\nlast_tags={}\nrelease={}\n",
            compact(&self.changed)?,
            compact(&self.unchanged)?,
            compact(&self.last_tags)?,
            self.release
        ))
    }
}

fn compact<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| OperationError::Json {
        context: "plan",
        source,
    })
}

pub struct PlanOperation<P, G> {
    project_provider: P,
    git_provider: G,
}

impl<P, G> PlanOperation<P, G>
where
    P: ProjectProvider,
    G: GitProvider,
{
    pub fn new(project_provider: P, git_provider: G) -> Self {
        Self {
            project_provider,
            git_provider,
        }
    }

    /// # Errors
    ///
    /// Returns [`OperationError::NothingToRelease`] if no package changed,
    /// or any discovery or detection error.
    pub fn execute(&self, request: &ReleaseRequest) -> Result<PlanOutput> {
        let discovery = discover(&self.project_provider, &self.git_provider, request)?;
        let packages = discovery.packages();

        let detector = ChangeDetector::new(
            &self.git_provider,
            &discovery.workspace.root,
            &discovery.config,
        )?;
        let records = detector.detect_all(&packages, request.force_all)?;

        let directly_changed: BTreeSet<String> = records
            .values()
            .filter(|record| record.changed_directly)
            .map(|record| record.package.clone())
            .collect();
        let dirty = propagate(&discovery.graph, &directly_changed, request.force_all);

        if dirty.is_empty() {
            return Err(OperationError::NothingToRelease);
        }

        let changed: Vec<String> = dirty.names().map(String::from).collect();
        let unchanged: Vec<String> = discovery
            .graph
            .names()
            .filter(|name| !dirty.contains(name))
            .map(String::from)
            .collect();
        let last_tags = records
            .iter()
            .map(|(name, record)| (name.clone(), record.last_tag.clone()))
            .collect();

        info!(
            changed = changed.len(),
            unchanged = unchanged.len(),
            release = %discovery.release_name,
            "planned release"
        );

        Ok(PlanOutput {
            changed,
            unchanged,
            last_tags,
            release: discovery.release_name,
            records,
            dirty,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use wheels_git::{FileChange, FileStatus};

    use super::*;
    use crate::mocks::{MockGitProvider, MockProjectProvider};

    fn request() -> ReleaseRequest {
        ReleaseRequest {
            start_path: PathBuf::from("/ws"),
            ..ReleaseRequest::default()
        }
    }

    fn released_fixture() -> MockGitProvider {
        MockGitProvider::new("head")
            .with_tag("alpha/v1.0.0", "c1")
            .with_tag("beta/v2.1.0", "c1")
            .with_tag("delta/v0.3.4", "c1")
            .with_tag("gamma/v1.2.0", "c1")
            .with_tag("r3", "c1")
            .with_reachable(&["c1"])
    }

    #[test]
    fn dependents_of_changed_package_are_planned() -> anyhow::Result<()> {
        let git = released_fixture().with_diff(
            "c1",
            vec![FileChange::new(
                PathBuf::from("packages/beta/src/beta/__init__.py"),
                FileStatus::Modified,
            )],
        );
        let operation = PlanOperation::new(MockProjectProvider::fixture(), git);

        let plan = operation.execute(&request())?;

        assert_eq!(plan.changed, vec!["beta", "gamma"]);
        assert_eq!(plan.unchanged, vec!["alpha", "delta"]);
        assert_eq!(plan.release, "r4");
        assert_eq!(plan.last_tags["alpha"].as_deref(), Some("alpha/v1.0.0"));
        Ok(())
    }

    #[test]
    fn nothing_changed_is_an_error() {
        let operation = PlanOperation::new(MockProjectProvider::fixture(), released_fixture());

        let result = operation.execute(&request());

        assert!(matches!(result, Err(OperationError::NothingToRelease)));
    }

    #[test]
    fn force_all_plans_everything() -> anyhow::Result<()> {
        let request = ReleaseRequest {
            force_all: true,
            ..request()
        };
        let operation = PlanOperation::new(MockProjectProvider::fixture(), released_fixture());

        let plan = operation.execute(&request)?;

        assert_eq!(plan.changed.len(), 4);
        assert!(plan.unchanged.is_empty());
        Ok(())
    }

    #[test]
    fn github_output_lines() -> anyhow::Result<()> {
        let operation =
            PlanOperation::new(MockProjectProvider::fixture(), MockGitProvider::new("head"));

        let plan = operation.execute(&request())?;
        let output = plan.github_output()?;

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], r#"changed=["alpha","beta","delta","gamma"]"#);
        assert_eq!(lines[1], "unchanged=[]");
        assert!(lines[2].starts_with(r#"last_tags={"alpha":null"#));
        assert_eq!(lines[3], "release=r1");
        Ok(())
    }

    #[test]
    fn json_has_plan_keys_only() -> anyhow::Result<()> {
        let operation =
            PlanOperation::new(MockProjectProvider::fixture(), MockGitProvider::new("head"));

        let plan = operation.execute(&request())?;
        let value: serde_json::Value = serde_json::from_str(&plan.to_json()?)?;

        let keys: Vec<&str> = value
            .as_object()
            .map(|object| object.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["changed", "last_tags", "release", "unchanged"]);
        Ok(())
    }
}
