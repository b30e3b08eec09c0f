use std::collections::BTreeSet;

use tracing::debug;
use wheels_project::PackageGraph;

use crate::types::{DirtyCause, DirtySet};

/// Every directly changed package plus everything that depends on one of
/// them, directly or transitively. `force_all` marks the whole workspace.
#[must_use]
pub fn propagate(
    graph: &PackageGraph,
    directly_changed: &BTreeSet<String>,
    force_all: bool,
) -> DirtySet {
    let mut dirty = DirtySet::new();

    if force_all {
        for name in graph.names() {
            dirty.insert(name, DirtyCause::Forced);
        }
        return dirty;
    }

    extend(graph, &mut dirty, directly_changed, &DirtyCause::Changed);
    dirty
}

/// Adds `roots` with `cause`, and their dependents, to `dirty`. Returns the
/// names that were not dirty before.
pub fn extend(
    graph: &PackageGraph,
    dirty: &mut DirtySet,
    roots: &BTreeSet<String>,
    cause: &DirtyCause,
) -> Vec<String> {
    let mut added = Vec::new();

    for (name, via) in graph.reverse_closure(roots) {
        let cause = match via {
            None => cause.clone(),
            Some(dependency) => DirtyCause::DependsOn(dependency),
        };
        debug!(package = %name, %cause, "marking dirty");
        if dirty.insert(name.clone(), cause) {
            added.push(name);
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::fixture_packages;

    fn graph() -> PackageGraph {
        PackageGraph::build(fixture_packages()).expect("fixture graph is acyclic")
    }

    fn changed(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn dirty_names(dirty: &DirtySet) -> Vec<&str> {
        dirty.names().collect()
    }

    #[test]
    fn leaf_change_stays_local() {
        let dirty = propagate(&graph(), &changed(&["gamma"]), false);
        assert_eq!(dirty_names(&dirty), vec!["gamma"]);
    }

    #[test]
    fn root_change_reaches_every_dependent() {
        let dirty = propagate(&graph(), &changed(&["alpha"]), false);

        assert_eq!(dirty_names(&dirty), vec!["alpha", "beta", "delta", "gamma"]);
        assert_eq!(dirty.cause("alpha"), Some(&DirtyCause::Changed));
        assert_eq!(
            dirty.cause("gamma"),
            Some(&DirtyCause::DependsOn("beta".to_string()))
        );
    }

    #[test]
    fn sibling_without_dependents() {
        let dirty = propagate(&graph(), &changed(&["delta"]), false);
        assert_eq!(dirty_names(&dirty), vec!["delta"]);
    }

    #[test]
    fn middle_change_reaches_upward_only() {
        let dirty = propagate(&graph(), &changed(&["beta"]), false);
        assert_eq!(dirty_names(&dirty), vec!["beta", "gamma"]);
    }

    #[test]
    fn result_is_superset_of_input() {
        let input = changed(&["beta", "delta"]);
        let dirty = propagate(&graph(), &input, false);

        assert!(input.iter().all(|name| dirty.contains(name)));
        assert!(!dirty.contains("alpha"));
    }

    #[test]
    fn force_all_marks_everything() {
        let dirty = propagate(&graph(), &BTreeSet::new(), true);

        assert_eq!(dirty.len(), 4);
        assert!(dirty.iter().all(|(_, cause)| *cause == DirtyCause::Forced));
    }

    #[test]
    fn nothing_changed_is_empty() {
        assert!(propagate(&graph(), &BTreeSet::new(), false).is_empty());
    }

    #[test]
    fn extend_reports_only_new_members() {
        let graph = graph();
        let mut dirty = propagate(&graph, &changed(&["gamma"]), false);

        let added = extend(&graph, &mut dirty, &changed(&["beta"]), &DirtyCause::MissingArtifact);

        assert_eq!(added, vec!["beta".to_string()]);
        assert_eq!(dirty.cause("beta"), Some(&DirtyCause::MissingArtifact));
        assert_eq!(dirty.cause("gamma"), Some(&DirtyCause::Changed));
    }
}
