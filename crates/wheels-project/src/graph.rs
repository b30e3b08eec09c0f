use std::collections::{BTreeMap, BTreeSet, VecDeque};

use wheels_core::PackageInfo;

use crate::error::ProjectError;

/// Internal dependency graph of a workspace. Edges only connect members;
/// requirements on outside distributions stay on [`PackageInfo`].
#[derive(Debug, Clone)]
pub struct PackageGraph {
    packages: BTreeMap<String, PackageInfo>,
    /// depender -> dependees
    dependencies: BTreeMap<String, BTreeSet<String>>,
    /// dependee -> dependers
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl PackageGraph {
    /// # Errors
    ///
    /// Returns [`ProjectError::DuplicatePackage`] if two packages share a
    /// name, or [`ProjectError::CyclicDependency`] naming the first cycle
    /// found.
    pub fn build(packages: Vec<PackageInfo>) -> Result<Self, ProjectError> {
        let mut by_name: BTreeMap<String, PackageInfo> = BTreeMap::new();
        for package in packages {
            if let Some(existing) = by_name.get(&package.name) {
                return Err(ProjectError::DuplicatePackage {
                    name: package.name.clone(),
                    first: existing.relative_path.clone(),
                    second: package.relative_path,
                });
            }
            by_name.insert(package.name.clone(), package);
        }

        let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for name in by_name.keys() {
            dependencies.insert(name.clone(), BTreeSet::new());
            dependents.insert(name.clone(), BTreeSet::new());
        }

        for package in by_name.values() {
            for dep in &package.dependencies {
                if dep.name == package.name || !by_name.contains_key(&dep.name) {
                    continue;
                }
                if let Some(deps) = dependencies.get_mut(&package.name) {
                    deps.insert(dep.name.clone());
                }
                if let Some(rdeps) = dependents.get_mut(&dep.name) {
                    rdeps.insert(package.name.clone());
                }
            }
        }

        let graph = Self {
            packages: by_name,
            dependencies,
            dependents,
        };

        if let Some(cycle) = graph.find_cycle() {
            return Err(ProjectError::CyclicDependency { cycle });
        }

        Ok(graph)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    #[must_use]
    pub fn package(&self, name: &str) -> Option<&PackageInfo> {
        self.packages.get(name)
    }

    /// Packages in name order.
    pub fn packages(&self) -> impl Iterator<Item = &PackageInfo> {
        self.packages.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Internal packages `name` depends on.
    pub fn dependencies_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.dependencies
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Internal packages that depend on `name`.
    pub fn dependents_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    // Depth-first search with an explicit recursion stack; returns the path
    // of the first back edge, closed on its starting node.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut finished: BTreeSet<&str> = BTreeSet::new();

        for start in self.packages.keys() {
            if finished.contains(start.as_str()) {
                continue;
            }

            let mut stack: Vec<(&str, Vec<&str>)> = vec![(start.as_str(), self.pending_children(start))];
            let mut on_stack: Vec<&str> = vec![start.as_str()];

            while let Some((node, pending)) = stack.last_mut() {
                let Some(next) = pending.pop() else {
                    finished.insert(*node);
                    on_stack.pop();
                    stack.pop();
                    continue;
                };

                if let Some(position) = on_stack.iter().position(|n| *n == next) {
                    let mut cycle: Vec<String> =
                        on_stack[position..].iter().map(ToString::to_string).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }

                if finished.contains(next) {
                    continue;
                }

                on_stack.push(next);
                stack.push((next, self.pending_children(next)));
            }
        }

        None
    }

    // Reversed so that popping visits children in name order.
    fn pending_children(&self, name: &str) -> Vec<&str> {
        let mut children: Vec<&str> = self.dependencies_of(name).collect();
        children.reverse();
        children
    }

    /// Every package, dependencies before dependents; ties broken by name.
    #[must_use]
    pub fn topological_order(&self) -> Vec<String> {
        let all: BTreeSet<String> = self.packages.keys().cloned().collect();
        self.order_subset(&all)
    }

    /// Kahn's algorithm restricted to `subset`; edges leaving the subset are
    /// ignored. Unknown names are dropped.
    #[must_use]
    pub fn order_subset(&self, subset: &BTreeSet<String>) -> Vec<String> {
        let included: BTreeSet<&str> = subset
            .iter()
            .map(String::as_str)
            .filter(|name| self.contains(name))
            .collect();

        let mut indegree: BTreeMap<&str, usize> = included
            .iter()
            .map(|name| {
                let count = self
                    .dependencies_of(name)
                    .filter(|dep| included.contains(dep))
                    .count();
                (*name, count)
            })
            .collect();

        let mut ready: BTreeSet<&str> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order = Vec::with_capacity(included.len());

        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());

            for dependent in self.dependents_of(name) {
                if let Some(degree) = indegree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        order
    }

    /// Groups `subset` into levels: level 0 has no dependencies inside the
    /// subset, level n only depends on levels below n. Names within a level
    /// are sorted.
    #[must_use]
    pub fn levels(&self, subset: &BTreeSet<String>) -> Vec<Vec<String>> {
        let mut level_of: BTreeMap<String, usize> = BTreeMap::new();
        let mut levels: Vec<Vec<String>> = Vec::new();

        for name in self.order_subset(subset) {
            let level = self
                .dependencies_of(&name)
                .filter_map(|dep| level_of.get(dep))
                .map(|level| level + 1)
                .max()
                .unwrap_or(0);

            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(name.clone());
            level_of.insert(name, level);
        }

        for level in &mut levels {
            level.sort();
        }

        levels
    }

    /// Breadth-first walk over reverse edges from `roots`. Each reached
    /// package maps to the package it was reached from; roots map to `None`.
    #[must_use]
    pub fn reverse_closure(&self, roots: &BTreeSet<String>) -> BTreeMap<String, Option<String>> {
        let mut reached: BTreeMap<String, Option<String>> = BTreeMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for root in roots.iter().filter(|name| self.contains(name)) {
            reached.insert(root.clone(), None);
            queue.push_back(root.clone());
        }

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(&current) {
                if reached.contains_key(dependent) {
                    continue;
                }
                reached.insert(dependent.to_string(), Some(current.clone()));
                queue.push_back(dependent.to_string());
            }
        }

        reached
    }
}
