//! Dependency graph between the dependencies of one project
//!
//! Uses petgraph for cycle detection and topological ordering. Edges point
//! from a dependency to its dependent, so a topological sort yields leaves
//! first.

use crate::error::{QuarryError, QuarryResult};
use crate::project::ProjectIdentity;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Build-order graph over project identities
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<ProjectIdentity, ()>,
    node_map: HashMap<ProjectIdentity, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project to the graph
    pub fn add_project(&mut self, project: ProjectIdentity) {
        if !self.node_map.contains_key(&project) {
            let idx = self.graph.add_node(project.clone());
            self.node_map.insert(project, idx);
        }
    }

    /// Adds an edge: `dependent` depends on `dependency`.
    ///
    /// Projects that are not in the graph are ignored; they are not part of
    /// the set being built. A project depending on itself is a cycle.
    pub fn add_dependency(
        &mut self,
        dependent: &ProjectIdentity,
        dependency: &ProjectIdentity,
    ) -> QuarryResult<()> {
        if dependent == dependency {
            return Err(QuarryError::DependencyCycle(dependent.clone()));
        }

        let (Some(&from), Some(&to)) = (self.node_map.get(dependency), self.node_map.get(dependent))
        else {
            return Ok(());
        };

        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
        Ok(())
    }

    /// Direct dependencies of a project, sorted
    pub fn dependencies(&self, project: &ProjectIdentity) -> Vec<ProjectIdentity> {
        let Some(&idx) = self.node_map.get(project) else {
            return vec![];
        };

        let mut found: Vec<_> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        found.sort();
        found
    }

    /// Projects grouped into levels, dependencies before dependents.
    ///
    /// Every project's dependencies are in earlier levels, so the projects
    /// of one level can be built concurrently. Each level is sorted.
    pub fn levels(&self) -> QuarryResult<Vec<Vec<ProjectIdentity>>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            QuarryError::DependencyCycle(self.graph[cycle.node_id()].clone())
        })?;

        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        let mut levels: Vec<Vec<ProjectIdentity>> = Vec::new();

        for idx in sorted {
            let level = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .filter_map(|dep| depth.get(&dep))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(idx, level);

            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(self.graph[idx].clone());
        }

        for level in &mut levels {
            level.sort();
        }
        Ok(levels)
    }
}
