//! core::graph
//!
//! Stack dependency graph representation and operations.
//!
//! # Architecture
//!
//! The stack graph is a DAG where:
//! - Nodes are stacks (managed and generic alike)
//! - Edges point from dependent to dependency
//! - A stack may have any number of dependencies
//!
//! # Invariants
//!
//! - Edges are deduplicated; adding an edge twice is a no-op
//! - Iteration follows insertion order, so every derived ordering is
//!   deterministic for a given construction sequence
//! - The graph itself accepts cycles; [`StackGraph::find_cycle`] reports them

use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

use super::types::StackName;

/// The dependency graph between the stacks of one application.
#[derive(Debug, Default, Clone)]
pub struct StackGraph {
    /// Dependencies of each stack (every node is a key)
    dependencies: IndexMap<StackName, IndexSet<StackName>>,
    /// Reverse edges, kept in sync with `dependencies`
    dependents: IndexMap<StackName, IndexSet<StackName>>,
}

impl StackGraph {
    /// Create an empty stack graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack without edges.
    ///
    /// Returns `false` if the stack was already present.
    pub fn add_node(&mut self, stack: StackName) -> bool {
        if self.dependencies.contains_key(&stack) {
            return false;
        }
        self.dependents.insert(stack.clone(), IndexSet::new());
        self.dependencies.insert(stack, IndexSet::new());
        true
    }

    /// Record that `dependent` depends on `dependency`.
    ///
    /// Both stacks are added as nodes if missing. Returns `true` if the
    /// edge is new.
    ///
    /// # Example
    ///
    /// ```
    /// use multistack::core::graph::StackGraph;
    /// use multistack::core::types::StackName;
    ///
    /// let mut graph = StackGraph::new();
    /// let vpc = StackName::new("vpc").unwrap();
    /// let cluster = StackName::new("cluster").unwrap();
    ///
    /// assert!(graph.add_edge(cluster.clone(), vpc.clone()));
    /// assert!(!graph.add_edge(cluster.clone(), vpc.clone()));
    /// assert!(graph.has_edge(&cluster, &vpc));
    /// ```
    pub fn add_edge(&mut self, dependent: StackName, dependency: StackName) -> bool {
        self.add_node(dependent.clone());
        self.add_node(dependency.clone());

        let inserted = self
            .dependencies
            .get_mut(&dependent)
            .map(|deps| deps.insert(dependency.clone()))
            .unwrap_or(false);
        if inserted {
            if let Some(rev) = self.dependents.get_mut(&dependency) {
                rev.insert(dependent);
            }
        }
        inserted
    }

    /// Whether the stack is part of the graph.
    pub fn contains(&self, stack: &StackName) -> bool {
        self.dependencies.contains_key(stack)
    }

    /// Whether `dependent` directly depends on `dependency`.
    pub fn has_edge(&self, dependent: &StackName, dependency: &StackName) -> bool {
        self.dependencies
            .get(dependent)
            .is_some_and(|deps| deps.contains(dependency))
    }

    /// Direct dependencies of a stack, in declaration order.
    pub fn dependencies(&self, stack: &StackName) -> Option<&IndexSet<StackName>> {
        self.dependencies.get(stack)
    }

    /// Direct dependents of a stack, in declaration order.
    pub fn dependents(&self, stack: &StackName) -> Option<&IndexSet<StackName>> {
        self.dependents.get(stack)
    }

    /// All stacks in insertion order.
    pub fn stacks(&self) -> impl Iterator<Item = &StackName> {
        self.dependencies.keys()
    }

    /// Number of stacks.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Whether the graph has no stacks.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(IndexSet::len).sum()
    }

    /// Get all stacks that depend on `stack`, directly or transitively.
    ///
    /// Uses breadth-first traversal over the reverse edges.
    pub fn transitive_dependents(&self, stack: &StackName) -> IndexSet<StackName> {
        Self::reach(&self.dependents, stack)
    }

    /// Get all stacks `stack` depends on, directly or transitively.
    pub fn transitive_dependencies(&self, stack: &StackName) -> IndexSet<StackName> {
        Self::reach(&self.dependencies, stack)
    }

    fn reach(
        edges: &IndexMap<StackName, IndexSet<StackName>>,
        start: &StackName,
    ) -> IndexSet<StackName> {
        let mut result = IndexSet::new();
        let mut queue = VecDeque::new();

        if let Some(next) = edges.get(start) {
            queue.extend(next.iter().cloned());
        }

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                if let Some(next) = edges.get(&current) {
                    queue.extend(next.iter().cloned());
                }
            }
        }

        result
    }

    /// Check if the graph contains cycles.
    ///
    /// Returns the cycle as a path that starts and ends with the same
    /// stack, e.g. `[a, b, a]`.
    pub fn find_cycle(&self) -> Option<Vec<StackName>> {
        let mut visited = IndexSet::new();
        let mut path = Vec::new();

        for stack in self.dependencies.keys() {
            if let Some(cycle) = self.cycle_from(stack, &mut visited, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn cycle_from(
        &self,
        stack: &StackName,
        visited: &mut IndexSet<StackName>,
        path: &mut Vec<StackName>,
    ) -> Option<Vec<StackName>> {
        if let Some(pos) = path.iter().position(|s| s == stack) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(stack.clone());
            return Some(cycle);
        }
        if visited.contains(stack) {
            return None;
        }

        visited.insert(stack.clone());
        path.push(stack.clone());

        if let Some(deps) = self.dependencies.get(stack) {
            for dep in deps {
                if let Some(cycle) = self.cycle_from(dep, visited, path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        None
    }

    /// Compute the deploy order.
    ///
    /// Every stack comes after all of its dependencies. Among stacks that
    /// are ready at the same time, insertion order wins, which keeps the
    /// result deterministic. Stacks on a cycle are left out; check
    /// [`find_cycle`](Self::find_cycle) first.
    ///
    /// # Example
    ///
    /// ```
    /// use multistack::core::graph::StackGraph;
    /// use multistack::core::types::StackName;
    ///
    /// let mut graph = StackGraph::new();
    /// let vpc = StackName::new("vpc").unwrap();
    /// let cluster = StackName::new("cluster").unwrap();
    /// let app = StackName::new("app").unwrap();
    ///
    /// graph.add_node(app.clone());
    /// graph.add_edge(app.clone(), cluster.clone());
    /// graph.add_edge(cluster.clone(), vpc.clone());
    ///
    /// assert_eq!(graph.topological_order(), vec![vpc, cluster, app]);
    /// ```
    pub fn topological_order(&self) -> Vec<StackName> {
        let mut emitted: IndexSet<StackName> = IndexSet::with_capacity(self.len());

        loop {
            let next = self.dependencies.iter().find(|(stack, deps)| {
                !emitted.contains(*stack) && deps.iter().all(|d| emitted.contains(d))
            });
            match next {
                Some((stack, _)) => {
                    emitted.insert(stack.clone());
                }
                None => break,
            }
        }

        emitted.into_iter().collect()
    }
}

/// Render a cycle path as `a -> b -> a`.
pub fn format_cycle(cycle: &[StackName]) -> String {
    cycle
        .iter()
        .map(StackName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
