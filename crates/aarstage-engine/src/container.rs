//! Per-scope dependency containers and their flattened views.

use std::collections::HashSet;

use crate::dependency::{DependencyGraph, Node, NodeId};

/// The resolved dependencies of one configuration in one scope.
///
/// The three lists are disjoint and keep first-discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyContainer {
    pub libraries: Vec<NodeId>,
    pub jars: Vec<NodeId>,
    pub local_jars: Vec<NodeId>,
}

/// Transitive, deduplicated view of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatDependencies {
    pub libraries: Vec<NodeId>,
    pub jars: Vec<NodeId>,
    pub local_jars: Vec<NodeId>,
}

impl DependencyContainer {
    pub fn new(libraries: Vec<NodeId>, jars: Vec<NodeId>, local_jars: Vec<NodeId>) -> Self {
        Self {
            libraries,
            jars,
            local_jars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty() && self.jars.is_empty() && self.local_jars.is_empty()
    }

    /// Flatten the container for classpath construction.
    ///
    /// Libraries are listed depth-first, parents before children. Jars include
    /// the direct jars, their dependencies, and the jars owned by any listed
    /// library.
    pub fn flatten(&self, graph: &DependencyGraph) -> FlatDependencies {
        let mut flat = FlatDependencies::default();
        let mut seen_libraries = HashSet::new();
        let mut seen_jars = HashSet::new();
        let mut library_jars = Vec::new();

        for id in &self.libraries {
            collect_library(graph, *id, &mut seen_libraries, &mut flat.libraries, &mut library_jars);
        }
        for id in self.jars.iter().chain(&library_jars) {
            collect_jar(graph, *id, &mut seen_jars, &mut flat.jars);
        }

        let mut seen_local = HashSet::new();
        flat.local_jars = self
            .local_jars
            .iter()
            .copied()
            .filter(|id| seen_local.insert(*id))
            .collect();
        flat
    }
}

fn collect_library(
    graph: &DependencyGraph,
    id: NodeId,
    seen: &mut HashSet<NodeId>,
    out: &mut Vec<NodeId>,
    jars: &mut Vec<NodeId>,
) {
    if !seen.insert(id) {
        return;
    }
    let Some(library) = graph.library(id) else {
        return;
    };
    out.push(id);
    jars.extend(&library.jars);
    for child in &library.libraries {
        collect_library(graph, *child, seen, out, jars);
    }
}

fn collect_jar(graph: &DependencyGraph, id: NodeId, seen: &mut HashSet<NodeId>, out: &mut Vec<NodeId>) {
    if !seen.insert(id) {
        return;
    }
    let Some(Node::Jar(jar)) = graph.get(id) else {
        return;
    };
    out.push(id);
    for child in &jar.dependencies {
        collect_jar(graph, *child, seen, out);
    }
}
