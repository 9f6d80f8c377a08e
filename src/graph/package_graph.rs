//! Package-level dependency graph.
//!
//! Module edges from the analyzer are projected onto packages: an edge is
//! recorded when an importing file and its target live in different
//! packages. The projection feeds two consumers, the workspace member
//! ordering and the dependency listing shown to the user.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::trace;

use crate::core::package::{owner_of, Package};
use crate::graph::errors::GraphError;
use crate::graph::loader::ModuleEdge;

/// Directed graph of package dependencies. Edges point from the importing
/// package to the package it depends on.
#[derive(Debug)]
pub struct PackageGraph {
    graph: DiGraph<String, ()>,
    name_to_node: HashMap<String, NodeIndex>,
    /// Package names in discovery order, which seeds traversal order
    names: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Project module edges onto packages.
pub fn build_package_graph(packages: &[Package], edges: &[ModuleEdge]) -> PackageGraph {
    let mut graph = DiGraph::new();
    let mut name_to_node = HashMap::new();
    let mut names = Vec::new();

    for pkg in packages {
        let node = graph.add_node(pkg.name().to_string());
        name_to_node.insert(pkg.name().to_string(), node);
        names.push(pkg.name().to_string());
    }

    for edge in edges {
        let from_pkg = owner_of(packages, &edge.from);
        let to_pkg = owner_of(packages, &edge.to);
        let (Some(from_pkg), Some(to_pkg)) = (from_pkg, to_pkg) else {
            // Entry modules and root-level files sit outside every package.
            trace!(
                "skipping edge outside packages: {} -> {}",
                edge.from.display(),
                edge.to.display()
            );
            continue;
        };
        if from_pkg == to_pkg {
            continue;
        }

        let from_node = name_to_node[from_pkg.name()];
        let to_node = name_to_node[to_pkg.name()];
        graph.update_edge(from_node, to_node, ());
    }

    PackageGraph {
        graph,
        name_to_node,
        names,
    }
}

impl PackageGraph {
    /// Package names in discovery order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Direct dependencies of a package, sorted by name.
    pub fn deps(&self, name: &str) -> Vec<String> {
        let Some(&node) = self.name_to_node.get(name) else {
            return Vec::new();
        };
        let mut deps: Vec<String> = self
            .graph
            .neighbors(node)
            .map(|n| self.graph[n].clone())
            .collect();
        deps.sort();
        deps
    }

    /// Order packages so every dependency precedes its dependents.
    ///
    /// Post-order depth-first over the dependency edges, visiting roots and
    /// children in name order so the result is stable across runs. A cycle
    /// is fatal and reported with the package path that closes it.
    pub fn topo_order(&self) -> Result<Vec<String>, GraphError> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut stack = Vec::new();
        let mut order = Vec::with_capacity(self.names.len());

        for name in &self.names {
            self.visit(self.name_to_node[name], &mut marks, &mut stack, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        node: NodeIndex,
        marks: &mut [Mark],
        stack: &mut Vec<NodeIndex>,
        order: &mut Vec<String>,
    ) -> Result<(), GraphError> {
        match marks[node.index()] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut packages: Vec<String> =
                    stack[start..].iter().map(|n| self.graph[*n].clone()).collect();
                packages.push(self.graph[node].clone());
                return Err(GraphError::CycleDetected { packages });
            }
            Mark::Unvisited => {}
        }

        marks[node.index()] = Mark::InProgress;
        stack.push(node);

        let mut deps: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        deps.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        for dep in deps {
            self.visit(dep, marks, stack, order)?;
        }

        stack.pop();
        marks[node.index()] = Mark::Done;
        order.push(self.graph[node].clone());
        Ok(())
    }
}
