//! The argument graph: insertion-ordered nodes plus typed edges.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::component::{ArgumentComponent, ArgumentRelation, ComponentType, RelationType};

/// A directed graph of argumentative components.
///
/// Nodes are kept in insertion order so re-running the pipeline on
/// identical input yields an identical serialized graph. The insert
/// methods enforce the structural invariants continuously: unique ids,
/// existing endpoints, no duplicate relation triples.
#[derive(Debug, Clone, Default)]
pub struct ArgumentGraph {
    nodes: IndexMap<String, ArgumentComponent>,
    edges: Vec<ArgumentRelation>,
}

impl ArgumentGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph holds a component with this id.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a component by id.
    pub fn node(&self, id: &str) -> Option<&ArgumentComponent> {
        self.nodes.get(id)
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ArgumentComponent> {
        self.nodes.values()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[ArgumentRelation] {
        &self.edges
    }

    /// Insert a component. Returns false if the id is already present.
    pub fn insert_node(&mut self, component: ArgumentComponent) -> bool {
        if self.nodes.contains_key(&component.id) {
            return false;
        }
        self.nodes.insert(component.id.clone(), component);
        true
    }

    /// Insert a relation. Returns false if either endpoint is missing or
    /// an identical (source, target, relation) triple already exists.
    pub fn insert_edge(&mut self, relation: ArgumentRelation) -> bool {
        if !self.nodes.contains_key(&relation.source) || !self.nodes.contains_key(&relation.target)
        {
            return false;
        }
        if self.edges.iter().any(|e| e.key() == relation.key()) {
            return false;
        }
        self.edges.push(relation);
        true
    }

    /// Remove an edge by index set; used by validation-driven pruning.
    pub(crate) fn retain_edges(&mut self, mut keep: impl FnMut(&ArgumentRelation) -> bool) {
        self.edges.retain(|e| keep(e));
    }

    /// All components of a given type, in insertion order.
    pub fn nodes_by_type(&self, kind: ComponentType) -> Vec<&ArgumentComponent> {
        self.nodes.values().filter(|n| n.kind == kind).collect()
    }

    /// All components from a given page, in insertion order.
    pub fn nodes_by_page(&self, page: u32) -> Vec<&ArgumentComponent> {
        self.nodes.values().filter(|n| n.page == page).collect()
    }

    /// Combined in/out degree of a component.
    pub fn degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .count()
    }

    /// Out-degree of a component.
    pub fn out_degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|e| e.source == id).count()
    }

    /// Aggregate counts over the final graph.
    pub fn statistics(&self) -> GraphStatistics {
        let mut components_by_type: IndexMap<String, usize> = IndexMap::new();
        for node in self.nodes.values() {
            *components_by_type
                .entry(node.kind.to_string())
                .or_insert(0) += 1;
        }

        let mut relationships_by_type: IndexMap<String, usize> = IndexMap::new();
        for edge in &self.edges {
            *relationships_by_type
                .entry(edge.relation.to_string())
                .or_insert(0) += 1;
        }

        GraphStatistics {
            total_components: self.nodes.len(),
            total_relationships: self.edges.len(),
            components_by_type,
            relationships_by_type,
        }
    }

    /// Produce the pipeline output shape consumed by presentation layers.
    pub fn to_output(&self) -> GraphOutput {
        GraphOutput {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.clone(),
            graph_statistics: Some(self.statistics()),
        }
    }
}

/// Serialized pipeline output: `{nodes, edges, graph_statistics}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphOutput {
    pub nodes: Vec<ArgumentComponent>,
    pub edges: Vec<ArgumentRelation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_statistics: Option<GraphStatistics>,
}

impl GraphOutput {
    /// Rebuild a graph from serialized output, bypassing the insert-time
    /// endpoint checks.
    ///
    /// Deserialized output is untrusted; prefer
    /// [`crate::validate::validate_output`], which also reports duplicate
    /// ids. Duplicate node ids keep the first occurrence.
    pub fn into_graph_unchecked(self) -> ArgumentGraph {
        let mut nodes: IndexMap<String, ArgumentComponent> =
            IndexMap::with_capacity(self.nodes.len());
        for node in self.nodes {
            nodes.entry(node.id.clone()).or_insert(node);
        }
        ArgumentGraph {
            nodes,
            edges: self.edges,
        }
    }
}

/// Aggregated graph counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_components: usize,
    pub total_relationships: usize,
    pub components_by_type: IndexMap<String, usize>,
    pub relationships_by_type: IndexMap<String, usize>,
}
