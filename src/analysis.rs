//! Graph complexity analysis for presentation layers.
//!
//! Downstream renderers want to know whether a graph fits in one view
//! or needs filtering. The tiers come from node count and density, both
//! against configurable thresholds.

use serde::{Deserialize, Serialize};

use crate::types::component::ComponentType;
use crate::types::graph::ArgumentGraph;

/// Thresholds separating the complexity tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityThresholds {
    /// A graph with at most this many nodes can be Simple
    pub simple_max_nodes: usize,

    /// A graph with at least this many nodes is Complex
    pub complex_min_nodes: usize,

    /// A graph denser than this (edges per node) is Complex
    pub complex_min_density: f32,

    /// How many most-connected components the report lists
    pub top_connected: usize,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            simple_max_nodes: 10,
            complex_min_nodes: 30,
            complex_min_density: 1.5,
            top_connected: 5,
        }
    }
}

impl ComplexityThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_bounds(mut self, simple_max: usize, complex_min: usize) -> Self {
        self.simple_max_nodes = simple_max;
        self.complex_min_nodes = complex_min;
        self
    }

    pub fn with_complex_min_density(mut self, density: f32) -> Self {
        self.complex_min_density = density;
        self
    }

    pub fn with_top_connected(mut self, count: usize) -> Self {
        self.top_connected = count;
        self
    }
}

/// Three-tier complexity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Simple,
    Medium,
    Complex,
}

/// One entry in the most-connected listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    /// Combined in/out degree
    pub degree: usize,
}

/// The analyzer's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub node_count: usize,
    pub edge_count: usize,

    /// Edges per node; 0.0 for an empty graph
    pub density: f32,

    pub tier: ComplexityTier,

    /// Top components by combined degree, ties broken by insertion order
    pub most_connected: Vec<ConnectedComponent>,

    /// Presentation hints for the classified tier
    pub recommendations: Vec<String>,
}

/// Classify a graph's complexity and pick out its hubs.
pub fn analyze(graph: &ArgumentGraph, thresholds: &ComplexityThresholds) -> ComplexityReport {
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();
    let density = edge_count as f32 / node_count.max(1) as f32;

    let tier = if node_count >= thresholds.complex_min_nodes
        || density >= thresholds.complex_min_density
    {
        ComplexityTier::Complex
    } else if node_count <= thresholds.simple_max_nodes {
        ComplexityTier::Simple
    } else {
        ComplexityTier::Medium
    };

    let mut ranked: Vec<ConnectedComponent> = graph
        .nodes()
        .map(|n| ConnectedComponent {
            id: n.id.clone(),
            kind: n.kind,
            degree: graph.degree(&n.id),
        })
        .collect();
    // Stable sort keeps insertion order among equal degrees.
    ranked.sort_by(|a, b| b.degree.cmp(&a.degree));
    ranked.truncate(thresholds.top_connected);

    let recommendations = match tier {
        ComplexityTier::Simple => vec!["render the full graph in a single view".to_string()],
        ComplexityTier::Medium => vec![
            "render the full graph with collapsible component groups".to_string(),
            "highlight the most connected components".to_string(),
        ],
        ComplexityTier::Complex => vec![
            "start from a filtered view of the most connected components".to_string(),
            "cluster nodes by component type".to_string(),
            "offer per-page drill-down instead of a single view".to_string(),
        ],
    };

    ComplexityReport {
        node_count,
        edge_count,
        density,
        tier,
        most_connected: ranked,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::component::{ArgumentComponent, ArgumentRelation, RelationType};

    fn graph_with(nodes: usize, edges: usize) -> ArgumentGraph {
        let mut graph = ArgumentGraph::new();
        for i in 0..nodes {
            graph.insert_node(ArgumentComponent::new(
                format!("P1-C{i}"),
                ComponentType::Claim,
                format!("claim {i}"),
                1,
            ));
        }
        // Fan edges out of node 0 first, then chain the rest.
        let mut added = 0;
        'outer: for source in 0..nodes {
            for target in 0..nodes {
                if added == edges {
                    break 'outer;
                }
                if source == target {
                    continue;
                }
                if graph.insert_edge(ArgumentRelation::new(
                    format!("P1-C{source}"),
                    format!("P1-C{target}"),
                    RelationType::LeadsTo,
                    1,
                )) {
                    added += 1;
                }
            }
        }
        graph
    }

    #[test]
    fn test_empty_graph_is_simple_with_zero_density() {
        let report = analyze(&ArgumentGraph::new(), &ComplexityThresholds::default());
        assert_eq!(report.tier, ComplexityTier::Simple);
        assert_eq!(report.density, 0.0);
        assert!(report.most_connected.is_empty());
    }

    #[test]
    fn test_tiers_by_node_count() {
        let thresholds = ComplexityThresholds::default();
        assert_eq!(analyze(&graph_with(5, 3), &thresholds).tier, ComplexityTier::Simple);
        assert_eq!(
            analyze(&graph_with(15, 10), &thresholds).tier,
            ComplexityTier::Medium
        );
        assert_eq!(
            analyze(&graph_with(30, 20), &thresholds).tier,
            ComplexityTier::Complex
        );
    }

    #[test]
    fn test_density_alone_makes_complex() {
        // 4 nodes, 6 edges: density 1.5 crosses the default threshold.
        let report = analyze(&graph_with(4, 6), &ComplexityThresholds::default());
        assert_eq!(report.tier, ComplexityTier::Complex);
    }

    #[test]
    fn test_most_connected_ranked_with_stable_ties() {
        // Node 0 sources edges to 1, 2, 3: degree 3, others degree 1.
        let report = analyze(&graph_with(5, 3), &ComplexityThresholds::default());
        assert_eq!(report.most_connected[0].id, "P1-C0");
        assert_eq!(report.most_connected[0].degree, 3);
        // Equal-degree nodes keep insertion order.
        assert_eq!(report.most_connected[1].id, "P1-C1");
    }

    #[test]
    fn test_top_connected_truncation() {
        let thresholds = ComplexityThresholds::default().with_top_connected(2);
        let report = analyze(&graph_with(8, 4), &thresholds);
        assert_eq!(report.most_connected.len(), 2);
    }
}
