//! Context window - bounded carry-over state between chunks.
//!
//! The window is a read view over the accumulated graph, rebuilt before
//! each chunk and passed to both engine calls so cross-chunk relations
//! stay discoverable without unbounded prompt growth.

use serde::{Deserialize, Serialize};

use crate::types::component::{ArgumentComponent, ArgumentRelation};
use crate::types::config::{ContextPolicy, PipelineConfig};
use crate::types::graph::ArgumentGraph;

/// Longest component text carried into the window.
const SNIPPET_CHARS: usize = 160;

/// Bounded summary of previously accepted components and relations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Up to `context_max_components` prior components, snippet text
    pub components: Vec<ArgumentComponent>,

    /// Up to `context_max_relations` prior relations
    pub relations: Vec<ArgumentRelation>,
}

impl ContextWindow {
    /// An empty window, used for the first chunk.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a window from the graph accumulated so far.
    ///
    /// Component selection follows the configured [`ContextPolicy`];
    /// relation selection keeps the most recently accepted relations.
    /// Both lists respect their caps for any graph size.
    pub fn build(graph: &ArgumentGraph, config: &PipelineConfig) -> Self {
        let mut ranked: Vec<(usize, &ArgumentComponent, usize)> = graph
            .nodes()
            .enumerate()
            .map(|(idx, node)| (idx, node, graph.degree(&node.id)))
            .collect();

        // Stable sort keeps insertion order on full ties.
        match config.context_policy {
            ContextPolicy::Recency => {
                ranked.sort_by(|a, b| b.1.page.cmp(&a.1.page).then(b.2.cmp(&a.2)));
            }
            ContextPolicy::Connectivity => {
                ranked.sort_by(|a, b| b.2.cmp(&a.2).then(b.1.page.cmp(&a.1.page)));
            }
        }

        let components = ranked
            .into_iter()
            .take(config.context_max_components)
            .map(|(_, node, _)| ArgumentComponent {
                id: node.id.clone(),
                kind: node.kind,
                text: snippet(&node.text),
                page: node.page,
            })
            .collect();

        let edges = graph.edges();
        let skip = edges.len().saturating_sub(config.context_max_relations);
        let relations = edges[skip..].to_vec();

        Self {
            components,
            relations,
        }
    }

    /// Whether the window carries any prior state.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.relations.is_empty()
    }
}

/// Truncate text to a bounded snippet on a char boundary.
fn snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::component::{ComponentType, RelationType};
    use proptest::prelude::*;

    fn graph_with(nodes: usize, edges_per_node: usize) -> ArgumentGraph {
        let mut graph = ArgumentGraph::new();
        for i in 0..nodes {
            graph.insert_node(ArgumentComponent::new(
                format!("P{}-C{}", i + 1, i + 1),
                ComponentType::Claim,
                format!("claim number {i}"),
                i as u32 + 1,
            ));
        }
        for i in 1..nodes {
            for j in 0..edges_per_node.min(i) {
                graph.insert_edge(ArgumentRelation::new(
                    format!("P{}-C{}", i + 1, i + 1),
                    format!("P{}-C{}", j + 1, j + 1),
                    RelationType::BuildsOn,
                    i as u32 + 1,
                ));
            }
        }
        graph
    }

    #[test]
    fn test_empty_graph_empty_window() {
        let window = ContextWindow::build(&ArgumentGraph::new(), &PipelineConfig::default());
        assert!(window.is_empty());
    }

    #[test]
    fn test_recency_prefers_recent_pages() {
        let config = PipelineConfig::new().with_context_caps(3, 3);
        let window = ContextWindow::build(&graph_with(10, 0), &config);

        let pages: Vec<u32> = window.components.iter().map(|c| c.page).collect();
        assert_eq!(pages, [10, 9, 8]);
    }

    #[test]
    fn test_recency_breaks_page_ties_by_degree() {
        let mut graph = ArgumentGraph::new();
        graph.insert_node(ArgumentComponent::new(
            "P1-C1",
            ComponentType::Claim,
            "lonely",
            1,
        ));
        graph.insert_node(ArgumentComponent::new(
            "P1-C2",
            ComponentType::Claim,
            "popular",
            1,
        ));
        graph.insert_node(ArgumentComponent::new(
            "P1-E1",
            ComponentType::Evidence,
            "evidence",
            1,
        ));
        graph.insert_edge(ArgumentRelation::new(
            "P1-E1",
            "P1-C2",
            RelationType::SupportedBy,
            1,
        ));

        let config = PipelineConfig::new().with_context_caps(1, 5);
        let window = ContextWindow::build(&graph, &config);
        assert_eq!(window.components[0].id, "P1-C2");
    }

    #[test]
    fn test_connectivity_policy_prefers_degree() {
        let mut graph = graph_with(6, 0);
        // Heavily connect the earliest node.
        for i in 2..6 {
            graph.insert_edge(ArgumentRelation::new(
                format!("P{i}-C{i}"),
                "P1-C1",
                RelationType::SupportedBy,
                i as u32,
            ));
        }

        let config = PipelineConfig::new()
            .with_context_caps(1, 5)
            .with_context_policy(ContextPolicy::Connectivity);
        let window = ContextWindow::build(&graph, &config);
        assert_eq!(window.components[0].id, "P1-C1");
    }

    #[test]
    fn test_relations_keep_most_recent() {
        let config = PipelineConfig::new().with_context_caps(5, 2);
        let window = ContextWindow::build(&graph_with(5, 1), &config);
        assert_eq!(window.relations.len(), 2);

        // Last accepted relations survive, in insertion order.
        assert_eq!(window.relations[0].source, "P4-C4");
        assert_eq!(window.relations[1].source, "P5-C5");
    }

    #[test]
    fn test_snippet_truncates_long_text() {
        let long = "word ".repeat(100);
        let short = snippet(&long);
        assert!(short.chars().count() <= SNIPPET_CHARS + 3);
        assert!(short.ends_with("..."));

        assert_eq!(snippet("short text"), "short text");
    }

    proptest! {
        #[test]
        fn prop_window_respects_caps(
            nodes in 0usize..60,
            edges in 0usize..4,
            cap_c in 1usize..20,
            cap_r in 1usize..20,
        ) {
            let config = PipelineConfig::new().with_context_caps(cap_c, cap_r);
            let window = ContextWindow::build(&graph_with(nodes, edges), &config);
            prop_assert!(window.components.len() <= cap_c);
            prop_assert!(window.relations.len() <= cap_r);
        }
    }
}
