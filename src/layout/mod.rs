mod edges;
mod focus;
mod forest;
mod generation;
mod ranking;
pub(crate) mod types;
mod width;

pub use edges::synthesize_edges;
pub use focus::{FocusNode, FocusPartner, build_focus_tree, focus_people};
pub use forest::build_forest;
pub use generation::compute_generations;
pub use ranking::{
    DagreRanks, PlacedRanks, RankError, RankPrimitive, normalize_ranks, normalize_ranks_with,
    rank_primitive,
};
pub use types::*;
pub use width::subtree_width;

use edges::edges_from_index;
use generation::generation_levels;

use crate::config::LayoutConfig;
use crate::ir::{FamilyIndex, NodeId, Person};

/// Forest layout followed, when enabled, by chronological rank
/// normalization. This is the default view.
pub fn compute_family_layout(people: &[Person], config: &LayoutConfig) -> FamilyGraph {
    let mut graph = build_forest(people, config);
    if config.rank.enabled {
        normalize_ranks(&mut graph, config);
    }
    graph
}

/// One node per person, relationship edges straight from the records, and
/// positions from dagre.
pub fn build_flat_graph(people: &[Person], config: &LayoutConfig) -> FamilyGraph {
    build_flat_graph_with(people, config, &DagreRanks)
}

/// Flat graph with an explicit layout primitive. When the primitive fails,
/// nodes are lined up left to right `fallback_spacing` apart.
pub fn build_flat_graph_with(
    people: &[Person],
    config: &LayoutConfig,
    primitive: &dyn RankPrimitive,
) -> FamilyGraph {
    let index = FamilyIndex::new(people);
    let generations = generation_levels(&index, config.iteration_factor);
    let nodes: Vec<GraphNode> = index
        .iter()
        .map(|person| GraphNode {
            id: NodeId::from(&person.id),
            original_id: person.id.clone(),
            generation_level: generations.get(person.id.as_str()).copied().unwrap_or(0),
            is_duplicate_reference: false,
            position: Position::default(),
            data: NodeData::from_person(person),
        })
        .collect();
    let edges = edges_from_index(&index);
    let mut graph = FamilyGraph::new(nodes, edges, generations, config);
    if graph.nodes.is_empty() {
        return graph;
    }

    match primitive.positions(&graph.nodes, &graph.edges, config) {
        Ok(positions) => {
            for node in &mut graph.nodes {
                if let Some(position) = positions.get(&node.id) {
                    node.position = *position;
                }
            }
        }
        Err(err) => {
            tracing::warn!(%err, "flat layout failed, lining nodes up instead");
            for (idx, node) in graph.nodes.iter_mut().enumerate() {
                node.position = Position::new(idx as f32 * config.rank.fallback_spacing, 0.0);
            }
        }
    }
    graph.update_bounds(config);
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Broken;

    impl RankPrimitive for Broken {
        fn positions(
            &self,
            _nodes: &[GraphNode],
            _edges: &[GraphEdge],
            _config: &LayoutConfig,
        ) -> Result<HashMap<NodeId, Position>, RankError> {
            Err(RankError::Unpositioned("x".to_string()))
        }
    }

    fn household() -> Vec<Person> {
        vec![
            Person::new("f").with_spouse("m").with_birth_date("1950"),
            Person::new("m").with_birth_date("1952"),
            Person::new("c").with_father("f").with_mother("m").with_birth_date("1980"),
        ]
    }

    #[test]
    fn flat_graph_falls_back_to_a_row() {
        let config = LayoutConfig::default();
        let graph = build_flat_graph_with(&household(), &config, &Broken);
        let xs: Vec<f32> = graph.nodes.iter().map(|n| n.position.x).collect();
        assert_eq!(xs, vec![0.0, 200.0, 400.0]);
        assert!(graph.nodes.iter().all(|n| n.position.y == 0.0));
        assert_eq!(graph.edges.len(), 3);
        assert_eq!(graph.width, 550.0);
    }

    #[test]
    fn flat_graph_uses_primitive_positions() {
        let config = LayoutConfig::default();
        let graph = build_flat_graph_with(&household(), &config, &PlacedRanks);
        // forest positions are unset in flat mode, so everything sits at the origin
        assert!(graph.nodes.iter().all(|n| n.position == Position::default()));
        assert_eq!(graph.node("c").unwrap().generation_level, 1);
        assert!(graph.nodes.iter().all(|n| !n.is_duplicate_reference));
    }

    #[test]
    fn family_layout_without_normalization_is_the_forest() {
        let mut config = LayoutConfig::default();
        config.rank.enabled = false;
        let people = household();
        let plain = build_forest(&people, &config);
        let laid_out = compute_family_layout(&people, &config);
        assert_eq!(plain.nodes, laid_out.nodes);
    }

    #[test]
    fn placed_normalization_keeps_generations_in_rows() {
        let mut config = LayoutConfig::default();
        config.rank.engine = crate::config::RankEngine::Placed;
        let graph = compute_family_layout(&household(), &config);
        let y = |id: &str| graph.node(id).unwrap().position.y;
        assert_eq!(y("f"), y("m"));
        assert!(y("c") > y("f"));
        assert_eq!(graph.node("f").unwrap().position.x, 40.0);
    }

    #[test]
    fn empty_input_gives_empty_graphs() {
        let config = LayoutConfig::default();
        assert!(compute_family_layout(&[], &config).nodes.is_empty());
        assert!(build_flat_graph(&[], &config).nodes.is_empty());
    }
}
