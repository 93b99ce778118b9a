use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use thiserror::Error;

use super::types::{EdgeKind, FamilyGraph, GraphEdge, GraphNode, Position};
use crate::config::{LayoutConfig, RankEngine};
use crate::ir::NodeId;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("no nodes to rank")]
    Empty,
    #[error("layout primitive panicked: {0}")]
    Panicked(String),
    #[error("layout primitive left node {0} without a position")]
    Unpositioned(String),
}

/// Supplies top-left node positions whose y coordinate encodes the rank.
pub trait RankPrimitive {
    fn positions(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        config: &LayoutConfig,
    ) -> Result<HashMap<NodeId, Position>, RankError>;
}

/// Layered layout from dagre over the parent-child edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct DagreRanks;

/// The forest builder's own rows, taken as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlacedRanks;

pub fn rank_primitive(engine: RankEngine) -> Box<dyn RankPrimitive> {
    match engine {
        RankEngine::Dagre => Box::new(DagreRanks),
        RankEngine::Placed => Box::new(PlacedRanks),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl RankPrimitive for DagreRanks {
    fn positions(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        config: &LayoutConfig,
    ) -> Result<HashMap<NodeId, Position>, RankError> {
        if nodes.is_empty() {
            return Err(RankError::Empty);
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some("TB".to_string());
        graph_config.nodesep = Some(config.rank.node_sep);
        graph_config.ranksep = Some(config.rank.rank_sep);
        graph_config.marginx = Some(config.rank.margin_x);
        graph_config.marginy = Some(config.rank.margin_y);
        dagre_graph.set_graph(graph_config);

        for node in nodes {
            let mut dagre_node = DagreNode::default();
            dagre_node.width = config.node_width;
            dagre_node.height = config.node_height;
            dagre_graph.set_node(node.id.to_string(), Some(dagre_node));
        }

        // Spouse edges are drawn but never influence ranking.
        let mut edge_set: HashSet<(String, String)> = HashSet::new();
        for edge in edges.iter().filter(|e| e.kind == EdgeKind::ParentChild) {
            if edge.source == edge.target {
                continue;
            }
            let from = edge.source.to_string();
            let to = edge.target.to_string();
            if !edge_set.insert((from.clone(), to.clone())) {
                continue;
            }
            let edge_label = DagreEdge::default();
            let _ = dagre_graph.set_edge(&from, &to, Some(edge_label), None);
        }

        panic::catch_unwind(AssertUnwindSafe(|| {
            dagre_layout::run_layout(&mut dagre_graph);
        }))
        .map_err(|payload| RankError::Panicked(panic_message(payload.as_ref())))?;

        let mut positions = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let key = node.id.to_string();
            let Some(dagre_node) = dagre_graph.node(&key) else {
                return Err(RankError::Unpositioned(key));
            };
            if !dagre_node.x.is_finite() || !dagre_node.y.is_finite() {
                return Err(RankError::Unpositioned(key));
            }
            positions.insert(
                node.id.clone(),
                Position::new(
                    dagre_node.x - config.node_width / 2.0,
                    dagre_node.y - config.node_height / 2.0,
                ),
            );
        }
        Ok(positions)
    }
}

impl RankPrimitive for PlacedRanks {
    fn positions(
        &self,
        nodes: &[GraphNode],
        _edges: &[GraphEdge],
        _config: &LayoutConfig,
    ) -> Result<HashMap<NodeId, Position>, RankError> {
        if nodes.is_empty() {
            return Err(RankError::Empty);
        }
        Ok(nodes
            .iter()
            .map(|node| (node.id.clone(), node.position))
            .collect())
    }
}

fn compare_year(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn normalize_ranks(graph: &mut FamilyGraph, config: &LayoutConfig) -> bool {
    let primitive = rank_primitive(config.rank.engine);
    normalize_ranks_with(graph, primitive.as_ref(), config)
}

/// Re-spaces every rank chronologically: nodes sharing a quantized y are
/// sorted by birth year (undated last) and laid out evenly, centered on the
/// widest rank.
///
/// Returns false and leaves the graph untouched when the primitive fails.
pub fn normalize_ranks_with(
    graph: &mut FamilyGraph,
    primitive: &dyn RankPrimitive,
    config: &LayoutConfig,
) -> bool {
    if graph.nodes.is_empty() {
        return false;
    }
    let positions = match primitive.positions(&graph.nodes, &graph.edges, config) {
        Ok(positions) => positions,
        Err(err) => {
            tracing::warn!(%err, "rank normalization skipped, keeping forest coordinates");
            return false;
        }
    };

    let quantum = config.rank.rank_quantum.max(1.0);
    let mut ranks: BTreeMap<i64, Vec<(usize, Position)>> = BTreeMap::new();
    for (idx, node) in graph.nodes.iter().enumerate() {
        let Some(position) = positions.get(&node.id) else {
            tracing::warn!(node = %node.id, "rank primitive dropped a node, keeping forest coordinates");
            return false;
        };
        let rank = (position.y / quantum).round() as i64;
        ranks.entry(rank).or_default().push((idx, *position));
    }

    let sep = config.rank.node_sep;
    let row_width =
        |count: usize| count as f32 * config.node_width + count.saturating_sub(1) as f32 * sep;
    let widest = ranks
        .values()
        .map(|members| row_width(members.len()))
        .fold(0.0, f32::max);
    let center = config.rank.margin_x + widest / 2.0;

    for members in ranks.values_mut() {
        members.sort_by(|a, b| {
            compare_year(graph.nodes[a.0].data.birth_year, graph.nodes[b.0].data.birth_year)
                .then(a.1.x.total_cmp(&b.1.x))
                .then(a.0.cmp(&b.0))
        });
        let y = members
            .iter()
            .map(|(_, position)| position.y)
            .fold(f32::MAX, f32::min);
        let start = center - row_width(members.len()) / 2.0;
        for (slot, (idx, _)) in members.iter().enumerate() {
            graph.nodes[*idx].position =
                Position::new(start + slot as f32 * (config.node_width + sep), y);
        }
    }

    graph.update_bounds(config);
    tracing::debug!(ranks = ranks.len(), "normalized generation ranks");
    true
}
