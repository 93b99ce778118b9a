use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::{Gender, NodeId, Person, PersonId};

/// Separator inside spouse edge keys; the pair is sorted so either record
/// yields the same key.
pub const SPOUSE_KEY_SEPARATOR: &str = "-spouse-";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    ParentChild,
    Spouse,
}

/// What the renderer needs to draw a person box.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub name: String,
    pub gender: Gender,
    pub birth_year: Option<i32>,
    pub alive: bool,
    pub image_url: Option<String>,
}

impl NodeData {
    pub fn from_person(person: &Person) -> Self {
        Self {
            name: person.name.clone(),
            gender: person.gender,
            birth_year: person.birth_year(),
            alive: person.alive,
            image_url: person.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub original_id: PersonId,
    pub generation_level: i32,
    pub is_duplicate_reference: bool,
    pub position: Position,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub kind: EdgeKind,
    pub source: NodeId,
    pub target: NodeId,
}

impl GraphEdge {
    pub fn parent_child(source: NodeId, target: NodeId) -> Self {
        Self {
            kind: EdgeKind::ParentChild,
            source,
            target,
        }
    }

    pub fn spouse(source: NodeId, target: NodeId) -> Self {
        Self {
            kind: EdgeKind::Spouse,
            source,
            target,
        }
    }

    pub fn key(&self) -> String {
        match self.kind {
            EdgeKind::ParentChild => format!("{}->{}", self.source, self.target),
            EdgeKind::Spouse => {
                let (a, b) = if self.source <= self.target {
                    (&self.source, &self.target)
                } else {
                    (&self.target, &self.source)
                };
                format!("{a}{SPOUSE_KEY_SEPARATOR}{b}")
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FamilyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Global generation levels, one per person; legend metadata only.
    pub generations: BTreeMap<PersonId, i32>,
    pub width: f32,
    pub height: f32,
}

impl FamilyGraph {
    pub fn new(
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        generations: BTreeMap<PersonId, i32>,
        config: &LayoutConfig,
    ) -> Self {
        let mut graph = Self {
            nodes,
            edges,
            generations,
            width: 0.0,
            height: 0.0,
        };
        graph.update_bounds(config);
        graph
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    pub fn nodes_for_person<'g, 'p>(
        &'g self,
        person: &'p str,
    ) -> impl Iterator<Item = &'g GraphNode> + use<'g, 'p> {
        self.nodes
            .iter()
            .filter(move |node| node.original_id.as_str() == person)
    }

    pub fn canonical_node(&self, person: &str) -> Option<&GraphNode> {
        self.nodes_for_person(person)
            .find(|node| !node.is_duplicate_reference)
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn update_bounds(&mut self, config: &LayoutConfig) {
        if self.nodes.is_empty() {
            self.width = 0.0;
            self.height = 0.0;
            return;
        }
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for node in &self.nodes {
            min_x = min_x.min(node.position.x);
            min_y = min_y.min(node.position.y);
            max_x = max_x.max(node.position.x + config.node_width);
            max_y = max_y.max(node.position.y + config.node_height);
        }
        self.width = max_x - min_x;
        self.height = max_y - min_y;
    }
}
