use std::collections::HashSet;

use super::types::GraphEdge;
use crate::ir::{FamilyIndex, NodeId, Person};

/// Insertion-ordered edge list that drops repeats by dedup key.
#[derive(Debug, Default)]
pub(crate) struct EdgeSet {
    keys: HashSet<String>,
    edges: Vec<GraphEdge>,
}

impl EdgeSet {
    pub(crate) fn insert(&mut self, edge: GraphEdge) -> bool {
        if !self.keys.insert(edge.key()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn into_edges(self) -> Vec<GraphEdge> {
        self.edges
    }
}

/// Derives father->child, mother->child and spouse edges straight from the
/// record list, for consumers that want the relationships without the forest.
///
/// Node ids equal person ids here. References to unknown people and
/// self-references produce no edge.
pub fn synthesize_edges(people: &[Person]) -> Vec<GraphEdge> {
    edges_from_index(&FamilyIndex::new(people))
}

pub(crate) fn edges_from_index(index: &FamilyIndex<'_>) -> Vec<GraphEdge> {
    let mut edges = EdgeSet::default();
    for person in index.iter() {
        let child = NodeId::from(&person.id);
        for parent in [&person.father_id, &person.mother_id].into_iter().flatten() {
            if parent == &person.id || !index.contains(parent.as_str()) {
                continue;
            }
            edges.insert(GraphEdge::parent_child(NodeId::from(parent), child.clone()));
        }
        if let Some(spouse) = index.spouse_of(person) {
            edges.insert(GraphEdge::spouse(child.clone(), NodeId::from(&spouse.id)));
        }
    }
    tracing::debug!(edges = edges.len(), "synthesized flat relationship edges");
    edges.into_edges()
}
