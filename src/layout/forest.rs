use std::collections::{HashMap, HashSet};

use super::edges::EdgeSet;
use super::generation::generation_levels;
use super::types::{FamilyGraph, GraphEdge, GraphNode, NodeData, Position};
use super::width::WidthEstimator;
use crate::config::LayoutConfig;
use crate::ir::{FamilyIndex, NodeId, Person, compare_birth};

/// Outcome of one placement call: the node it created (if any) and the
/// horizontal space the placed subtree occupies.
#[derive(Debug, Clone)]
struct Placed {
    node: Option<NodeId>,
    width: f32,
}

impl Placed {
    fn skipped(width: f32) -> Self {
        Self { node: None, width }
    }
}

/// Mutable state of one forest build, threaded through every placement call.
struct PlacementContext<'a> {
    index: &'a FamilyIndex<'a>,
    config: &'a LayoutConfig,
    /// Person id -> node id of the first (canonical) placement.
    canonical: HashMap<&'a str, NodeId>,
    duplicate_counts: HashMap<&'a str, usize>,
    used_ids: HashSet<NodeId>,
    spouse_pairs: HashSet<(&'a str, &'a str)>,
    nodes: Vec<GraphNode>,
    edges: EdgeSet,
    widths: WidthEstimator<'a, 'a>,
}

impl<'a> PlacementContext<'a> {
    fn new(index: &'a FamilyIndex<'a>, config: &'a LayoutConfig) -> Self {
        Self {
            index,
            config,
            canonical: HashMap::with_capacity(index.len()),
            duplicate_counts: HashMap::new(),
            used_ids: HashSet::with_capacity(index.len()),
            spouse_pairs: HashSet::new(),
            nodes: Vec::with_capacity(index.len()),
            edges: EdgeSet::default(),
            widths: WidthEstimator::new(index, config, config.max_depth),
        }
    }

    fn is_placed(&self, person_id: &str) -> bool {
        self.canonical.contains_key(person_id)
    }

    /// Synthetic ids never collide with a real person id or an earlier node.
    fn duplicate_node_id(&mut self, person_id: &'a str) -> NodeId {
        let counter = self.duplicate_counts.entry(person_id).or_insert(0);
        loop {
            *counter += 1;
            let candidate = NodeId::new(format!("{person_id}#dup{counter}"));
            if !self.used_ids.contains(&candidate) && !self.index.contains(candidate.as_str()) {
                return candidate;
            }
        }
    }

    fn emit_node(&mut self, person: &'a Person, level: i32, position: Position) -> NodeId {
        let person_id = person.id.as_str();
        let duplicate = self.is_placed(person_id);
        let id = if duplicate {
            self.duplicate_node_id(person_id)
        } else {
            NodeId::from(&person.id)
        };
        let mut data = NodeData::from_person(person);
        if duplicate {
            data.name.push_str(&self.config.duplicate_marker);
        } else {
            self.canonical.insert(person_id, id.clone());
        }
        self.used_ids.insert(id.clone());
        self.nodes.push(GraphNode {
            id: id.clone(),
            original_id: person.id.clone(),
            generation_level: level,
            is_duplicate_reference: duplicate,
            position,
            data,
        });
        id
    }

    fn shift_nodes(&mut self, from: usize, dx: f32) {
        if dx != 0.0 {
            for node in &mut self.nodes[from..] {
                node.position.x += dx;
            }
        }
    }

    fn link_spouses(&mut self, a: (&'a str, &NodeId), b: (&'a str, &NodeId)) {
        let pair = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
        if self.spouse_pairs.insert(pair) {
            self.edges
                .insert(GraphEdge::spouse(a.1.clone(), b.1.clone()));
        }
    }

    /// Places `person_id` with its left edge at `x` and recurses into the
    /// children row below it.
    ///
    /// `allow_duplicate` marks a re-reference pass: an already-placed person
    /// gets a duplicate leaf node instead of being skipped. Duplicates never
    /// place a spouse and never expand children.
    #[allow(clippy::too_many_arguments)]
    fn place_subtree(
        &mut self,
        person_id: &str,
        level: i32,
        x: f32,
        y: f32,
        path: &HashSet<&'a str>,
        allocated_width: Option<f32>,
        allow_duplicate: bool,
    ) -> Placed {
        let base = self.config.node_width;
        let Some(person) = self.index.get(person_id) else {
            return Placed::skipped(base);
        };
        let person_id = person.id.as_str();
        if path.contains(person_id) {
            return Placed::skipped(base);
        }
        if path.len() >= self.config.max_depth {
            tracing::debug!(person = person_id, depth = path.len(), "placement depth budget exhausted");
            return Placed::skipped(base);
        }
        let duplicate = self.is_placed(person_id);
        if duplicate && !allow_duplicate {
            return Placed::skipped(base);
        }

        if duplicate {
            let width = allocated_width.unwrap_or(base);
            let node_x = x + (width - base).max(0.0) / 2.0;
            let node = self.emit_node(person, level, Position::new(node_x, y));
            return Placed {
                node: Some(node),
                width,
            };
        }

        let slot = match allocated_width {
            Some(width) => width,
            None => self.widths.width(person_id, path),
        };
        // everything this call emits lands at `first_node..` and is shifted
        // into place once the children row has been measured
        let first_node = self.nodes.len();

        let mut path_here = path.clone();
        path_here.insert(person_id);
        let spouse = self
            .index
            .spouse_of(person)
            .filter(|spouse| !path_here.contains(spouse.id.as_str()));
        let pair_width = if spouse.is_some() { base * 2.0 } else { base };
        let node_id = self.emit_node(person, level, Position::new(x, y));

        // Only a partner placed canonically here contributes children; a
        // duplicate partner already expanded them at its own placement.
        let mut partner: Option<&'a Person> = None;
        if let Some(spouse) = spouse {
            let spouse_is_new = !self.is_placed(spouse.id.as_str());
            let spouse_node = self.emit_node(spouse, level, Position::new(x + base, y));
            self.link_spouses(
                (person_id, &node_id),
                (spouse.id.as_str(), &spouse_node),
            );
            path_here.insert(spouse.id.as_str());
            if spouse_is_new {
                partner = Some(spouse);
            }
        }

        let children: Vec<&'a Person> = self
            .index
            .couple_children(person, partner)
            .into_iter()
            .filter(|child| !path_here.contains(child.id.as_str()))
            .collect();

        let first_child = self.nodes.len();
        let gap = self.config.sibling_gap;
        let child_y = y + self.config.level_height;
        let mut cursor = x;
        for child in &children {
            let child_id = child.id.as_str();
            // a child placed earlier in this row becomes a one-node duplicate
            let slice = if self.is_placed(child_id) {
                base
            } else {
                self.widths.width(child_id, &path_here)
            };
            let placed = self.place_subtree(
                child_id,
                level + 1,
                cursor,
                child_y,
                &path_here,
                Some(slice),
                true,
            );
            if let Some(child_node) = placed.node {
                self.edges
                    .insert(GraphEdge::parent_child(node_id.clone(), child_node));
            }
            cursor += placed.width + gap;
        }
        let row_width = if children.is_empty() { 0.0 } else { cursor - x - gap };

        // center the couple and the row on each other, then inside the slot
        let natural = pair_width.max(row_width);
        self.shift_nodes(first_node, (natural - pair_width) / 2.0);
        self.shift_nodes(first_child, (natural - row_width) / 2.0 - (natural - pair_width) / 2.0);
        let width = slot.max(natural);
        self.shift_nodes(first_node, (width - natural) / 2.0);

        Placed {
            node: Some(node_id),
            width,
        }
    }

    fn finish(self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        (self.nodes, self.edges.into_edges())
    }
}

/// Builds the positioned family forest.
///
/// Trees are rooted, one after another, at the earliest-born person not yet
/// placed (undated people last) and laid out left to right with `tree_gap`
/// between them. Anyone still unplaced afterwards is appended as an isolated
/// node, so every distinct person has exactly one canonical node.
pub fn build_forest(people: &[Person], config: &LayoutConfig) -> FamilyGraph {
    let index = FamilyIndex::new(people);
    let generations = generation_levels(&index, config.iteration_factor);

    let mut roots: Vec<&Person> = index.iter().collect();
    roots.sort_by(|a, b| compare_birth(a.birth_date, b.birth_date));

    let mut ctx = PlacementContext::new(&index, config);
    let mut offset_x = 0.0;
    let mut trees = 0usize;
    let no_path = HashSet::new();
    for root in roots {
        if ctx.is_placed(root.id.as_str()) {
            continue;
        }
        let placed = ctx.place_subtree(root.id.as_str(), 0, offset_x, 0.0, &no_path, None, false);
        offset_x += placed.width + config.tree_gap;
        trees += 1;
    }

    for person in index.iter() {
        if ctx.is_placed(person.id.as_str()) {
            continue;
        }
        tracing::warn!(person = %person.id, "person not reached by any tree, placing it on its own");
        ctx.emit_node(person, 0, Position::new(offset_x, 0.0));
        offset_x += config.node_width + config.tree_gap;
    }

    let (nodes, edges) = ctx.finish();
    tracing::debug!(
        trees,
        nodes = nodes.len(),
        edges = edges.len(),
        "built family forest"
    );
    FamilyGraph::new(nodes, edges, generations, config)
}
