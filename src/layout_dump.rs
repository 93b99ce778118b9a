use crate::ir::Gender;
use crate::layout::{EdgeKind, FamilyGraph};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub generations: BTreeMap<String, i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub original_id: String,
    pub generation_level: i32,
    pub is_duplicate_reference: bool,
    pub position: PositionDump,
    pub data: NodeDataDump,
}

#[derive(Debug, Serialize)]
pub struct PositionDump {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDataDump {
    pub name: String,
    pub gender: Gender,
    pub birth_year: Option<i32>,
    pub alive: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub kind: &'static str,
    pub source: String,
    pub target: String,
}

fn edge_kind_name(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::ParentChild => "parentChild",
        EdgeKind::Spouse => "spouse",
    }
}

impl GraphDump {
    pub fn from_graph(graph: &FamilyGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.to_string(),
                original_id: node.original_id.to_string(),
                generation_level: node.generation_level,
                is_duplicate_reference: node.is_duplicate_reference,
                position: PositionDump {
                    x: node.position.x,
                    y: node.position.y,
                },
                data: NodeDataDump {
                    name: node.data.name.clone(),
                    gender: node.data.gender,
                    birth_year: node.data.birth_year,
                    alive: node.data.alive,
                    image_url: node.data.image_url.clone(),
                },
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.key(),
                kind: edge_kind_name(edge.kind),
                source: edge.source.to_string(),
                target: edge.target.to_string(),
            })
            .collect();

        let generations = graph
            .generations
            .iter()
            .map(|(id, level)| (id.to_string(), *level))
            .collect();

        GraphDump {
            width: graph.width,
            height: graph.height,
            nodes,
            edges,
            generations,
        }
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_graph_dump(path: &Path, graph: &FamilyGraph) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = GraphDump::from_graph(graph);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
