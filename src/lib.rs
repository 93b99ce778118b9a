#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RankConfig, RankEngine};
pub use ir::{FamilyIndex, Gender, NodeId, Person, PersonId};
pub use layout::{FamilyGraph, build_flat_graph, build_forest, compute_family_layout};
pub use parser::{ParseError, parse_people};

use crate::layout_dump::GraphDump;

/// Parses a JSON person list and returns the laid-out forest as JSON.
pub fn layout_family_json(input: &str, config: &LayoutConfig) -> anyhow::Result<String> {
    let people = parse_people(input)?;
    let graph = compute_family_layout(&people, config);
    GraphDump::from_graph(&graph).to_json_string()
}
