use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::parser::ParseError;

/// Which primitive supplies generation ranks to the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankEngine {
    /// Run dagre over the parent-child edges.
    Dagre,
    /// Reuse the forest builder's own rows.
    Placed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    pub enabled: bool,
    pub engine: RankEngine,
    pub node_sep: f32,
    pub rank_sep: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    /// Nodes whose y coordinates round to the same multiple share a rank.
    pub rank_quantum: f32,
    /// Horizontal stride for the positions used when the primitive fails.
    pub fallback_spacing: f32,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: RankEngine::Dagre,
            node_sep: 100.0,
            rank_sep: 150.0,
            margin_x: 40.0,
            margin_y: 40.0,
            rank_quantum: 10.0,
            fallback_spacing: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub sibling_gap: f32,
    pub tree_gap: f32,
    pub level_height: f32,
    pub max_depth: usize,
    /// The generation pass stops after `iteration_factor * people` steps.
    pub iteration_factor: usize,
    pub duplicate_marker: String,
    pub rank: RankConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 150.0,
            node_height: 90.0,
            sibling_gap: 40.0,
            tree_gap: 120.0,
            level_height: 180.0,
            max_depth: 64,
            iteration_factor: 10,
            duplicate_marker: " (ref)".to_string(),
            rank: RankConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
}

pub fn parse_config(contents: &str) -> Result<Config, ParseError> {
    json5::from_str(contents).map_err(|err| ParseError::Syntax(err.to_string()))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = parse_config(&contents)?;
    tracing::debug!(path = %path.display(), "loaded layout config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config = parse_config(
            r#"{
                // json5 comments are fine
                layout: { node_width: 120, rank: { engine: "placed" } },
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.node_width, 120.0);
        assert_eq!(config.layout.node_height, 90.0);
        assert_eq!(config.layout.rank.engine, RankEngine::Placed);
        assert!(config.layout.rank.enabled);
    }

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.max_depth, 64);
        assert_eq!(config.layout.rank.node_sep, 100.0);
    }

    #[test]
    fn bad_config_is_an_error() {
        assert!(parse_config("{ layout: { node_width: 'wide' } }").is_err());
    }
}
