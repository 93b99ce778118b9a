use family_forest::layout::{build_flat_graph, compute_family_layout, focus_people};
use family_forest::layout_dump::GraphDump;
use family_forest::{LayoutConfig, RankEngine, parse_people};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyLayoutOptions {
    mode: Option<String>,
    focus: Option<String>,
    depth: Option<usize>,
    normalize: Option<bool>,
    /// Rank engine for the forest view. Overrides `layout.rank.engine`.
    engine: Option<RankEngine>,
    layout: Option<LayoutConfig>,
}

/// Forest ranks come from the forest rows unless `engine` asks for dagre.
/// wasm32 builds abort on panic, so a dagre panic cannot fall back to forest
/// coordinates here the way it does natively. `flat` mode always runs dagre.
fn layout_with_options(people_json: &str, options: FamilyLayoutOptions) -> Result<String, String> {
    let mut config = options.layout.unwrap_or_default();
    config.rank.engine = options.engine.unwrap_or(RankEngine::Placed);
    if let Some(normalize) = options.normalize {
        config.rank.enabled = normalize;
    }

    let mut people = parse_people(people_json).map_err(|error| error.to_string())?;
    if let Some(root) = options.focus.as_deref() {
        people = focus_people(&people, root, options.depth.unwrap_or(2));
        if people.is_empty() {
            return Err(format!("Person {root} not found"));
        }
    }

    let graph = match options.mode.as_deref() {
        Some("flat") => build_flat_graph(&people, &config),
        None | Some("forest") => compute_family_layout(&people, &config),
        Some(other) => return Err(format!("unknown layout mode: {other}")),
    };
    GraphDump::from_graph(&graph)
        .to_json_string()
        .map_err(|error| error.to_string())
}

#[wasm_bindgen]
pub fn layout_family(people_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<FamilyLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        FamilyLayoutOptions::default()
    };

    layout_with_options(people_json, options).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use crate::{FamilyLayoutOptions, layout_with_options};
    use family_forest::RankEngine;

    const PEOPLE: &str = r#"[
        {"id": "a", "name": "Ann", "spouseId": "b", "birthDate": "1950"},
        {"id": "b", "name": "Bo"},
        {"id": "c", "name": "Cy", "fatherId": "a", "motherId": "b"}
    ]"#;

    #[test]
    fn lays_out_a_small_family() {
        let options: FamilyLayoutOptions =
            serde_json::from_str(r#"{"normalize": false, "layout": {"node_width": 100}}"#).unwrap();
        let json = layout_with_options(PEOPLE, options).expect("family should lay out");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["edges"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn forest_ranks_come_from_the_forest_rows_by_default() {
        let json = layout_with_options(PEOPLE, FamilyLayoutOptions::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let y = |id: &str| {
            value["nodes"]
                .as_array()
                .unwrap()
                .iter()
                .find(|n| n["id"] == id)
                .map(|n| n["position"]["y"].as_f64().unwrap())
                .unwrap()
        };
        assert_eq!(y("a"), y("b"));
        assert!(y("c") > y("a"));

        let options: FamilyLayoutOptions = serde_json::from_str(r#"{"engine": "dagre"}"#).unwrap();
        assert_eq!(options.engine, Some(RankEngine::Dagre));
    }

    #[test]
    fn unknown_focus_person_is_an_error() {
        let options = FamilyLayoutOptions {
            focus: Some("nobody".to_string()),
            ..FamilyLayoutOptions::default()
        };
        let error = layout_with_options(PEOPLE, options).unwrap_err();
        assert_eq!(error, "Person nobody not found");

        let options = FamilyLayoutOptions {
            focus: Some("c".to_string()),
            depth: Some(1),
            ..FamilyLayoutOptions::default()
        };
        assert!(layout_with_options(PEOPLE, options).is_ok());
    }

    #[test]
    fn rejects_unknown_mode() {
        let options = FamilyLayoutOptions {
            mode: Some("radial".to_string()),
            ..FamilyLayoutOptions::default()
        };
        assert!(layout_with_options(PEOPLE, options).is_err());
    }
}
