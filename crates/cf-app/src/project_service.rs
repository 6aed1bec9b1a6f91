//! Scenario loading and conversion into a working graph.

use std::path::Path;

use cf_core::EdgeId;
use cf_graph::{GraphModel, Node, NodeParams};
use cf_project::ScenarioDef;
use tracing::info;

use crate::error::AppResult;

/// Load a scenario file, or the built-in reference chain when `path` is `None`.
pub fn load_scenario(path: Option<&Path>) -> AppResult<ScenarioDef> {
    match path {
        Some(path) => Ok(cf_project::load_scenario(path)?),
        None => Ok(cf_project::reference_chain()),
    }
}

/// Build a graph from a validated scenario. Stored weights are kept as
/// written; no split rule runs during loading.
pub fn build_graph(scenario: &ScenarioDef) -> AppResult<GraphModel> {
    let mut graph = GraphModel::new();

    for def in &scenario.nodes {
        let params = NodeParams::from_flat(def.kind, def.params.iter().map(|(k, v)| (k.as_str(), *v)));
        let name = if def.name.is_empty() {
            format!("New {}", def.kind)
        } else {
            def.name.clone()
        };
        graph.insert_node(Node::new(def.id.as_str(), name, params))?;
    }

    for def in &scenario.edges {
        graph.insert_edge(def.id.as_deref().map(EdgeId::from), &def.source, &def.target, def.weight)?;
    }

    graph.validate()?;
    info!(
        scenario = %scenario.name,
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "graph loaded"
    );
    Ok(graph)
}

pub fn load_graph(path: Option<&Path>) -> AppResult<GraphModel> {
    let scenario = load_scenario(path)?;
    build_graph(&scenario)
}
