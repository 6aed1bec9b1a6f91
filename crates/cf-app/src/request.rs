//! Projection of the working graph into the simulation service's request.
//!
//! Pure and deterministic; no network I/O happens here.

use std::collections::BTreeMap;

use cf_graph::balance::FULL_WEIGHT;
use cf_graph::{GraphModel, NodeKind};
use cf_results::NOMINAL_TIMESTEP_SECONDS;
use serde::Serialize;

use crate::jurisdiction::{Jurisdiction, SimulationDuration};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRequest {
    pub nodes: Vec<WireNode>,
    pub edges: Vec<WireEdge>,
    pub jurisdiction: Jurisdiction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    pub params: BTreeMap<String, f64>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Request body plus the `readings` query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRequest {
    pub body: SimulationRequest,
    pub readings: u64,
}

/// `max(1, round(minutes * 60 / 5))`, assuming 5 s nominal sampling.
pub fn readings_for_duration(minutes: f64) -> u64 {
    let readings = (minutes * 60.0 / NOMINAL_TIMESTEP_SECONDS).round();
    if readings.is_finite() && readings >= 1.0 {
        readings as u64
    } else {
        1
    }
}

pub fn build_request(graph: &GraphModel, jurisdiction: Jurisdiction) -> SimulationRequest {
    let nodes = graph
        .nodes()
        .iter()
        .map(|node| WireNode {
            id: node.id().to_string(),
            kind: node.kind(),
            name: node.name.clone(),
            params: node.params().to_flat(),
            metadata: serde_json::Map::new(),
        })
        .collect();

    // A missing weight means "sole route" at the boundary; the model keeps None.
    let edges = graph
        .edges()
        .iter()
        .map(|edge| WireEdge {
            source: edge.source().to_string(),
            target: edge.target().to_string(),
            weight: edge.weight().unwrap_or(FULL_WEIGHT),
        })
        .collect();

    SimulationRequest {
        nodes,
        edges,
        jurisdiction,
    }
}

pub fn prepare(
    graph: &GraphModel,
    jurisdiction: Jurisdiction,
    duration: SimulationDuration,
) -> PreparedRequest {
    PreparedRequest {
        body: build_request(graph, jurisdiction),
        readings: readings_for_duration(f64::from(duration.minutes())),
    }
}
