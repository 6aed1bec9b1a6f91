//! Built-in reference value chain.
//!
//! Two capture plants feed a gathering header, which splits onto a west and
//! an east trunk line. West delivers to both storage sites, east to the
//! southern store and an e-fuels plant.

use std::collections::BTreeMap;

use cf_graph::NodeKind;
use cf_graph::params::{
    BASE_FLOW, BASE_LEAKAGE, BASE_PRESSURE, CONVERSION_RATE, DROPOUT_RATE, EFFICIENCY,
};

use crate::schema::{EdgeDef, NodeDef, SCENARIO_VERSION, ScenarioDef};

fn node(id: &str, kind: NodeKind, name: &str, params: &[(&str, f64)]) -> NodeDef {
    NodeDef {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        params: params
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn edge(id: &str, source: &str, target: &str, weight: f64) -> EdgeDef {
    EdgeDef {
        id: Some(id.to_string()),
        source: source.to_string(),
        target: target.to_string(),
        weight: Some(weight),
    }
}

pub fn reference_chain() -> ScenarioDef {
    use NodeKind::*;

    let nodes = vec![
        node(
            "capture-1",
            Capture,
            "Steel Mill Capture 1",
            &[(BASE_FLOW, 180.0), (EFFICIENCY, 89.0), (DROPOUT_RATE, 0.05)],
        ),
        node(
            "capture-2",
            Capture,
            "Refinery Capture 2",
            &[(BASE_FLOW, 135.0), (EFFICIENCY, 86.0), (DROPOUT_RATE, 0.06)],
        ),
        node(
            "transport-1",
            Transport,
            "Gathering Header",
            &[(BASE_LEAKAGE, 1.2), (DROPOUT_RATE, 0.02)],
        ),
        node(
            "transport-2",
            Transport,
            "Trunk Pipeline West",
            &[(BASE_LEAKAGE, 2.0), (DROPOUT_RATE, 0.025)],
        ),
        node(
            "transport-3",
            Transport,
            "Trunk Pipeline East",
            &[(BASE_LEAKAGE, 2.4), (DROPOUT_RATE, 0.03)],
        ),
        node(
            "storage-1",
            Storage,
            "Saline Aquifer North",
            &[(BASE_PRESSURE, 105.0), (DROPOUT_RATE, 0.01)],
        ),
        node(
            "storage-2",
            Storage,
            "Depleted Gas Field South",
            &[(BASE_PRESSURE, 92.0), (DROPOUT_RATE, 0.015)],
        ),
        node(
            "utilization-1",
            Utilization,
            "E-Fuels Conversion Plant",
            &[(CONVERSION_RATE, 93.0), (DROPOUT_RATE, 0.02)],
        ),
    ];

    let edges = vec![
        edge("e-c1-h", "capture-1", "transport-1", 100.0),
        edge("e-c2-h", "capture-2", "transport-1", 100.0),
        edge("e-h-w", "transport-1", "transport-2", 50.0),
        edge("e-h-e", "transport-1", "transport-3", 50.0),
        edge("e-w-s1", "transport-2", "storage-1", 50.0),
        edge("e-w-s2", "transport-2", "storage-2", 50.0),
        edge("e-e-s2", "transport-3", "storage-2", 50.0),
        edge("e-e-u1", "transport-3", "utilization-1", 50.0),
    ];

    ScenarioDef {
        version: SCENARIO_VERSION,
        name: "Reference value chain".to_string(),
        description: Some(
            "Two capture plants through a shared header to west/east trunks, \
             two geologic stores and an e-fuels plant."
                .to_string(),
        ),
        nodes,
        edges,
    }
}
