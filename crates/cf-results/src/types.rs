//! Simulation run as returned by the simulation service.
//!
//! The service keys node results by node id in a JSON object. Its key order
//! follows the submitted graph, so nodes are kept in a `Vec` in arrival order
//! rather than a map.

use std::collections::BTreeMap;

use cf_graph::NodeKind;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Sampling interval assumed when the service omits or garbles its own.
pub const NOMINAL_TIMESTEP_SECONDS: f64 = 5.0;

/// Reading field carrying capture efficiency, percent.
pub const EFFICIENCY_FIELD: &str = "EFFICIENCY";
/// Reading field carrying transport leakage, kg/hr.
pub const LEAKAGE_FIELD: &str = "LEAKAGE";

fn default_timestep() -> f64 {
    NOMINAL_TIMESTEP_SECONDS
}

/// A completed simulation. Treated as immutable once received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    #[serde(default)]
    pub jurisdiction_used: String,
    #[serde(rename = "simulation_timestep_seconds", default = "default_timestep")]
    pub timestep_seconds: f64,
    #[serde(
        rename = "simulation_duration_minutes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_minutes: Option<f64>,
    #[serde(
        rename = "simulation_readings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub readings: Option<u64>,
    #[serde(default, with = "node_map")]
    pub nodes: Vec<NodeSeries>,
    #[serde(
        rename = "total_captured_co2_tonnes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_captured_tonnes: Option<f64>,
    #[serde(
        rename = "total_stored_or_utilized_co2_tonnes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_stored_tonnes: Option<f64>,
    #[serde(
        rename = "total_net_co2_tonnes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_net_tonnes: Option<f64>,
}

impl SimulationRun {
    /// Number of readings available for playback: the longest node series.
    pub fn total_readings(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.timeseries.len())
            .max()
            .unwrap_or(0)
    }

    /// Sampling interval with the nominal fallback applied.
    pub fn timestep(&self) -> f64 {
        if self.timestep_seconds.is_finite() && self.timestep_seconds > 0.0 {
            self.timestep_seconds
        } else {
            NOMINAL_TIMESTEP_SECONDS
        }
    }

    /// Reported duration, or readings times timestep when absent.
    pub fn duration(&self) -> f64 {
        match self.duration_minutes {
            Some(minutes) if minutes.is_finite() && minutes > 0.0 => minutes,
            _ => self.total_readings() as f64 * self.timestep() / 60.0,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeSeries> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NodeSeries> {
        self.nodes.iter().filter(move |n| n.node_kind() == Some(kind))
    }

    /// Time label for reading `index`, taken from the first node that has it.
    pub fn time_label(&self, index: usize) -> String {
        self.nodes
            .iter()
            .find_map(|n| n.timeseries.get(index))
            .map(Reading::time_label)
            .unwrap_or_else(|| format!("#{}", index + 1))
    }
}

/// Per-node result series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSeries {
    /// Filled from the enclosing map key.
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timeseries: Vec<Reading>,
    #[serde(default)]
    pub total_flow_tonnes: f64,
    /// Gap-handling audit attached by the service, passed through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub audit: serde_json::Value,
}

impl NodeSeries {
    pub fn node_kind(&self) -> Option<NodeKind> {
        self.kind.parse().ok()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }

    /// Flow at `index`; a missing reading contributes zero.
    pub fn flow_at(&self, index: usize) -> f64 {
        self.timeseries.get(index).map_or(0.0, Reading::flow)
    }
}

/// One sample of a node series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub flow_kg_min: Option<f64>,
    /// Kind-specific performance fields (`EFFICIENCY`, `LEAKAGE`, ...).
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Reading {
    /// Flow in kg/min; null or non-finite reads as zero.
    pub fn flow(&self) -> f64 {
        self.flow_kg_min.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// Numeric value of a performance field, if present and not null.
    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields
            .get(name)
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn time_label(&self) -> String {
        time_label(&self.timestamp)
    }
}

/// Render a service timestamp as `HH:MM:SS`, falling back to the raw text.
pub fn time_label(stamp: &str) -> String {
    let stamp = stamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return dt.format("%H:%M:%S").to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stamp, fmt) {
            return dt.format("%H:%M:%S").to_string();
        }
    }
    stamp.to_string()
}

mod node_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::NodeSeries;

    pub fn serialize<S: Serializer>(nodes: &[NodeSeries], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(nodes.len()))?;
        for node in nodes {
            map.serialize_entry(&node.id, node)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<NodeSeries>, D::Error> {
        struct NodeMapVisitor;

        impl<'de> Visitor<'de> for NodeMapVisitor {
            type Value = Vec<NodeSeries>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of node id to node series")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut nodes = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, mut series)) = access.next_entry::<String, NodeSeries>()? {
                    series.id = id;
                    nodes.push(series);
                }
                Ok(nodes)
            }
        }

        deserializer.deserialize_map(NodeMapVisitor)
    }
}
