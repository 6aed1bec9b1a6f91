//! Display metrics derived from a run up to the playback cursor.
//!
//! Everything here is a pure function of `(run, cursor)`; recompute instead
//! of caching.

use cf_core::{kg_per_min, mass_over, s, to_kg, to_tonnes};
use cf_graph::NodeKind;

use crate::types::{EFFICIENCY_FIELD, LEAKAGE_FIELD, SimulationRun};

/// Aggregate flow at one reading index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPoint {
    pub index: usize,
    pub time: String,
    /// Sum over capture nodes, kg/min.
    pub captured: f64,
    /// Sum over storage and utilization nodes, kg/min.
    pub stored: f64,
    /// Every node's flow, aligned with `SimulationRun::nodes`.
    pub per_node: Vec<f64>,
}

/// Running mass totals at one reading index.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativePoint {
    pub index: usize,
    pub time: String,
    pub captured_kg: f64,
    pub stored_kg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTotal {
    pub node_id: String,
    pub name: String,
    pub kind: String,
    pub tonnes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceMetric {
    Efficiency,
    Leakage,
}

impl PerformanceMetric {
    pub fn field(self) -> &'static str {
        match self {
            Self::Efficiency => EFFICIENCY_FIELD,
            Self::Leakage => LEAKAGE_FIELD,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Efficiency => "Capture efficiency (%)",
            Self::Leakage => "Transport leakage (kg/hr)",
        }
    }

    /// Metric plotted for a node kind, if any.
    pub fn for_kind(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Capture => Some(Self::Efficiency),
            NodeKind::Transport => Some(Self::Leakage),
            NodeKind::Storage | NodeKind::Utilization => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSeries {
    pub node_id: String,
    pub name: String,
    pub metric: PerformanceMetric,
    /// `(reading index, value)`; readings without the field are omitted.
    pub points: Vec<(usize, f64)>,
}

/// Snapshot of everything the results panels show.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub cursor: usize,
    pub total_readings: usize,
    pub flow: Vec<FlowPoint>,
    pub cumulative: Vec<CumulativePoint>,
    pub captured_tonnes: f64,
    pub stored_tonnes: f64,
    pub retention_pct: f64,
    pub components: Vec<ComponentTotal>,
    pub performance: Vec<PerformanceSeries>,
    pub progress_pct: f64,
    pub elapsed_minutes: f64,
    pub duration_minutes: f64,
}

fn mass_kg(flow_kg_min: f64, timestep_s: f64) -> f64 {
    to_kg(mass_over(kg_per_min(flow_kg_min), s(timestep_s)))
}

fn mass_tonnes(flow_kg_min: f64, timestep_s: f64) -> f64 {
    to_tonnes(mass_over(kg_per_min(flow_kg_min), s(timestep_s)))
}

/// Stored over captured, percent; 0 when nothing was captured.
pub fn retention_pct(captured_tonnes: f64, stored_tonnes: f64) -> f64 {
    if captured_tonnes > 0.0 {
        stored_tonnes / captured_tonnes * 100.0
    } else {
        0.0
    }
}

/// Flow points for readings `0..cursor`.
pub fn flow_points(run: &SimulationRun, cursor: usize) -> Vec<FlowPoint> {
    let cursor = cursor.min(run.total_readings());
    (0..cursor)
        .map(|index| {
            let mut captured = 0.0;
            let mut stored = 0.0;
            let per_node = run
                .nodes
                .iter()
                .map(|node| {
                    let flow = node.flow_at(index);
                    match node.node_kind() {
                        Some(kind) if kind.is_captured() => captured += flow,
                        Some(kind) if kind.is_retained() => stored += flow,
                        _ => {}
                    }
                    flow
                })
                .collect();
            FlowPoint {
                index,
                time: run.time_label(index),
                captured,
                stored,
                per_node,
            }
        })
        .collect()
}

/// Running sums of `flow * timestep / 60`, in kg.
pub fn cumulative(points: &[FlowPoint], timestep_s: f64) -> Vec<CumulativePoint> {
    let mut captured_kg = 0.0;
    let mut stored_kg = 0.0;
    points
        .iter()
        .map(|p| {
            captured_kg += mass_kg(p.captured, timestep_s);
            stored_kg += mass_kg(p.stored, timestep_s);
            CumulativePoint {
                index: p.index,
                time: p.time.clone(),
                captured_kg,
                stored_kg,
            }
        })
        .collect()
}

/// Per-node tonnes moved over readings `0..cursor`.
pub fn component_totals(run: &SimulationRun, cursor: usize) -> Vec<ComponentTotal> {
    let cursor = cursor.min(run.total_readings());
    let dt = run.timestep();
    run.nodes
        .iter()
        .map(|node| ComponentTotal {
            node_id: node.id.clone(),
            name: node.display_name().to_string(),
            kind: node.kind.clone(),
            tonnes: (0..cursor).map(|i| mass_tonnes(node.flow_at(i), dt)).sum(),
        })
        .collect()
}

/// Efficiency for capture nodes and leakage for transport nodes.
pub fn performance_series(run: &SimulationRun, cursor: usize) -> Vec<PerformanceSeries> {
    run.nodes
        .iter()
        .filter_map(|node| {
            let metric = PerformanceMetric::for_kind(node.node_kind()?)?;
            let points = node
                .timeseries
                .iter()
                .take(cursor)
                .enumerate()
                .filter_map(|(i, r)| r.field(metric.field()).map(|v| (i, v)))
                .collect();
            Some(PerformanceSeries {
                node_id: node.id.clone(),
                name: node.display_name().to_string(),
                metric,
                points,
            })
        })
        .collect()
}

pub fn aggregate(run: &SimulationRun, cursor: usize) -> RunMetrics {
    let total_readings = run.total_readings();
    let cursor = cursor.min(total_readings);
    let dt = run.timestep();

    let flow = flow_points(run, cursor);
    let cumulative = cumulative(&flow, dt);
    let captured_tonnes: f64 = flow.iter().map(|p| mass_tonnes(p.captured, dt)).sum();
    let stored_tonnes: f64 = flow.iter().map(|p| mass_tonnes(p.stored, dt)).sum();

    let progress_pct = if total_readings == 0 {
        0.0
    } else {
        cursor as f64 / total_readings as f64 * 100.0
    };

    RunMetrics {
        cursor,
        total_readings,
        retention_pct: retention_pct(captured_tonnes, stored_tonnes),
        components: component_totals(run, cursor),
        performance: performance_series(run, cursor),
        elapsed_minutes: cursor as f64 * dt / 60.0,
        duration_minutes: run.duration(),
        flow,
        cumulative,
        captured_tonnes,
        stored_tonnes,
        progress_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeSeries, Reading};
    use std::collections::BTreeMap;

    fn reading(flow: Option<f64>, field: Option<(&str, f64)>) -> Reading {
        let mut fields = BTreeMap::new();
        if let Some((name, value)) = field {
            fields.insert(name.to_string(), serde_json::json!(value));
        }
        Reading {
            timestamp: String::new(),
            flow_kg_min: flow,
            fields,
        }
    }

    fn series(id: &str, kind: &str, flows: &[f64]) -> NodeSeries {
        NodeSeries {
            id: id.into(),
            kind: kind.into(),
            name: String::new(),
            timeseries: flows.iter().map(|f| reading(Some(*f), None)).collect(),
            ..NodeSeries::default()
        }
    }

    fn run(nodes: Vec<NodeSeries>) -> SimulationRun {
        SimulationRun {
            timestep_seconds: 5.0,
            nodes,
            ..SimulationRun::default()
        }
    }

    #[test]
    fn steady_capture_into_storage() {
        let run = run(vec![
            series("capture-1", "capture", &[180.0, 180.0, 180.0]),
            series("storage-1", "storage", &[180.0, 180.0, 180.0]),
        ]);
        let m = aggregate(&run, 3);

        let captured: Vec<f64> = m.flow.iter().map(|p| p.captured).collect();
        assert_eq!(captured, vec![180.0, 180.0, 180.0]);
        assert!((m.cumulative[2].stored_kg - 45.0).abs() < 1e-9);
        assert!((m.captured_tonnes - 0.045).abs() < 1e-12);
        assert_eq!(m.retention_pct, 100.0);
        assert_eq!(m.progress_pct, 100.0);
        assert!((m.elapsed_minutes - 0.25).abs() < 1e-12);
    }

    #[test]
    fn transport_is_neither_captured_nor_stored() {
        let run = run(vec![
            series("capture-1", "capture", &[100.0]),
            series("transport-1", "transport", &[99.0]),
            series("utilization-1", "utilization", &[40.0]),
            series("storage-1", "storage", &[50.0]),
        ]);
        let m = aggregate(&run, 1);
        assert_eq!(m.flow[0].captured, 100.0);
        assert_eq!(m.flow[0].stored, 90.0);
        assert_eq!(m.flow[0].per_node, vec![100.0, 99.0, 40.0, 50.0]);
        assert!((m.retention_pct - 90.0).abs() < 1e-9);
    }

    #[test]
    fn cursor_limits_window() {
        let run = run(vec![series("capture-1", "capture", &[60.0, 60.0, 60.0, 60.0])]);
        let m = aggregate(&run, 2);
        assert_eq!(m.flow.len(), 2);
        assert_eq!(m.progress_pct, 50.0);
        // 60 kg/min over 10 s
        assert!((m.components[0].tonnes - 0.01).abs() < 1e-12);

        let past_end = aggregate(&run, 99);
        assert_eq!(past_end.cursor, 4);
    }

    #[test]
    fn no_capture_means_zero_retention() {
        let run = run(vec![series("storage-1", "storage", &[10.0])]);
        assert_eq!(aggregate(&run, 1).retention_pct, 0.0);
        assert_eq!(retention_pct(0.0, 3.0), 0.0);
    }

    #[test]
    fn ragged_series_pad_with_zero() {
        let run = run(vec![
            series("capture-1", "capture", &[10.0, 10.0, 10.0]),
            series("storage-1", "storage", &[10.0]),
        ]);
        let m = aggregate(&run, 3);
        assert_eq!(m.total_readings, 3);
        let stored: Vec<f64> = m.flow.iter().map(|p| p.stored).collect();
        assert_eq!(stored, vec![10.0, 0.0, 0.0]);
    }

    #[test]
    fn performance_omits_missing_ticks() {
        let mut capture = series("capture-1", "capture", &[]);
        capture.timeseries = vec![
            reading(Some(1.0), Some((EFFICIENCY_FIELD, 90.0))),
            reading(Some(1.0), None),
            reading(Some(1.0), Some((EFFICIENCY_FIELD, 88.0))),
        ];
        let mut transport = series("transport-1", "transport", &[]);
        transport.timeseries = vec![reading(Some(1.0), Some((LEAKAGE_FIELD, 0.02)))];
        let storage = series("storage-1", "storage", &[1.0]);

        let run = run(vec![capture, transport, storage]);
        let perf = performance_series(&run, 3);
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].metric, PerformanceMetric::Efficiency);
        assert_eq!(perf[0].points, vec![(0, 90.0), (2, 88.0)]);
        assert_eq!(perf[1].metric, PerformanceMetric::Leakage);
        assert_eq!(perf[1].points, vec![(0, 0.02)]);
        assert_eq!(perf[1].metric.label(), "Transport leakage (kg/hr)");
    }

    #[test]
    fn empty_run_has_empty_metrics() {
        let m = aggregate(&SimulationRun::default(), 10);
        assert_eq!(m.cursor, 0);
        assert!(m.flow.is_empty());
        assert_eq!(m.progress_pct, 0.0);
        assert_eq!(m.duration_minutes, 0.0);
    }
}
