//! Query helpers for extracting data from received runs.

use std::fmt::Write as _;
use std::path::Path;

use cf_results::SimulationRun;

use crate::error::{AppError, AppResult};

/// Series name for a node's flow rate.
pub const FLOW_FIELD: &str = "flow_kg_min";

/// Summary of a run's shape and reported totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub jurisdiction: String,
    pub node_count: usize,
    pub total_readings: usize,
    pub timestep_seconds: f64,
    pub duration_minutes: f64,
    pub total_captured_tonnes: Option<f64>,
    pub total_stored_tonnes: Option<f64>,
    pub total_net_tonnes: Option<f64>,
}

pub fn get_run_summary(run: &SimulationRun) -> RunSummary {
    RunSummary {
        jurisdiction: run.jurisdiction_used.clone(),
        node_count: run.nodes.len(),
        total_readings: run.total_readings(),
        timestep_seconds: run.timestep(),
        duration_minutes: run.duration(),
        total_captured_tonnes: run.total_captured_tonnes,
        total_stored_tonnes: run.total_stored_tonnes,
        total_net_tonnes: run.total_net_tonnes,
    }
}

pub fn list_node_ids(run: &SimulationRun) -> Vec<String> {
    run.nodes.iter().map(|n| n.id.clone()).collect()
}

/// Field names present anywhere in a node's series, flow first.
pub fn list_fields(run: &SimulationRun, node_id: &str) -> AppResult<Vec<String>> {
    let node = run
        .node(node_id)
        .ok_or_else(|| AppError::InvalidInput(format!("Node not found in run: {node_id}")))?;
    let mut fields = vec![FLOW_FIELD.to_string()];
    for reading in &node.timeseries {
        for key in reading.fields.keys() {
            if !fields.contains(key) {
                fields.push(key.clone());
            }
        }
    }
    Ok(fields)
}

/// `(elapsed minutes, value)` for one node field over the first `cursor`
/// readings (all readings when `None`).
///
/// Null flow reads as 0. Readings lacking an instrumentation field are
/// skipped.
pub fn extract_node_series(
    run: &SimulationRun,
    node_id: &str,
    field: &str,
    cursor: Option<usize>,
) -> AppResult<Vec<(f64, f64)>> {
    let node = run
        .node(node_id)
        .ok_or_else(|| AppError::InvalidInput(format!("Node not found in run: {node_id}")))?;
    let minutes_per_reading = run.timestep() / 60.0;
    let limit = cursor.unwrap_or(usize::MAX);

    let series = node
        .timeseries
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(i, reading)| {
            let value = if field == FLOW_FIELD {
                Some(reading.flow())
            } else {
                reading.field(field)
            };
            value.map(|v| (i as f64 * minutes_per_reading, v))
        })
        .collect();
    Ok(series)
}

pub fn series_to_csv(field: &str, series: &[(f64, f64)]) -> String {
    let mut out = format!("elapsed_min,{field}\n");
    for (t, v) in series {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{t},{v}");
    }
    out
}

pub fn write_series_csv(path: &Path, field: &str, series: &[(f64, f64)]) -> AppResult<()> {
    std::fs::write(path, series_to_csv(field, series)).map_err(|source| AppError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}
