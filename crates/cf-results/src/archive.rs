//! Run archive: a finished run written to disk as JSON for later replay.
//!
//! Files hold either the run itself or the service envelope
//! `{"status": ..., "data": {...}}`, so a captured response body can be
//! replayed directly.

use std::fs;
use std::path::Path;

use crate::types::SimulationRun;
use crate::{ResultsError, ResultsResult};

pub fn save_run(path: &Path, run: &SimulationRun) -> ResultsResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(run)?;
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), nodes = run.nodes.len(), "run archived");
    Ok(())
}

pub fn load_run(path: &Path) -> ResultsResult<SimulationRun> {
    if !path.exists() {
        return Err(ResultsError::RunNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_run(&content)
}

/// Decode a run from either a bare run object or a service envelope.
///
/// A present `data` key commits to the envelope form: its decode error is
/// returned rather than falling back to the bare form.
pub fn parse_run(content: &str) -> ResultsResult<SimulationRun> {
    let mut value: serde_json::Value = serde_json::from_str(content)?;
    let run = match value.get_mut("data") {
        Some(data) => serde_json::from_value(data.take())?,
        None => serde_json::from_value(value)?,
    };
    Ok(run)
}
