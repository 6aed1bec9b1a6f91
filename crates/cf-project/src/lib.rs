//! cf-project: scenario file format and validation.

pub mod reference;
pub mod schema;
pub mod validate;

pub use reference::reference_chain;
pub use schema::*;
pub use validate::{ValidationError, validate_scenario};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported scenario format: {path}")]
    UnsupportedFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<ScenarioDef> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

pub fn load_json(path: &Path) -> ProjectResult<ScenarioDef> {
    let content = std::fs::read_to_string(path)?;
    let scenario: ScenarioDef = serde_json::from_str(&content)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

pub fn parse_yaml(content: &str) -> ProjectResult<ScenarioDef> {
    let scenario: ScenarioDef = serde_yaml::from_str(content)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

/// Load by extension: `.yaml`/`.yml` or `.json`.
pub fn load_scenario(path: &Path) -> ProjectResult<ScenarioDef> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("yaml") | Some("yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ProjectError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}
