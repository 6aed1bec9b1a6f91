//! Error types for the cf-app service layer.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Shown when a simulation fails without a server-provided detail.
pub const GENERIC_FAILURE: &str = "Simulation failed to run.";

/// Application error type that wraps errors from the backend crates and
/// the simulation service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("A simulation is already in flight")]
    SimulationInFlight,

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("HTTP status {code}: {}", .detail.as_deref().unwrap_or(GENERIC_FAILURE))]
    HttpStatus { code: u16, detail: Option<String> },

    #[error("Failed to decode simulation response: {message}")]
    DecodeResponse { message: String },

    #[error("Graph error: {0}")]
    Graph(#[from] cf_graph::GraphError),

    #[error("Project error: {0}")]
    Project(#[from] cf_project::ProjectError),

    #[error("Results error: {0}")]
    Results(#[from] cf_results::ResultsError),

    #[error("Failed to write {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Text for the operator's status line: the server's `detail` when it
    /// sent one, otherwise a generic failure message.
    pub fn operator_message(&self) -> String {
        match self {
            AppError::HttpStatus {
                detail: Some(detail),
                ..
            } => detail.clone(),
            AppError::Config(err) => err.to_string(),
            AppError::SimulationInFlight => "A simulation is already running.".to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Result type for cf-app operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_detail_wins() {
        let err = AppError::HttpStatus {
            code: 422,
            detail: Some("Unknown jurisdiction".to_string()),
        };
        assert_eq!(err.operator_message(), "Unknown jurisdiction");
    }

    #[test]
    fn falls_back_to_generic() {
        let no_detail = AppError::HttpStatus {
            code: 500,
            detail: None,
        };
        assert_eq!(no_detail.operator_message(), GENERIC_FAILURE);
        assert_eq!(no_detail.to_string(), "HTTP status 500: Simulation failed to run.");

        let network = AppError::Http {
            message: "connection refused".to_string(),
        };
        assert_eq!(network.operator_message(), GENERIC_FAILURE);

        let decode = AppError::DecodeResponse {
            message: "missing field `data`".to_string(),
        };
        assert_eq!(decode.operator_message(), GENERIC_FAILURE);
    }
}
