//! cf-results: simulation run types, playback and derived metrics.

pub mod archive;
pub mod metrics;
pub mod playback;
pub mod types;

pub use archive::{load_run, parse_run, save_run};
pub use metrics::{
    ComponentTotal, CumulativePoint, FlowPoint, PerformanceMetric, PerformanceSeries, RunMetrics,
    aggregate,
};
pub use playback::{MAX_FRAMES, Playback, PlaybackState, step_for};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {path}")]
    RunNotFound { path: String },
}
