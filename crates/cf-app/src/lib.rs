//! Shared application service layer for carbonflow.
//!
//! Sits between the graph/results crates and a frontend: scenario loading,
//! request building, the single-flight simulation dispatcher, playback
//! driving, the editing session, and run queries.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod jurisdiction;
pub mod player;
pub mod project_service;
pub mod query;
pub mod request;
pub mod session;

// Re-export key types for convenience
pub use client::{HttpSimulationClient, SimulationClient, decode_run, extract_detail};
pub use config::{ConfigError, DEFAULT_TICK_INTERVAL, ServiceConfig};
pub use dispatch::{Settled, SimulationDispatcher, Ticket};
pub use error::{AppError, AppResult, GENERIC_FAILURE};
pub use jurisdiction::{Jurisdiction, SimulationDuration};
pub use player::{Player, TickTimer};
pub use project_service::{build_graph, load_graph, load_scenario};
pub use query::{
    FLOW_FIELD, RunSummary, extract_node_series, get_run_summary, list_fields, list_node_ids,
    series_to_csv, write_series_csv,
};
pub use request::{
    PreparedRequest, SimulationRequest, WireEdge, WireNode, build_request, prepare,
    readings_for_duration,
};
pub use session::{EditorSession, PumpOutcome, Selection, Settlement};
