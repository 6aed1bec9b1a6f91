//! cf-core: stable foundation for carbonflow.
//!
//! Contains:
//! - ids (string identifiers for graph nodes and edges)
//! - numeric (Real, percent bounds, clamping and text coercion)
//! - units (uom SI types + constructors for flow accounting)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CfError, CfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
