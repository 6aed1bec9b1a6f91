//! cf-graph: value-chain graph model for carbonflow.
//!
//! Provides:
//! - Node/edge data structures and the editable `GraphModel`
//! - Per-kind parameter schema with shared dropout rate
//! - Connection validation (capture nodes are roots, storage/utilization are sinks)
//! - Weight balancing for proportional outgoing splits
//!
//! # Example
//!
//! ```
//! use cf_graph::{GraphModel, NodeKind};
//!
//! let mut graph = GraphModel::new();
//! let plant = graph.add_node(NodeKind::Capture);
//! let west = graph.add_node(NodeKind::Storage);
//! let east = graph.add_node(NodeKind::Storage);
//! let a = graph.connect(&plant, &west).unwrap();
//! let b = graph.connect(&plant, &east).unwrap();
//!
//! assert_eq!(graph.edge(&a).unwrap().weight(), Some(50.0));
//! assert_eq!(graph.edge(&b).unwrap().weight(), Some(50.0));
//! assert!(graph.connect(&west, &plant).is_err());
//! ```

pub mod balance;
pub mod error;
pub mod graph;
pub mod params;
pub mod validate;

// Re-exports for ergonomics
pub use balance::WeightEdit;
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, GraphModel, Node, NodeKind, RemovedNode};
pub use params::{Bounds, KindParams, NodeParams, ParamSlot, ParamSpec};
pub use validate::{ConnectionRejection, check_connection, is_valid_connection};
