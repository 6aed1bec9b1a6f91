//! Graph-specific error types.

use cf_core::{CfError, EdgeId, NodeId};
use thiserror::Error;

use crate::validate::ConnectionRejection;

/// Graph editing and validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {id} does not exist")]
    UnknownNode { id: NodeId },

    #[error("Edge {id} does not exist")]
    UnknownEdge { id: EdgeId },

    /// Node ids are never reused, including ids of removed nodes.
    #[error("Node id {id} has already been issued")]
    DuplicateNodeId { id: NodeId },

    #[error("Edge id {id} is already in use")]
    DuplicateEdgeId { id: EdgeId },

    #[error("Unknown node kind: {raw:?}")]
    UnknownKind { raw: String },

    #[error("Connection rejected: {0}")]
    Rejected(#[from] ConnectionRejection),

    /// An existing edge breaks the topology rules (only reachable for loaded graphs).
    #[error("Edge {edge} is invalid: {reason}")]
    InvalidEdge {
        edge: EdgeId,
        reason: ConnectionRejection,
    },

    #[error(transparent)]
    Value(#[from] CfError),
}

pub type GraphResult<T> = Result<T, GraphError>;
