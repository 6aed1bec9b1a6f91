//! Connection and topology validation.

use std::collections::HashSet;

use cf_core::NodeId;
use thiserror::Error;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, GraphModel, Node, NodeKind};

/// Why a prospective edge is not allowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    #[error("source node {0} does not exist")]
    UnknownSource(NodeId),

    #[error("target node {0} does not exist")]
    UnknownTarget(NodeId),

    #[error("{kind} node {node} is terminal and cannot emit flow")]
    TerminalSource { node: NodeId, kind: NodeKind },

    #[error("capture node {0} is a root and cannot receive flow")]
    CaptureTarget(NodeId),

    #[error("node {0} cannot connect to itself")]
    SelfLoop(NodeId),
}

fn find<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Node> {
    nodes.iter().find(|n| n.id() == id)
}

/// Gate consulted before edge creation. No side effects.
pub fn check_connection(nodes: &[Node], source: &str, target: &str) -> Result<(), ConnectionRejection> {
    let source_node =
        find(nodes, source).ok_or_else(|| ConnectionRejection::UnknownSource(source.into()))?;
    let target_node =
        find(nodes, target).ok_or_else(|| ConnectionRejection::UnknownTarget(target.into()))?;

    if !source_node.kind().can_emit() {
        return Err(ConnectionRejection::TerminalSource {
            node: source_node.id().clone(),
            kind: source_node.kind(),
        });
    }

    if !target_node.kind().can_receive() {
        return Err(ConnectionRejection::CaptureTarget(target_node.id().clone()));
    }

    if source == target {
        return Err(ConnectionRejection::SelfLoop(source_node.id().clone()));
    }

    Ok(())
}

/// Predicate form of [`check_connection`].
pub fn is_valid_connection(graph: &GraphModel, source: &str, target: &str) -> bool {
    check_connection(graph.nodes(), source, target).is_ok()
}

/// Validate the whole graph: unique ids, resolvable endpoints, topology rules.
pub(crate) fn validate_topology(nodes: &[Node], edges: &[Edge]) -> GraphResult<()> {
    let mut node_ids: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !node_ids.insert(node.id().as_str()) {
            return Err(GraphError::DuplicateNodeId {
                id: node.id().clone(),
            });
        }
    }

    let mut edge_ids: HashSet<&str> = HashSet::new();
    for edge in edges {
        if !edge_ids.insert(edge.id().as_str()) {
            return Err(GraphError::DuplicateEdgeId {
                id: edge.id().clone(),
            });
        }
        check_connection(nodes, edge.source(), edge.target()).map_err(|reason| {
            GraphError::InvalidEdge {
                edge: edge.id().clone(),
                reason,
            }
        })?;
    }

    Ok(())
}
