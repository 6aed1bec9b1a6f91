//! Core graph data structures.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use cf_core::{EdgeId, NodeId, Real, coerce_number, ensure_finite};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::balance::{self, WeightEdit};
use crate::error::{GraphError, GraphResult};
use crate::params::{NodeParams, ParamSlot};
use crate::validate;

/// Role of a node in the value chain. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Source of CO2; never receives flow.
    Capture,
    /// Pass-through with leakage.
    Transport,
    /// Terminal, permanent injection.
    Storage,
    /// Terminal, conversion into products.
    Utilization,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Capture,
        NodeKind::Transport,
        NodeKind::Storage,
        NodeKind::Utilization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Capture => "capture",
            NodeKind::Transport => "transport",
            NodeKind::Storage => "storage",
            NodeKind::Utilization => "utilization",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Capture => "Capture",
            NodeKind::Transport => "Transport",
            NodeKind::Storage => "Storage",
            NodeKind::Utilization => "Utilization",
        }
    }

    /// Operator guidance shown next to the parameter editor.
    pub fn guidance(self) -> &'static str {
        match self {
            NodeKind::Capture => {
                "Source of CO2. Generates gross flow based on base flow & efficiency. No inputs."
            }
            NodeKind::Transport => "Moves CO2. Deducts leakage from incoming flows.",
            NodeKind::Storage => "Permanent injection endpoints. No outputs.",
            NodeKind::Utilization => {
                "Conversion endpoints (e.g. synfuels, concrete). Deducts unused CO2."
            }
        }
    }

    /// Storage and utilization nodes are sinks.
    pub fn can_emit(self) -> bool {
        !matches!(self, NodeKind::Storage | NodeKind::Utilization)
    }

    /// Capture nodes are roots.
    pub fn can_receive(self) -> bool {
        self != NodeKind::Capture
    }

    /// Counted as captured CO2 in run metrics.
    pub fn is_captured(self) -> bool {
        self == NodeKind::Capture
    }

    /// Counted as stored/utilized CO2 in run metrics.
    pub fn is_retained(self) -> bool {
        matches!(self, NodeKind::Storage | NodeKind::Utilization)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = GraphError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| GraphError::UnknownKind {
                raw: raw.to_string(),
            })
    }
}

/// A site in the value chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub name: String,
    pub(crate) params: NodeParams,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, params: NodeParams) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            params,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.params.kind()
    }

    pub fn params(&self) -> &NodeParams {
        &self.params
    }
}

/// A directed route carrying a share of its source's outgoing flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    /// Percentage of the source's outflow routed here. `None` reads as 100 at
    /// the simulation boundary.
    pub(crate) weight: Option<Real>,
}

impl Edge {
    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn weight(&self) -> Option<Real> {
        self.weight
    }
}

/// A node removed together with the edges that touched it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: Node,
    pub edges: Vec<Edge>,
}

/// The editable value-chain graph.
///
/// Invariants held after every public operation:
/// - every edge references two existing nodes, and never the same node twice
/// - no edge targets a capture node, no edge leaves a storage/utilization node
/// - node ids are never reissued, even after removal
///
/// Nodes and edges keep insertion order so projections are deterministic.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    issued_node_ids: HashSet<NodeId>,
    next_serial: u64,
}

impl GraphModel {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    fn node_index(&self, id: &str) -> GraphResult<usize> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode { id: id.into() })
    }

    fn edge_index(&self, id: &str) -> GraphResult<usize> {
        self.edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| GraphError::UnknownEdge { id: id.into() })
    }

    pub fn outgoing<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == source)
    }

    pub fn incoming<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == target)
    }

    pub fn out_degree(&self, source: &str) -> usize {
        self.outgoing(source).count()
    }

    pub fn in_degree(&self, target: &str) -> usize {
        self.incoming(target).count()
    }

    fn fresh_node_id(&mut self, kind: NodeKind) -> NodeId {
        loop {
            self.next_serial += 1;
            let candidate = NodeId::new(format!("{}-{}", kind.as_str(), self.next_serial));
            if !self.issued_node_ids.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn fresh_edge_id(&self) -> EdgeId {
        loop {
            let candidate = EdgeId::new(format!("e-{}", Uuid::new_v4().simple()));
            if self.edge(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Add a node with the kind's default parameters and a fresh id.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.fresh_node_id(kind);
        self.issued_node_ids.insert(id.clone());
        self.nodes.push(Node {
            id: id.clone(),
            name: format!("New {}", kind.as_str()),
            params: NodeParams::defaults(kind),
        });
        debug!(node = %id, %kind, "added node");
        id
    }

    /// Insert a node with a caller-chosen id (scenario loading).
    pub fn insert_node(&mut self, node: Node) -> GraphResult<NodeId> {
        if self.issued_node_ids.contains(&node.id) {
            return Err(GraphError::DuplicateNodeId { id: node.id });
        }
        let id = node.id.clone();
        self.issued_node_ids.insert(id.clone());
        debug!(node = %id, kind = %node.kind(), "inserted node");
        self.nodes.push(node);
        Ok(id)
    }

    pub fn rename_node(&mut self, id: &str, name: impl Into<String>) -> GraphResult<()> {
        let idx = self.node_index(id)?;
        self.nodes[idx].name = name.into();
        Ok(())
    }

    /// Store a parameter value. Non-finite values are refused; out-of-range
    /// values are kept as entered.
    pub fn update_node_param(&mut self, id: &str, key: &str, value: Real) -> GraphResult<ParamSlot> {
        let value = ensure_finite(value, "node parameter")?;
        let idx = self.node_index(id)?;
        let slot = self.nodes[idx].params.set(key, value);
        debug!(node = id, key, value, "updated node parameter");
        Ok(slot)
    }

    /// Coerce operator text into a number, then store it.
    pub fn update_node_param_text(&mut self, id: &str, key: &str, raw: &str) -> GraphResult<ParamSlot> {
        let value = coerce_number(raw, "node parameter")?;
        self.update_node_param(id, key, value)
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> GraphResult<RemovedNode> {
        let idx = self.node_index(id)?;
        let node = self.nodes.remove(idx);
        let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.source == node.id || e.target == node.id);
        self.edges = kept;
        debug!(node = id, cascaded_edges = removed.len(), "removed node");
        Ok(RemovedNode {
            node,
            edges: removed,
        })
    }

    /// Create an edge after validation, applying the creation-time split rule.
    pub fn connect(&mut self, source: &str, target: &str) -> GraphResult<EdgeId> {
        validate::check_connection(&self.nodes, source, target)?;
        let id = self.fresh_edge_id();
        self.edges.push(Edge {
            id: id.clone(),
            source: source.into(),
            target: target.into(),
            weight: None,
        });
        let new_index = self.edges.len() - 1;
        balance::apply_new_edge(&mut self.edges, new_index);
        debug!(edge = %id, source, target, weight = ?self.edges[new_index].weight, "connected");
        Ok(id)
    }

    /// Insert an edge with explicit id and weight (scenario loading). The
    /// connection is validated but no split rule is applied.
    pub fn insert_edge(
        &mut self,
        id: Option<EdgeId>,
        source: &str,
        target: &str,
        weight: Option<Real>,
    ) -> GraphResult<EdgeId> {
        validate::check_connection(&self.nodes, source, target)?;
        let id = match id {
            Some(id) if self.edge(&id).is_some() => {
                return Err(GraphError::DuplicateEdgeId { id });
            }
            Some(id) => id,
            None => self.fresh_edge_id(),
        };
        self.edges.push(Edge {
            id: id.clone(),
            source: source.into(),
            target: target.into(),
            weight,
        });
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> GraphResult<Edge> {
        let idx = self.edge_index(id)?;
        let edge = self.edges.remove(idx);
        debug!(edge = id, "removed edge");
        Ok(edge)
    }

    /// Edit one edge's weight; a binary split keeps its pair summing to 100.
    pub fn set_edge_weight(&mut self, id: &str, value: Real) -> GraphResult<WeightEdit> {
        let idx = self.edge_index(id)?;
        let edit = balance::apply_weight_edit(&mut self.edges, idx, value);
        debug!(edge = id, weight = edit.weight, sibling = ?edit.sibling, "edited edge weight");
        Ok(edit)
    }

    /// Text entry for a weight; anything that is not a number reads as 0.
    pub fn set_edge_weight_text(&mut self, id: &str, raw: &str) -> GraphResult<WeightEdit> {
        let value = coerce_number(raw, "edge weight").unwrap_or(0.0);
        self.set_edge_weight(id, value)
    }

    /// Normalized share (percent) of the edge within its source's outgoing set.
    pub fn share(&self, id: &str) -> Option<Real> {
        let edge = self.edge(id)?;
        Some(balance::share_of(&self.edges, edge))
    }

    /// Shares for every edge, in edge order.
    pub fn shares(&self) -> Vec<(EdgeId, Real)> {
        self.edges
            .iter()
            .map(|e| (e.id.clone(), balance::share_of(&self.edges, e)))
            .collect()
    }

    /// Re-check the topology invariant over the whole graph.
    pub fn validate(&self) -> GraphResult<()> {
        validate::validate_topology(&self.nodes, &self.edges)
    }
}
