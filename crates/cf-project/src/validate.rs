//! Scenario validation logic.

use std::collections::{HashMap, HashSet};

use cf_core::PERCENT_MAX;
use cf_graph::NodeKind;

use crate::schema::{EdgeDef, NodeDef, SCENARIO_VERSION, ScenarioDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Illegal route {source_id} -> {target_id}: {reason}")]
    IllegalRoute {
        source_id: String,
        target_id: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_scenario(scenario: &ScenarioDef) -> Result<(), ValidationError> {
    if scenario.version > SCENARIO_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    let mut kinds: HashMap<&str, NodeKind> = HashMap::new();
    for node in &scenario.nodes {
        validate_node(node)?;
        if kinds.insert(node.id.as_str(), node.kind).is_some() {
            return Err(ValidationError::DuplicateId {
                id: node.id.clone(),
                context: "nodes".to_string(),
            });
        }
    }

    let mut edge_ids = HashSet::new();
    for edge in &scenario.edges {
        if let Some(id) = &edge.id {
            if !edge_ids.insert(id.as_str()) {
                return Err(ValidationError::DuplicateId {
                    id: id.clone(),
                    context: "edges".to_string(),
                });
            }
        }
        validate_edge(edge, &kinds)?;
    }

    Ok(())
}

fn validate_node(node: &NodeDef) -> Result<(), ValidationError> {
    if node.id.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "node.id".to_string(),
            value: format!("{:?}", node.id),
            reason: "must not be empty".to_string(),
        });
    }
    for (key, value) in &node.params {
        if !value.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.params.{}", node.id, key),
                value: value.to_string(),
                reason: "must be finite".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_edge(edge: &EdgeDef, kinds: &HashMap<&str, NodeKind>) -> Result<(), ValidationError> {
    let context = |end: &str| match &edge.id {
        Some(id) => format!("edge {id} {end}"),
        None => format!("edge {} -> {} {end}", edge.source, edge.target),
    };

    let source = kinds
        .get(edge.source.as_str())
        .ok_or_else(|| ValidationError::MissingReference {
            id: edge.source.clone(),
            context: context("source"),
        })?;
    let target = kinds
        .get(edge.target.as_str())
        .ok_or_else(|| ValidationError::MissingReference {
            id: edge.target.clone(),
            context: context("target"),
        })?;

    let illegal = |reason: String| ValidationError::IllegalRoute {
        source_id: edge.source.clone(),
        target_id: edge.target.clone(),
        reason,
    };
    if !source.can_emit() {
        return Err(illegal(format!("{source} nodes have no outgoing routes")));
    }
    if !target.can_receive() {
        return Err(illegal(format!("{target} nodes have no incoming routes")));
    }
    if edge.source == edge.target {
        return Err(illegal("self-loop".to_string()));
    }

    if let Some(weight) = edge.weight {
        if !weight.is_finite() || !(0.0..=PERCENT_MAX).contains(&weight) {
            return Err(ValidationError::InvalidValue {
                field: context("weight"),
                value: weight.to_string(),
                reason: "must be within 0..=100".to_string(),
            });
        }
    }
    Ok(())
}
