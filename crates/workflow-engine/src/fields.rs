//! Per-node-type field completeness rules
//!
//! Shared by the structural validator and the simulator. A check has three
//! outcomes: the catalog may still be loading, in which case an automated
//! node that names an action cannot be decided yet.

use std::fmt;

use crate::catalog::CatalogState;
use crate::types::{non_blank, GraphNode, NodeType};

/// Why a node failed its field check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// Start or task node without a title
    MissingTitle,
    /// Approval node without an approver role
    MissingApproverRole,
    /// Automated node without an action
    MissingAction,
    /// Automated node naming an action the catalog does not know
    UnknownAction(String),
    /// Automated node leaving required action parameters blank
    MissingActionParams(Vec<String>),
    /// End node with `summary` set but no end message
    MissingEndMessage,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "Title is required"),
            Self::MissingApproverRole => write!(f, "Approver role is required"),
            Self::MissingAction => write!(f, "An automation action must be selected"),
            Self::UnknownAction(id) => write!(f, "Unknown automation action '{}'", id),
            Self::MissingActionParams(params) => {
                write!(f, "Missing action parameters: {}", params.join(", "))
            }
            Self::MissingEndMessage => write!(f, "End message is required when summary is enabled"),
        }
    }
}

/// Outcome of checking one node's fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Pass,
    Fail(FieldProblem),
    /// Depends on the automation catalog, which has not loaded yet
    Pending,
}

impl FieldCheck {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

/// Check a node's type-specific required fields
pub fn check_node(node: &GraphNode, catalog: &CatalogState) -> FieldCheck {
    let data = &node.data;
    match node.node_type {
        NodeType::Start | NodeType::Task => {
            if data.display_title().is_none() {
                return FieldCheck::Fail(FieldProblem::MissingTitle);
            }
        }
        NodeType::Approval => {
            if non_blank(data.approver_role.as_deref()).is_none() {
                return FieldCheck::Fail(FieldProblem::MissingApproverRole);
            }
        }
        NodeType::Automated => return check_automation(node, catalog),
        NodeType::End => {
            if data.summary == Some(true) && non_blank(data.end_message.as_deref()).is_none() {
                return FieldCheck::Fail(FieldProblem::MissingEndMessage);
            }
        }
        NodeType::Other(_) => {}
    }
    FieldCheck::Pass
}

fn check_automation(node: &GraphNode, catalog: &CatalogState) -> FieldCheck {
    let Some(action_id) = node.data.action_id.as_deref() else {
        return FieldCheck::Fail(FieldProblem::MissingAction);
    };

    let Some(catalog) = catalog.catalog() else {
        return FieldCheck::Pending;
    };

    let Some(action) = catalog.find(action_id) else {
        return FieldCheck::Fail(FieldProblem::UnknownAction(action_id.to_string()));
    };

    let params = node.data.action_params.as_ref();
    let missing: Vec<String> = action
        .required_params
        .iter()
        .filter(|name| !param_filled(params.and_then(|p| p.get(name.as_str()))))
        .cloned()
        .collect();

    if missing.is_empty() {
        FieldCheck::Pass
    } else {
        FieldCheck::Fail(FieldProblem::MissingActionParams(missing))
    }
}

/// A parameter counts once it holds a non-blank string or any other non-null value
fn param_filled(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::String(s)) => non_blank(Some(s.as_str())).is_some(),
        Some(serde_json::Value::Null) | None => false,
        Some(_) => true,
    }
}
