//! Core types for workflow graphs
//!
//! These types define the structure of workflow graphs: typed step nodes,
//! the edges between them, and the per-type attribute bag each node carries.
//! The serde shapes match the canvas wire format (`{id, type, position, data}`
//! for nodes, `{source, target, ...}` for edges).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Kind of workflow step a node represents
///
/// Unknown type strings survive a round trip as [`NodeType::Other`] and are
/// treated as always complete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Start,
    Task,
    Approval,
    Automated,
    End,
    Other(String),
}

impl NodeType {
    /// Wire name of this node type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Task => "task",
            Self::Approval => "approval",
            Self::Automated => "automated",
            Self::End => "end",
            Self::Other(name) => name,
        }
    }

    /// Default title for freshly created nodes ("Task Node", "End Node", ...)
    pub fn default_title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} Node", first.to_uppercase(), chars.as_str()),
            None => "Node".to_string(),
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "start" => Self::Start,
            "task" => Self::Task,
            "approval" => Self::Approval,
            "automated" => Self::Automated,
            "end" => Self::End,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        match value {
            NodeType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas position of a node; display-only
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One user-defined key/value pair on a task node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    /// Editor-owned keys such as the row `id`, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CustomField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Type-dependent attribute bag of a node
///
/// Every field is optional on the wire. Which ones matter depends on the
/// node type; see [`crate::fields`]. Keys this struct does not model are kept
/// in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    // Task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_custom_fields"
    )]
    pub custom_fields: Option<Vec<CustomField>>,

    // Approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve_threshold: Option<f64>,

    // Automated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    /// Parameter values by name, in the order they were entered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_params: Option<serde_json::Map<String, serde_json::Value>>,

    // End
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_message: Option<String>,

    /// Validator output attached by the store; never serialized
    #[serde(rename = "__validation", default, skip_serializing)]
    pub validation: Vec<String>,

    /// Keys not modelled above, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NodeData {
    /// Data with only a title set
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Shallow-merge a partial update into this data
    ///
    /// Fields set in `patch` overwrite; unset fields are left alone. Extra
    /// keys are merged key by key. Validation output is never taken from a patch.
    pub fn merge(&mut self, patch: NodeData) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.title, patch.title);
        take(&mut self.description, patch.description);
        take(&mut self.assignee, patch.assignee);
        take(&mut self.due_date, patch.due_date);
        take(&mut self.custom_fields, patch.custom_fields);
        take(&mut self.approver_role, patch.approver_role);
        take(&mut self.auto_approve_threshold, patch.auto_approve_threshold);
        take(&mut self.action_id, patch.action_id);
        take(&mut self.action_params, patch.action_params);
        take(&mut self.summary, patch.summary);
        take(&mut self.end_message, patch.end_message);
        self.extra.extend(patch.extra);
    }

    /// Title if present and not blank after trimming
    pub fn display_title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }
}

/// `Some(s)` when `s` has non-whitespace content
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Accepts `customFields` as the ordered list form or as a plain object,
/// normalising the object form into a list in key order.
fn deserialize_custom_fields<'de, D>(deserializer: D) -> Result<Option<Vec<CustomField>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<CustomField>),
        Map(serde_json::Map<String, serde_json::Value>),
    }

    let repr: Option<Repr> = Option::deserialize(deserializer)?;
    Ok(repr.map(|repr| match repr {
        Repr::List(fields) => fields,
        Repr::Map(map) => map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                CustomField::new(key, value)
            })
            .collect(),
    }))
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Edge identifier assigned by the canvas, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// Canvas-owned keys (styling, animation flags), preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GraphEdge {
    /// Create an edge without handles
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the edge ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether this edge starts or ends at the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Step type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Position in the UI; missing means the origin
    #[serde(default)]
    pub position: Position,
    /// Type-dependent attributes
    #[serde(default)]
    pub data: NodeData,
    /// Canvas-owned keys (width, height, selected), preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GraphNode {
    /// Create a node with empty data
    pub fn new(id: impl Into<String>, node_type: impl Into<NodeType>, position: impl Into<Position>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position: position.into(),
            data: NodeData::default(),
            extra: serde_json::Map::new(),
        }
    }

    /// Create a node the way the palette does: a fresh `"{type}-{uuid}"` id
    /// and a default title such as "Approval Node"
    pub fn create(node_type: impl Into<NodeType>, position: impl Into<Position>) -> Self {
        let node_type = node_type.into();
        let id = format!("{}-{}", node_type, uuid::Uuid::new_v4());
        let title = node_type.default_title();
        Self::new(id, node_type, position).with_data(NodeData::titled(title))
    }

    /// Replace this node's data
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    /// Step label fallback: the title, or the type name when the title is blank
    pub fn label(&self) -> &str {
        self.data.display_title().unwrap_or_else(|| self.node_type.as_str())
    }
}

/// A complete workflow graph
///
/// Both keys are required on the wire; this is also the export file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Nodes in the graph
    pub nodes: Vec<GraphNode>,
    /// Edges connecting nodes
    pub edges: Vec<GraphEdge>,
}

impl WorkflowGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph from parts
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Remove a node and every edge that touches it
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let removed = self.nodes.remove(pos);
        self.edges.retain(|e| !e.touches(id));
        Some(removed)
    }

    /// Drop validator output from every node
    pub fn strip_validation(&mut self) {
        for node in &mut self.nodes {
            node.data.validation.clear();
        }
    }

    /// Copy of this graph without validator output
    pub fn without_validation(&self) -> Self {
        let mut graph = self.clone();
        graph.strip_validation();
        graph
    }
}
