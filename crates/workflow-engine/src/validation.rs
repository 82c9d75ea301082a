//! Structural validation for workflow graphs
//!
//! Validates start-node cardinality, dangling start/end nodes, task titles,
//! and detects cycles. All rules run; errors accumulate instead of stopping
//! at the first one. Validation is total: empty graphs, edges to missing
//! nodes and fully cyclic graphs all produce a report.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::catalog::CatalogState;
use crate::fields::check_node;
use crate::types::{GraphEdge, GraphNode, NodeId, NodeType, WorkflowGraph};

/// Graph-wide validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Zero or several start nodes
    StartNodeCount,
    /// No nodes at all
    EmptyWorkflow,
    /// A directed cycle exists
    CycleDetected,
    /// Simulation heuristic: more than two edges per node
    TooManyEdges,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartNodeCount => write!(f, "Exactly one Start node is required."),
            Self::EmptyWorkflow => write!(f, "Workflow is empty."),
            Self::CycleDetected => write!(f, "Cycle detected in workflow."),
            Self::TooManyEdges => write!(f, "Too many edges - possible cycle."),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Failure attributable to a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeIssue {
    /// Start node in a graph without exactly one start
    StartConstraint,
    /// Start node with nothing after it
    MissingOutgoing,
    /// End node with nothing before it
    MissingIncoming,
    /// Task without a title
    TaskTitleRequired,
    /// Graph contains a cycle (applied to every node)
    PartOfCycle,
}

impl fmt::Display for NodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartConstraint => write!(f, "Start node constraint"),
            Self::MissingOutgoing => write!(f, "Start node should have an outgoing connection."),
            Self::MissingIncoming => write!(f, "End node should have an incoming connection."),
            Self::TaskTitleRequired => write!(f, "Task title is required."),
            Self::PartOfCycle => write!(f, "Part of a cycle"),
        }
    }
}

impl Serialize for NodeIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors found on one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeValidation {
    pub node_id: NodeId,
    pub errors: Vec<NodeIssue>,
}

/// Result of one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub global_errors: Vec<ValidationError>,
    /// One entry per node, in node order, including nodes without errors
    pub node_validation: Vec<NodeValidation>,
}

impl ValidationReport {
    /// No global errors and no node errors
    pub fn is_clean(&self) -> bool {
        self.global_errors.is_empty() && self.node_validation.iter().all(|v| v.errors.is_empty())
    }

    /// Errors recorded for a node, if the node was validated
    pub fn errors_for(&self, node_id: &str) -> Option<&[NodeIssue]> {
        self.node_validation
            .iter()
            .find(|v| v.node_id == node_id)
            .map(|v| v.errors.as_slice())
    }

    /// Global errors as display strings
    pub fn global_messages(&self) -> Vec<String> {
        self.global_errors.iter().map(ToString::to_string).collect()
    }
}

/// Validate a workflow graph
pub fn validate_workflow(graph: &WorkflowGraph) -> ValidationReport {
    validate(&graph.nodes, &graph.edges)
}

/// Validate nodes and edges
///
/// Returns all validation errors found (not just the first).
pub fn validate(nodes: &[GraphNode], edges: &[GraphEdge]) -> ValidationReport {
    let mut global_errors = Vec::new();
    let mut node_errors: HashMap<&str, Vec<NodeIssue>> = HashMap::new();

    let start_nodes: Vec<&GraphNode> = nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Start)
        .collect();
    if start_nodes.len() != 1 {
        global_errors.push(ValidationError::StartNodeCount);
        for node in start_nodes {
            node_errors.entry(&node.id).or_default().push(NodeIssue::StartConstraint);
        }
    }

    if nodes.is_empty() {
        global_errors.push(ValidationError::EmptyWorkflow);
    }

    let adjacency = Adjacency::build(nodes, edges);
    validate_connections_and_titles(nodes, &adjacency, &mut node_errors);

    if adjacency.has_cycle(nodes) {
        global_errors.push(ValidationError::CycleDetected);
        for node in nodes {
            node_errors.entry(&node.id).or_default().push(NodeIssue::PartOfCycle);
        }
    }

    let node_validation = nodes
        .iter()
        .map(|n| NodeValidation {
            node_id: n.id.clone(),
            errors: node_errors.get(n.id.as_str()).cloned().unwrap_or_default(),
        })
        .collect();

    ValidationReport {
        global_errors,
        node_validation,
    }
}

/// Check that start nodes lead somewhere, end nodes are reached, tasks are titled
fn validate_connections_and_titles<'a>(
    nodes: &'a [GraphNode],
    adjacency: &Adjacency<'a>,
    node_errors: &mut HashMap<&'a str, Vec<NodeIssue>>,
) {
    for node in nodes {
        let issue = match node.node_type {
            NodeType::Start if adjacency.outgoing(&node.id).is_empty() => Some(NodeIssue::MissingOutgoing),
            NodeType::End if adjacency.incoming(&node.id).is_empty() => Some(NodeIssue::MissingIncoming),
            // Task title checks never consult the catalog
            NodeType::Task if check_node(node, &CatalogState::Loading).is_fail() => {
                Some(NodeIssue::TaskTitleRequired)
            }
            _ => None,
        };
        if let Some(issue) = issue {
            node_errors.entry(&node.id).or_default().push(issue);
        }
    }
}

/// Visit state for the three-color depth-first search
#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Direct successors and predecessors, restricted to edges whose endpoints
/// both exist
struct Adjacency<'a> {
    outgoing: HashMap<&'a str, Vec<&'a str>>,
    incoming: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Adjacency<'a> {
    fn build(nodes: &'a [GraphNode], edges: &'a [GraphEdge]) -> Self {
        let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in nodes {
            outgoing.entry(&node.id).or_default();
            incoming.entry(&node.id).or_default();
        }

        for edge in edges {
            let source = edge.source.as_str();
            let target = edge.target.as_str();
            if !outgoing.contains_key(source) || !outgoing.contains_key(target) {
                continue;
            }
            outgoing.entry(source).or_default().push(target);
            incoming.entry(target).or_default().push(source);
        }

        Self { outgoing, incoming }
    }

    fn outgoing(&self, node_id: &str) -> &[&'a str] {
        self.outgoing.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn incoming(&self, node_id: &str) -> &[&'a str] {
        self.incoming.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterative three-color DFS from every unvisited node in node order.
    /// Reaching a gray node means the current path loops back on itself.
    fn has_cycle(&self, nodes: &'a [GraphNode]) -> bool {
        let mut colors: HashMap<&str, Color> = HashMap::new();

        for root in nodes {
            if colors.get(root.id.as_str()).copied().unwrap_or(Color::White) != Color::White {
                continue;
            }

            // (node, index of the next successor to visit)
            let mut stack: Vec<(&'a str, usize)> = vec![(root.id.as_str(), 0)];
            colors.insert(root.id.as_str(), Color::Gray);

            while let Some(top) = stack.last_mut() {
                let (node_id, next) = *top;
                top.1 += 1;

                match self.outgoing(node_id).get(next).copied() {
                    Some(successor) => match colors.get(successor).copied().unwrap_or(Color::White) {
                        Color::Gray => return true,
                        Color::Black => {}
                        Color::White => {
                            colors.insert(successor, Color::Gray);
                            stack.push((successor, 0));
                        }
                    },
                    None => {
                        colors.insert(node_id, Color::Black);
                        stack.pop();
                    }
                }
            }
        }

        false
    }
}
