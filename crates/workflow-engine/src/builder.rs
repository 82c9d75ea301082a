//! Fluent builder for workflow graphs
//!
//! Provides a compact API for constructing graphs programmatically.

use crate::types::{GraphEdge, GraphNode, NodeData, NodeType, Position, WorkflowGraph};

/// Fluent builder for constructing workflow graphs
///
/// # Example
///
/// ```ignore
/// let graph = WorkflowBuilder::new()
///     .add_start("start", (0.0, 0.0))
///     .with_title("Onboard employee")
///     .add_task("collect-docs", (200.0, 0.0))
///     .with_title("Collect documents")
///     .add_end("done", (400.0, 0.0))
///     .connect("start", "collect-docs")
///     .connect("collect-docs", "done")
///     .build();
/// ```
#[derive(Default)]
pub struct WorkflowBuilder {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    edge_counter: usize,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of any type to the graph
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        node_type: impl Into<NodeType>,
        position: impl Into<Position>,
    ) -> Self {
        self.nodes.push(GraphNode::new(id, node_type, position));
        self
    }

    /// Add a Start node
    pub fn add_start(self, id: impl Into<String>, position: impl Into<Position>) -> Self {
        self.add_node(id, NodeType::Start, position)
    }

    /// Add a Task node
    pub fn add_task(self, id: impl Into<String>, position: impl Into<Position>) -> Self {
        self.add_node(id, NodeType::Task, position)
    }

    /// Add an Approval node
    pub fn add_approval(self, id: impl Into<String>, position: impl Into<Position>) -> Self {
        self.add_node(id, NodeType::Approval, position)
    }

    /// Add an Automated node
    pub fn add_automated(self, id: impl Into<String>, position: impl Into<Position>) -> Self {
        self.add_node(id, NodeType::Automated, position)
    }

    /// Add an End node
    pub fn add_end(self, id: impl Into<String>, position: impl Into<Position>) -> Self {
        self.add_node(id, NodeType::End, position)
    }

    /// Set data on the most recently added node
    ///
    /// Must be called immediately after an `add_*` call.
    pub fn with_data(mut self, data: NodeData) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.data = data;
        }
        self
    }

    /// Set the title of the most recently added node
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.data.title = Some(title.into());
        }
        self
    }

    /// Connect two nodes (auto-generates edge ID)
    pub fn connect(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edge_counter += 1;
        self.edges
            .push(GraphEdge::new(source, target).with_id(format!("edge-{}", self.edge_counter)));
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> WorkflowGraph {
        WorkflowGraph::from_parts(self.nodes, self.edges)
    }
}
