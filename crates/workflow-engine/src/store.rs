//! Workflow store: the single owner of the graph being edited
//!
//! Every mutation goes through the same path: build the next graph, run the
//! structural validator and attach its output to each node, record a history
//! snapshot, and only then swap the new graph in. A state is therefore never
//! visible without matching validation tags and an undo entry.
//!
//! Simulation is a read path. It works on a validation-free copy and stores
//! its result in a separate slot that history never touches.
//!
//! # Usage
//!
//! ```ignore
//! use workflow_engine::{EngineConfig, GraphNode, NodeType, WorkflowStore};
//!
//! let mut store = WorkflowStore::new(EngineConfig::default())?;
//! store.add_node(GraphNode::create(NodeType::Start, (0.0, 0.0)))?;
//! store.undo()?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::catalog::CatalogState;
use crate::config::EngineConfig;
use crate::error::{Result, WorkflowError};
use crate::events::{EventSink, HistoryDirection, NullEventSink, StoreEvent};
use crate::simulation::{SimulationRequest, SimulationResult, StepStatus};
use crate::types::{GraphEdge, GraphNode, NodeData, NodeId, WorkflowGraph};
use crate::undo::UndoStack;
use crate::validation::{validate_workflow, ValidationReport};

/// Store shared between tasks; all access is serialized through the mutex
pub type SharedWorkflowStore = Arc<Mutex<WorkflowStore>>;

/// State of undo/redo for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRedoState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_index: isize,
    pub history_len: usize,
}

/// Owner of the current graph, selection, simulation result and history
pub struct WorkflowStore {
    graph: WorkflowGraph,
    /// Report for `graph`; always produced by the same commit
    report: ValidationReport,
    selected_node: Option<NodeId>,
    simulation_result: Option<SimulationResult>,
    history: UndoStack,
    config: EngineConfig,
    event_sink: Arc<dyn EventSink>,
}

impl WorkflowStore {
    /// Create a store holding an empty graph
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_event_sink(config, Arc::new(NullEventSink))
    }

    /// Create a store that reports changes to `event_sink`
    ///
    /// The empty starting graph is recorded as the first history entry, so
    /// undoing every edit lands back on it.
    pub fn with_event_sink(config: EngineConfig, event_sink: Arc<dyn EventSink>) -> Result<Self> {
        let mut graph = WorkflowGraph::new();
        let report = annotate(&mut graph);
        let mut history = UndoStack::with_config(&config.history);
        history.push(&graph)?;

        Ok(Self {
            graph,
            report,
            selected_node: None,
            simulation_result: None,
            history,
            config,
            event_sink,
        })
    }

    /// Wrap the store for use from several tasks
    pub fn into_shared(self) -> SharedWorkflowStore {
        Arc::new(Mutex::new(self))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current graph, with validation tags on every node
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.graph.edges
    }

    /// Validation report of the current graph
    pub fn validation_report(&self) -> &ValidationReport {
        &self.report
    }

    /// The selected node, if it still exists
    pub fn selected_node(&self) -> Option<&GraphNode> {
        self.selected_node
            .as_deref()
            .and_then(|id| self.graph.find_node(id))
    }

    /// Most recently stored simulation result
    pub fn simulation_result(&self) -> Option<&SimulationResult> {
        self.simulation_result.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Position in history (`-1` only if history is empty)
    pub fn history_index(&self) -> isize {
        self.history.index()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_redo_state(&self) -> UndoRedoState {
        UndoRedoState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            history_index: self.history_index(),
            history_len: self.history_len(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Replace all nodes
    pub fn set_nodes(&mut self, nodes: Vec<GraphNode>) -> Result<()> {
        let graph = WorkflowGraph::from_parts(nodes, self.graph.edges.clone());
        self.commit(graph)
    }

    /// Replace all edges
    pub fn set_edges(&mut self, edges: Vec<GraphEdge>) -> Result<()> {
        let graph = WorkflowGraph::from_parts(self.graph.nodes.clone(), edges);
        self.commit(graph)
    }

    /// Merge a partial update into one node's data
    ///
    /// An unknown id leaves the graph as is but is still committed.
    pub fn update_node(&mut self, node_id: &str, patch: NodeData) -> Result<()> {
        let mut graph = self.graph.clone();
        match graph.find_node_mut(node_id) {
            Some(node) => node.data.merge(patch),
            None => log::debug!("update_node: no node '{}'", node_id),
        }
        self.commit(graph)
    }

    /// Append a node; the caller guarantees its id is unique
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        let mut graph = self.graph.clone();
        graph.nodes.push(node);
        self.commit(graph)
    }

    /// Remove a node together with every edge that touches it
    pub fn remove_node(&mut self, node_id: &str) -> Result<()> {
        let mut graph = self.graph.clone();
        graph.remove_node(node_id);
        self.commit(graph)
    }

    /// Append one edge
    pub fn connect(&mut self, edge: GraphEdge) -> Result<()> {
        let mut edges = self.graph.edges.clone();
        edges.push(edge);
        self.set_edges(edges)
    }

    /// Remove every edge with the given id
    pub fn remove_edge(&mut self, edge_id: &str) -> Result<()> {
        let mut edges = self.graph.edges.clone();
        edges.retain(|e| e.id.as_deref() != Some(edge_id));
        self.set_edges(edges)
    }

    /// Replace the whole graph as a single history entry
    pub fn import_workflow(&mut self, mut graph: WorkflowGraph) -> Result<()> {
        graph.strip_validation();
        log::info!(
            "Importing workflow with {} node(s) and {} edge(s)",
            graph.nodes.len(),
            graph.edges.len()
        );
        self.commit(graph)
    }

    /// Parse and import an exported workflow file
    ///
    /// Rejected input leaves the graph and history untouched.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        match parse_workflow(json) {
            Ok(graph) => self.import_workflow(graph),
            Err(err) => {
                log::warn!("Rejected workflow import: {}", err);
                self.emit(StoreEvent::ImportRejected {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Serialize the current graph as pretty JSON without validation tags
    pub fn export_workflow(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.graph)?)
    }

    /// Copy of the current graph without validation tags
    pub fn export_graph(&self) -> WorkflowGraph {
        self.graph.without_validation()
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Restore the previous snapshot; returns false when there is none
    pub fn undo(&mut self) -> Result<bool> {
        self.step_history(HistoryDirection::Undo)
    }

    /// Restore the next snapshot; returns false when there is none
    pub fn redo(&mut self) -> Result<bool> {
        self.step_history(HistoryDirection::Redo)
    }

    fn step_history(&mut self, direction: HistoryDirection) -> Result<bool> {
        let restored = match direction {
            HistoryDirection::Undo => self.history.undo(),
            HistoryDirection::Redo => self.history.redo(),
        };
        let Some(restored) = restored else {
            return Ok(false);
        };

        let mut graph = restored?;
        // Snapshots carry no tags; recompute them for the restored state
        self.report = annotate(&mut graph);
        self.graph = graph;
        log::debug!("{:?} to history index {}", direction, self.history.index());

        self.emit(StoreEvent::HistoryMoved {
            direction,
            history_index: self.history.index(),
        });
        self.change_selection(None);
        Ok(true)
    }

    // =========================================================================
    // Selection and simulation
    // =========================================================================

    /// Select a node by id; an unknown id clears the selection
    pub fn set_selected_node(&mut self, node_id: Option<&str>) {
        let next = node_id
            .filter(|id| self.graph.find_node(id).is_some())
            .map(str::to_string);
        self.change_selection(next);
    }

    /// Overwrite the simulation result slot
    pub fn set_simulation_result(&mut self, result: Option<SimulationResult>) {
        if let Some(result) = &result {
            let failed_steps = result.failed_steps().count();
            let pending = result
                .steps
                .iter()
                .filter(|s| s.status == StepStatus::Pending)
                .count();
            log::info!(
                "Simulation finished: valid={}, {} step(s), {} failed, {} pending",
                result.valid,
                result.steps.len(),
                failed_steps,
                pending
            );
            self.emit(StoreEvent::SimulationCompleted {
                valid: result.valid,
                steps: result.steps.len(),
                failed_steps,
            });
        }
        self.simulation_result = result;
    }

    /// Snapshot the current graph for a simulation run
    pub fn prepare_simulation(&self, catalog: CatalogState) -> SimulationRequest {
        SimulationRequest::new(&self.graph, catalog)
    }

    /// Simulate the current graph immediately and store the result
    pub fn run_simulation(&mut self, catalog: CatalogState) -> SimulationResult {
        let result = self.prepare_simulation(catalog).run();
        self.set_simulation_result(Some(result.clone()));
        result
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Validate, record, then swap in `graph`
    ///
    /// Non-finite positions cannot be stored as JSON, so such a graph is
    /// refused before anything changes.
    fn commit(&mut self, mut graph: WorkflowGraph) -> Result<()> {
        if let Some(node) = graph.nodes.iter().find(|n| !n.position.is_finite()) {
            log::warn!("Refusing commit: node '{}' has a non-finite position", node.id);
            return Err(WorkflowError::invalid_position(&node.id));
        }

        let report = annotate(&mut graph);
        self.history.push(&graph)?;

        self.graph = graph;
        self.report = report;
        log::debug!(
            "Committed {} node(s), {} edge(s) at history index {}",
            self.graph.nodes.len(),
            self.graph.edges.len(),
            self.history.index()
        );

        self.emit(StoreEvent::GraphCommitted {
            node_count: self.graph.nodes.len(),
            edge_count: self.graph.edges.len(),
            global_errors: self.report.global_messages(),
            history_index: self.history.index(),
        });

        let selection_gone = self
            .selected_node
            .as_deref()
            .is_some_and(|id| self.graph.find_node(id).is_none());
        if selection_gone {
            self.change_selection(None);
        }
        Ok(())
    }

    fn change_selection(&mut self, next: Option<NodeId>) {
        if self.selected_node == next {
            return;
        }
        self.selected_node = next;
        self.emit(StoreEvent::SelectionChanged {
            node_id: self.selected_node.clone(),
        });
    }

    fn emit(&self, event: StoreEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::warn!("Failed to deliver store event: {}", e);
        }
    }
}

/// Run the structural validator and write its output onto each node
fn annotate(graph: &mut WorkflowGraph) -> ValidationReport {
    let report = validate_workflow(graph);
    for (node, entry) in graph.nodes.iter_mut().zip(&report.node_validation) {
        node.data.validation = entry.errors.iter().map(ToString::to_string).collect();
    }
    report
}

/// Parse an exported workflow file; both top-level keys are required
fn parse_workflow(json: &str) -> Result<WorkflowGraph> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("nodes").is_none() || value.get("edges").is_none() {
        return Err(WorkflowError::invalid_file("missing nodes/edges"));
    }
    serde_json::from_value(value).map_err(|e| WorkflowError::invalid_file(e.to_string()))
}

/// Simulate with the configured latency and store the result
///
/// The lock is held only to snapshot the graph and to store the result, not
/// across the latency. There is one result slot and no cancellation, so when
/// runs overlap the one that resolves last wins, even if it started first.
pub async fn simulate_shared(store: &SharedWorkflowStore, catalog: CatalogState) -> SimulationResult {
    let (request, pacing) = {
        let store = store.lock().await;
        (store.prepare_simulation(catalog), store.config().simulation.clone())
    };

    let result = request.run_paced(&pacing).await;
    store.lock().await.set_simulation_result(Some(result.clone()));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;
    use crate::catalog::AutomationCatalog;
    use crate::config::HistoryConfig;
    use crate::events::{EventError, VecEventSink};
    use crate::types::NodeType;
    use std::time::Duration;

    fn store() -> WorkflowStore {
        WorkflowStore::new(EngineConfig::default()).unwrap()
    }

    fn ready() -> CatalogState {
        CatalogState::Ready(AutomationCatalog::builtin())
    }

    fn titled(id: &str, node_type: NodeType, x: f64, title: &str) -> GraphNode {
        GraphNode::new(id, node_type, (x, 0.0)).with_data(NodeData::titled(title))
    }

    fn sample_graph() -> WorkflowGraph {
        WorkflowBuilder::new()
            .add_start("s", (0.0, 0.0))
            .with_title("Begin")
            .add_task("t", (100.0, 0.0))
            .with_title("Collect documents")
            .add_end("e", (200.0, 0.0))
            .connect("s", "t")
            .connect("t", "e")
            .build()
    }

    #[test]
    fn test_new_store_is_empty_and_recorded() {
        let store = store();
        assert!(store.nodes().is_empty());
        assert_eq!(store.history_index(), 0);
        assert_eq!(store.history_len(), 1);
        assert!(!store.can_undo());
        assert_eq!(
            store.validation_report().global_messages(),
            vec!["Exactly one Start node is required.", "Workflow is empty."]
        );
    }

    #[test]
    fn test_add_node_attaches_validation() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();

        assert!(store.validation_report().global_errors.is_empty());
        assert_eq!(
            store.nodes()[0].data.validation,
            vec!["Start node should have an outgoing connection."]
        );
        assert_eq!(store.history_index(), 1);
    }

    #[test]
    fn test_connect_clears_dangling_errors() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        store.add_node(titled("e", NodeType::End, 100.0, "Done")).unwrap();
        store.connect(GraphEdge::new("s", "e").with_id("e1")).unwrap();

        assert!(store.validation_report().is_clean());
        assert!(store.nodes().iter().all(|n| n.data.validation.is_empty()));

        store.remove_edge("e1").unwrap();
        assert!(store.edges().is_empty());
        assert!(!store.validation_report().is_clean());
    }

    #[test]
    fn test_update_node_merges_and_revalidates() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        store.add_node(GraphNode::new("t", NodeType::Task, (100.0, 0.0))).unwrap();
        assert_eq!(store.nodes()[1].data.validation, vec!["Task title is required."]);

        store
            .update_node(
                "t",
                NodeData {
                    title: Some("Review".into()),
                    assignee: Some("ana".into()),
                    ..NodeData::default()
                },
            )
            .unwrap();

        let task = store.graph().find_node("t").unwrap();
        assert_eq!(task.data.title.as_deref(), Some("Review"));
        assert!(task.data.validation.is_empty());
    }

    #[test]
    fn test_update_unknown_node_still_records_history() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        let before = store.graph().clone();

        store.update_node("ghost", NodeData::titled("x")).unwrap();
        assert_eq!(store.graph(), &before);
        assert_eq!(store.history_len(), 3);
    }

    #[test]
    fn test_remove_node_cascades_and_clears_selection() {
        let mut store = store();
        store.import_workflow(sample_graph()).unwrap();
        store.set_selected_node(Some("t"));
        assert_eq!(store.selected_node().map(|n| n.id.as_str()), Some("t"));

        store.remove_node("t").unwrap();
        assert!(store.graph().find_node("t").is_none());
        assert!(store.edges().iter().all(|e| !e.touches("t")));
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_remove_other_node_keeps_selection() {
        let mut store = store();
        store.import_workflow(sample_graph()).unwrap();
        store.set_selected_node(Some("s"));

        store.remove_node("e").unwrap();
        assert_eq!(store.selected_node().map(|n| n.id.as_str()), Some("s"));
    }

    #[test]
    fn test_replacing_nodes_drops_stale_selection() {
        let mut store = store();
        store.import_workflow(sample_graph()).unwrap();
        store.set_selected_node(Some("t"));

        let kept: Vec<GraphNode> = store
            .nodes()
            .iter()
            .filter(|n| n.id != "t")
            .cloned()
            .collect();
        store.set_nodes(kept).unwrap();
        assert!(store.selected_node().is_none());

        // Same id coming back must not revive the old selection
        store.add_node(titled("t", NodeType::Task, 100.0, "Again")).unwrap();
        assert!(store.selected_node().is_none());

        store.set_selected_node(Some("s"));
        store.import_workflow(WorkflowGraph::new()).unwrap();
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_non_finite_position_is_refused() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        let before = store.graph().clone();

        let err = store
            .add_node(titled("bad", NodeType::End, f64::NAN, "Done"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidPosition(ref id) if id == "bad"));

        let infinite = GraphNode::new("far", NodeType::Task, (0.0, f64::INFINITY));
        assert!(store.add_node(infinite).is_err());

        assert_eq!(store.graph(), &before);
        assert_eq!(store.history_len(), 2);

        // Every recorded state is still reachable
        store.add_node(titled("e", NodeType::End, 100.0, "Done")).unwrap();
        assert!(store.undo().unwrap());
        assert!(store.undo().unwrap());
        assert!(store.nodes().is_empty());
        assert!(store.export_workflow().is_ok());
    }

    #[test]
    fn test_failing_sink_does_not_block_commits() {
        struct ClosedSink;

        impl EventSink for ClosedSink {
            fn send(&self, _event: StoreEvent) -> std::result::Result<(), EventError> {
                Err(EventError {
                    message: "receiver dropped".to_string(),
                })
            }
        }

        let mut store = WorkflowStore::with_event_sink(EngineConfig::default(), Arc::new(ClosedSink)).unwrap();
        store.import_workflow(sample_graph()).unwrap();
        assert_eq!(store.nodes().len(), 3);
    }

    #[test]
    fn test_select_unknown_node_clears() {
        let mut store = store();
        store.import_workflow(sample_graph()).unwrap();
        store.set_selected_node(Some("s"));
        store.set_selected_node(Some("ghost"));
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_undo_all_returns_to_empty() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        store.add_node(titled("t", NodeType::Task, 100.0, "Work")).unwrap();
        store.connect(GraphEdge::new("s", "t")).unwrap();

        for _ in 0..3 {
            assert!(store.undo().unwrap());
        }
        assert!(store.nodes().is_empty());
        assert!(store.edges().is_empty());

        // No-op beyond the first entry
        assert!(!store.undo().unwrap());
        assert_eq!(store.history_index(), 0);
    }

    #[test]
    fn test_undo_revalidates_restored_state() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        store.add_node(titled("e", NodeType::End, 100.0, "Done")).unwrap();
        store.connect(GraphEdge::new("s", "e")).unwrap();
        assert!(store.nodes()[0].data.validation.is_empty());

        store.undo().unwrap();
        assert_eq!(
            store.nodes()[0].data.validation,
            vec!["Start node should have an outgoing connection."]
        );
        assert_eq!(
            store.validation_report().errors_for("e").map(|e| e.len()),
            Some(1)
        );
    }

    #[test]
    fn test_redo_restores_undone_state() {
        let mut store = store();
        store.import_workflow(sample_graph()).unwrap();
        store.update_node("t", NodeData::titled("Renamed")).unwrap();
        let edited = store.graph().clone();

        store.undo().unwrap();
        assert_eq!(
            store.graph().find_node("t").unwrap().data.title.as_deref(),
            Some("Collect documents")
        );

        assert!(store.redo().unwrap());
        assert_eq!(store.graph(), &edited);
        assert!(!store.redo().unwrap());
    }

    #[test]
    fn test_mutation_after_undo_discards_redo() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        store.add_node(titled("t", NodeType::Task, 100.0, "Work")).unwrap();
        store.undo().unwrap();
        assert!(store.can_redo());

        store.add_node(titled("e", NodeType::End, 100.0, "Done")).unwrap();
        assert!(!store.can_redo());
        assert!(!store.redo().unwrap());
        assert!(store.graph().find_node("t").is_none());
        assert_eq!(store.history_len(), 3);
    }

    #[test]
    fn test_undo_clears_selection() {
        let mut store = store();
        store.import_workflow(sample_graph()).unwrap();
        store.set_selected_node(Some("s"));

        store.undo().unwrap();
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_history_is_independent_of_live_graph() {
        let mut store = store();
        let mut nodes = vec![titled("s", NodeType::Start, 0.0, "Begin")];
        store.set_nodes(nodes.clone()).unwrap();

        nodes[0].data.title = Some("Changed outside".into());
        store.set_nodes(nodes).unwrap();
        store.undo().unwrap();

        assert_eq!(store.nodes()[0].data.title.as_deref(), Some("Begin"));
    }

    #[test]
    fn test_export_strips_validation_and_round_trips() {
        let mut store = store();
        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        assert!(!store.nodes()[0].data.validation.is_empty());

        let json = store.export_workflow().unwrap();
        assert!(!json.contains("__validation"));
        assert!(json.contains("\n  \"nodes\""));

        let parsed = parse_workflow(&json).unwrap();
        assert!(parsed.nodes.iter().all(|n| n.data.validation.is_empty()));
        assert_eq!(parsed, store.export_graph());

        let mut other = self::store();
        other.import_json(&json).unwrap();
        assert_eq!(other.graph(), store.graph());
        assert_eq!(other.history_len(), 2);
    }

    #[test]
    fn test_import_rejects_missing_keys() {
        let sink = Arc::new(VecEventSink::new());
        let mut store = WorkflowStore::with_event_sink(EngineConfig::default(), sink.clone()).unwrap();
        store.import_workflow(sample_graph()).unwrap();
        let before = store.graph().clone();

        let err = store.import_json(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidWorkflowFile(_)));
        assert!(err.to_string().starts_with("Invalid workflow file"));

        let err = store.import_json("{not json").unwrap_err();
        assert!(matches!(err, WorkflowError::Serialization(_)));

        let err = store
            .import_json(r#"{"nodes": [{"id": "x"}], "edges": []}"#)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidWorkflowFile(_)));

        assert_eq!(store.graph(), &before);
        assert_eq!(store.history_len(), 2);
        let rejected = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, StoreEvent::ImportRejected { .. }))
            .count();
        assert_eq!(rejected, 3);
    }

    #[test]
    fn test_editor_keys_survive_import_and_export() {
        let mut store = store();
        store
            .import_json(
                r#"{
                    "nodes": [{
                        "id": "t",
                        "type": "task",
                        "position": {"x": 0, "y": 0},
                        "data": {
                            "title": "Collect",
                            "customFields": [{"id": "0-k", "key": "k", "value": "v"}]
                        }
                    }],
                    "edges": []
                }"#,
            )
            .unwrap();

        let json = store.export_workflow().unwrap();
        assert!(json.contains("\"0-k\""));

        let mut other = self::store();
        other.import_json(&json).unwrap();
        assert_eq!(other.export_workflow().unwrap(), json);
    }

    #[test]
    fn test_import_ignores_stale_validation() {
        let mut store = store();
        store
            .import_json(
                r#"{
                    "nodes": [{
                        "id": "s",
                        "type": "start",
                        "position": {"x": 0, "y": 0},
                        "data": {"title": "Begin", "__validation": ["Part of a cycle"]}
                    }],
                    "edges": []
                }"#,
            )
            .unwrap();

        assert_eq!(
            store.nodes()[0].data.validation,
            vec!["Start node should have an outgoing connection."]
        );
    }

    #[test]
    fn test_simulation_does_not_touch_history() {
        let mut store = store();
        store.import_workflow(sample_graph()).unwrap();
        let state = store.undo_redo_state();

        let result = store.run_simulation(ready());
        assert!(result.valid);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(store.simulation_result(), Some(&result));
        assert_eq!(store.undo_redo_state(), state);

        store.set_simulation_result(None);
        assert!(store.simulation_result().is_none());
    }

    #[test]
    fn test_events_follow_commits() {
        let sink = Arc::new(VecEventSink::new());
        let mut store = WorkflowStore::with_event_sink(EngineConfig::default(), sink.clone()).unwrap();

        store.add_node(titled("s", NodeType::Start, 0.0, "Begin")).unwrap();
        store.set_selected_node(Some("s"));
        store.undo().unwrap();

        let events = sink.events();
        assert_eq!(
            events[0],
            StoreEvent::GraphCommitted {
                node_count: 1,
                edge_count: 0,
                global_errors: vec![],
                history_index: 1,
            }
        );
        assert!(matches!(events[1], StoreEvent::SelectionChanged { node_id: Some(_) }));
        assert!(matches!(
            events[2],
            StoreEvent::HistoryMoved {
                direction: HistoryDirection::Undo,
                history_index: 0
            }
        ));
        assert!(matches!(events[3], StoreEvent::SelectionChanged { node_id: None }));
    }

    #[test]
    fn test_bounded_history() {
        let config = EngineConfig {
            history: HistoryConfig {
                max_snapshots: Some(2),
                ..HistoryConfig::default()
            },
            ..EngineConfig::default()
        };
        let mut store = WorkflowStore::new(config).unwrap();
        for i in 0..4 {
            store
                .add_node(titled(&format!("t{}", i), NodeType::Task, i as f64, "Work"))
                .unwrap();
        }

        assert_eq!(store.history_len(), 2);
        assert!(store.undo().unwrap());
        assert!(!store.undo().unwrap());
        assert_eq!(store.nodes().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_simulation_releases_lock_while_waiting() {
        let mut inner = store();
        inner.import_workflow(sample_graph()).unwrap();
        let shared = inner.into_shared();

        let running = tokio::spawn({
            let shared = shared.clone();
            async move { simulate_shared(&shared, ready()).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        shared
            .lock()
            .await
            .add_node(titled("late", NodeType::Task, 300.0, "Late"))
            .unwrap();

        let result = running.await.unwrap();
        assert_eq!(result.steps.len(), 3);

        let store = shared.lock().await;
        assert_eq!(store.nodes().len(), 4);
        assert_eq!(store.simulation_result(), Some(&result));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_resolved_simulation_wins() {
        let mut inner = store();
        let nodes = (0..10)
            .map(|i| titled(&format!("t{}", i), NodeType::Task, i as f64, "Work"))
            .collect();
        inner.set_nodes(nodes).unwrap();
        let shared = inner.into_shared();

        // 10 nodes: 900ms
        let slow = tokio::spawn({
            let shared = shared.clone();
            async move { simulate_shared(&shared, ready()).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // 1 node: 450ms, resolves first
        shared
            .lock()
            .await
            .set_nodes(vec![titled("only", NodeType::Start, 0.0, "Begin")])
            .unwrap();
        let fast = tokio::spawn({
            let shared = shared.clone();
            async move { simulate_shared(&shared, ready()).await }
        });

        let fast = fast.await.unwrap();
        let slow = slow.await.unwrap();
        assert_eq!(fast.steps.len(), 1);
        assert_eq!(slow.steps.len(), 10);

        let store = shared.lock().await;
        assert_eq!(store.simulation_result(), Some(&slow));
    }
}
