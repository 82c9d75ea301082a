//! Deterministic dry run of a workflow
//!
//! Nodes are visited left to right (then top to bottom) and each one is
//! checked with the field rules. Graph-level problems go into `errors` and
//! decide `valid`; node-level problems only show up as a step status.
//!
//! The designer shows results after a short delay proportional to the graph
//! size. [`SimulationRequest::run_paced`] reproduces that; the computation
//! itself is [`simulate`] and never waits.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogState;
use crate::config::SimulationConfig;
use crate::fields::{check_node, FieldCheck};
use crate::types::{GraphEdge, GraphNode, NodeId, NodeType, WorkflowGraph};
use crate::validation::ValidationError;

/// Outcome of one simulated step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Could not be decided yet (automation catalog still loading)
    Pending,
    Completed,
    Error,
}

/// One node's entry in the simulated run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStep {
    /// `"{index}. {title or type}"`, 1-based
    pub step: String,
    pub status: StepStatus,
    pub node_id: NodeId,
}

/// Result of a simulated run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub steps: Vec<SimulationStep>,
    /// True when there are no graph-level errors; step errors do not count
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl SimulationResult {
    /// Steps that ended in `error`
    pub fn failed_steps(&self) -> impl Iterator<Item = &SimulationStep> {
        self.steps.iter().filter(|s| s.status == StepStatus::Error)
    }
}

/// Simulate a run over `nodes` in canvas order
pub fn simulate(nodes: &[GraphNode], edges: &[GraphEdge], catalog: &CatalogState) -> SimulationResult {
    let errors = precheck(nodes, edges);

    let mut ordered: Vec<&GraphNode> = nodes.iter().collect();
    // Stable: exact position ties keep input order
    ordered.sort_by(|a, b| {
        coordinate_order(a.position.x, b.position.x)
            .then_with(|| coordinate_order(a.position.y, b.position.y))
    });

    let steps = ordered
        .into_iter()
        .enumerate()
        .map(|(i, node)| SimulationStep {
            step: format!("{}. {}", i + 1, node.label()),
            status: match check_node(node, catalog) {
                FieldCheck::Pass => StepStatus::Completed,
                FieldCheck::Fail(_) => StepStatus::Error,
                FieldCheck::Pending => StepStatus::Pending,
            },
            node_id: node.id.clone(),
        })
        .collect();

    SimulationResult {
        steps,
        valid: errors.is_empty(),
        errors,
    }
}

/// Graph-level checks run before stepping
///
/// The edge-count rule is a cheap stand-in for cycle detection and is kept
/// as is; the structural validator does the precise check.
fn precheck(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let start_count = nodes.iter().filter(|n| n.node_type == NodeType::Start).count();
    if start_count != 1 {
        errors.push(ValidationError::StartNodeCount);
    }
    if nodes.is_empty() {
        errors.push(ValidationError::EmptyWorkflow);
    }
    if edges.len() > nodes.len().saturating_mul(2) {
        errors.push(ValidationError::TooManyEdges);
    }

    errors
}

/// Total order on coordinates that treats -0.0 and 0.0 as equal
fn coordinate_order(a: f64, b: f64) -> Ordering {
    let normalize = |v: f64| if v == 0.0 { 0.0 } else { v };
    normalize(a).total_cmp(&normalize(b))
}

/// Everything a simulation needs, detached from the store
///
/// Built from a validation-free copy of the graph so a run in flight never
/// observes later edits.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    graph: WorkflowGraph,
    catalog: CatalogState,
}

impl SimulationRequest {
    pub fn new(graph: &WorkflowGraph, catalog: CatalogState) -> Self {
        Self {
            graph: graph.without_validation(),
            catalog,
        }
    }

    /// The graph being simulated
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Compute the result immediately
    pub fn run(&self) -> SimulationResult {
        simulate(&self.graph.nodes, &self.graph.edges, &self.catalog)
    }

    /// Compute the result, then resolve after the configured latency
    pub async fn run_paced(self, pacing: &SimulationConfig) -> SimulationResult {
        let result = self.run();
        let delay = pacing.latency(self.graph.nodes.len());
        log::debug!(
            "Simulating {} node(s) with {}ms latency",
            self.graph.nodes.len(),
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        result
    }
}
