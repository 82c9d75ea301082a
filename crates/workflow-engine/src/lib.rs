//! Workflow Engine - editing, validation and simulation for HR workflow graphs
//!
//! This crate holds the non-visual core of a workflow designer. A workflow is
//! a directed graph of Start, Task, Approval, Automated and End nodes. The
//! crate provides:
//!
//! - Structural validation with per-node error tags
//! - Field rules for each node type, including automation parameters
//! - A deterministic, position-ordered simulation
//! - Compressed snapshot-based undo/redo
//! - JSON import/export of the graph
//!
//! # Architecture
//!
//! - `WorkflowStore`: owns the graph; every mutation is validated and recorded
//! - `UndoStack`: compressed immutable snapshots for undo/redo
//! - `AutomationSource`: async provider of the automation action catalog
//! - `EventSink`: store notifications, not tied to any UI toolkit
//!
//! # Example
//!
//! ```ignore
//! use workflow_engine::{CatalogState, EngineConfig, WorkflowBuilder, WorkflowStore};
//!
//! let mut store = WorkflowStore::new(EngineConfig::default())?;
//! store.import_workflow(
//!     WorkflowBuilder::new()
//!         .add_start("start", (0.0, 0.0))
//!         .add_end("end", (200.0, 0.0))
//!         .connect("start", "end")
//!         .build(),
//! )?;
//! let result = store.run_simulation(CatalogState::Loading);
//! ```

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod fields;
pub mod simulation;
pub mod store;
pub mod types;
pub mod undo;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use catalog::{
    load_catalog, AutomationAction, AutomationCatalog, AutomationSource, CatalogState,
    FileAutomationSource, StaticAutomationSource,
};
pub use config::{EngineConfig, HistoryConfig, SimulationConfig};
pub use error::{Result, WorkflowError};
pub use events::{EventSink, HistoryDirection, NullEventSink, StoreEvent, VecEventSink};
pub use fields::{check_node, FieldCheck, FieldProblem};
pub use simulation::{simulate, SimulationRequest, SimulationResult, SimulationStep, StepStatus};
pub use store::{simulate_shared, SharedWorkflowStore, UndoRedoState, WorkflowStore};
pub use types::{
    CustomField, EdgeId, GraphEdge, GraphNode, NodeData, NodeId, NodeType, Position, WorkflowGraph,
};
pub use undo::UndoStack;
pub use validation::{
    validate, validate_workflow, NodeIssue, NodeValidation, ValidationError, ValidationReport,
};
