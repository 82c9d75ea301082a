//! Event types for observing the workflow store
//!
//! Events are sent from the store to the UI layer (or any consumer) after
//! commits, history moves, selection changes and simulation runs. They are
//! notifications only; state is always read back from the store.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Trait for sending store events
///
/// This abstracts over the transport mechanism (UI channel, mpsc, etc.)
/// allowing the store to be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: StoreEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Direction of a history move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryDirection {
    Undo,
    Redo,
}

/// Events emitted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoreEvent {
    /// A mutation was validated, committed and recorded
    #[serde(rename_all = "camelCase")]
    GraphCommitted {
        node_count: usize,
        edge_count: usize,
        global_errors: Vec<String>,
        history_index: isize,
    },

    /// Undo or redo restored a snapshot
    #[serde(rename_all = "camelCase")]
    HistoryMoved {
        direction: HistoryDirection,
        history_index: isize,
    },

    /// Selected node changed
    #[serde(rename_all = "camelCase")]
    SelectionChanged { node_id: Option<String> },

    /// A simulation result was stored
    #[serde(rename_all = "camelCase")]
    SimulationCompleted {
        valid: bool,
        steps: usize,
        failed_steps: usize,
    },

    /// An import was refused; the graph is unchanged
    #[serde(rename_all = "camelCase")]
    ImportRejected { reason: String },
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: StoreEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<StoreEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: StoreEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
        Ok(())
    }
}
