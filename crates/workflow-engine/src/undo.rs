//! Undo/redo system using compressed snapshots
//!
//! A linear, single-branch log of committed graph states. Each snapshot is
//! the graph serialized and zstd-compressed, so it is an independent value:
//! later edits to the live graph can never reach into history.
//!
//! # Design Choice: Snapshots vs Command Pattern
//!
//! Snapshots work with any mutation without writing an inverse for each one,
//! and compression keeps a long editing session small.

use std::collections::VecDeque;

use crate::config::HistoryConfig;
use crate::error::{Result, WorkflowError};
use crate::types::WorkflowGraph;

/// Undo/redo stack using compressed snapshots
pub struct UndoStack {
    /// Compressed graph states (zstd)
    snapshots: VecDeque<Vec<u8>>,
    /// Position of the current state; `None` while empty
    current: Option<usize>,
    /// Maximum number of snapshots to keep
    max_snapshots: Option<usize>,
    /// zstd compression level
    compression_level: i32,
}

impl UndoStack {
    /// Create an unbounded undo stack
    pub fn new() -> Self {
        Self::with_config(&HistoryConfig::default())
    }

    /// Create an undo stack from history settings
    pub fn with_config(config: &HistoryConfig) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: None,
            // At least 1 snapshot
            max_snapshots: config.max_snapshots.map(|max| max.max(1)),
            compression_level: config.compression_level,
        }
    }

    /// Push a new snapshot onto the stack
    ///
    /// This truncates any redo history (snapshots after current position).
    /// On error the stack is left unchanged.
    pub fn push(&mut self, graph: &WorkflowGraph) -> Result<()> {
        let json = serde_json::to_vec(graph)?;
        let compressed = zstd::encode_all(&json[..], self.compression_level)
            .map_err(|e| WorkflowError::Compression(e.to_string()))?;

        // Truncate any redo history
        let keep = self.current.map_or(0, |current| current + 1);
        self.snapshots.truncate(keep);

        self.snapshots.push_back(compressed);

        // Trim old snapshots if over limit
        if let Some(max) = self.max_snapshots {
            while self.snapshots.len() > max {
                self.snapshots.pop_front();
            }
        }

        self.current = Some(self.snapshots.len() - 1);
        Ok(())
    }

    /// Undo: move back one snapshot
    ///
    /// Returns the previous graph state, or None if at the beginning. The
    /// position only moves when the snapshot decodes.
    pub fn undo(&mut self) -> Option<Result<WorkflowGraph>> {
        let target = self.current.filter(|&current| current > 0)? - 1;
        Some(self.move_to(target))
    }

    /// Redo: move forward one snapshot
    ///
    /// Returns the next graph state, or None if at the end.
    pub fn redo(&mut self) -> Option<Result<WorkflowGraph>> {
        let target = self.current.map_or(0, |current| current + 1);
        if target >= self.snapshots.len() || self.current.is_none() {
            return None;
        }
        Some(self.move_to(target))
    }

    /// Get the current graph state without modifying the stack
    pub fn current(&self) -> Option<Result<WorkflowGraph>> {
        self.current.map(|current| self.decompress(current))
    }

    /// Position of the current state (`historyIndex`); `-1` while empty
    pub fn index(&self) -> isize {
        self.current.map_or(-1, |current| current as isize)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.current.is_some_and(|current| current > 0)
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.current
            .is_some_and(|current| current + 1 < self.snapshots.len())
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Clear all snapshots
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current = None;
    }

    fn move_to(&mut self, index: usize) -> Result<WorkflowGraph> {
        let graph = self.decompress(index)?;
        self.current = Some(index);
        Ok(graph)
    }

    /// Decompress a snapshot at the given index
    fn decompress(&self, index: usize) -> Result<WorkflowGraph> {
        let compressed = &self.snapshots[index];
        let json = zstd::decode_all(&compressed[..])
            .map_err(|e| WorkflowError::Compression(e.to_string()))?;
        let graph: WorkflowGraph = serde_json::from_slice(&json)?;
        Ok(graph)
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphNode, NodeData, NodeType};

    fn make_graph(name: &str) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new();
        graph.nodes.push(
            GraphNode::new("node1", NodeType::Task, (0.0, 0.0)).with_data(NodeData::titled(name)),
        );
        graph
    }

    fn title(graph: &WorkflowGraph) -> &str {
        graph.nodes[0].data.title.as_deref().unwrap_or_default()
    }

    fn bounded(max: usize) -> UndoStack {
        UndoStack::with_config(&HistoryConfig {
            max_snapshots: Some(max),
            ..HistoryConfig::default()
        })
    }

    #[test]
    fn test_empty_stack() {
        let mut stack = UndoStack::new();
        assert_eq!(stack.index(), -1);
        assert!(stack.current().is_none());
        assert!(stack.undo().is_none());
        assert!(stack.redo().is_none());
    }

    #[test]
    fn test_push_and_undo() {
        let mut stack = UndoStack::new();

        stack.push(&make_graph("first")).unwrap();
        stack.push(&make_graph("second")).unwrap();
        stack.push(&make_graph("third")).unwrap();

        // Should be at "third"
        let current = stack.current().unwrap().unwrap();
        assert_eq!(title(&current), "third");
        assert_eq!(stack.index(), 2);

        // Undo to "second"
        let undone = stack.undo().unwrap().unwrap();
        assert_eq!(title(&undone), "second");

        // Undo to "first"
        let undone = stack.undo().unwrap().unwrap();
        assert_eq!(title(&undone), "first");
        assert_eq!(stack.index(), 0);

        // Can't undo further
        assert!(stack.undo().is_none());
        assert_eq!(stack.index(), 0);
    }

    #[test]
    fn test_redo() {
        let mut stack = UndoStack::new();

        stack.push(&make_graph("first")).unwrap();
        stack.push(&make_graph("second")).unwrap();

        stack.undo(); // Go to "first"

        // Redo to "second"
        let redone = stack.redo().unwrap().unwrap();
        assert_eq!(title(&redone), "second");

        // Can't redo further
        assert!(stack.redo().is_none());
    }

    #[test]
    fn test_push_truncates_redo() {
        let mut stack = UndoStack::new();

        stack.push(&make_graph("first")).unwrap();
        stack.push(&make_graph("second")).unwrap();
        stack.undo(); // Go to "first"

        // Push new graph - should truncate "second"
        stack.push(&make_graph("third")).unwrap();

        // Can't redo anymore
        assert!(!stack.can_redo());
        assert_eq!(stack.len(), 2);

        // Current is "third"
        let current = stack.current().unwrap().unwrap();
        assert_eq!(title(&current), "third");
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut stack = UndoStack::new();
        let mut graph = make_graph("original");
        stack.push(&graph).unwrap();

        graph.nodes[0].data.title = Some("edited".into());
        graph.nodes.clear();

        let stored = stack.current().unwrap().unwrap();
        assert_eq!(title(&stored), "original");
    }

    #[test]
    fn test_max_snapshots() {
        let mut stack = bounded(3);

        for i in 0..5 {
            stack.push(&make_graph(&format!("graph_{}", i))).unwrap();
        }

        // Should only have 3 snapshots
        assert_eq!(stack.len(), 3);

        // Should have graph_2, graph_3, graph_4 (oldest trimmed)
        let current = stack.current().unwrap().unwrap();
        assert_eq!(title(&current), "graph_4");

        // Can only undo twice (to graph_3 and graph_2)
        stack.undo();
        stack.undo();
        assert!(!stack.can_undo());
        assert_eq!(title(&stack.current().unwrap().unwrap()), "graph_2");
    }

    #[test]
    fn test_can_undo_redo() {
        let mut stack = UndoStack::new();

        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        stack.push(&make_graph("first")).unwrap();
        assert!(!stack.can_undo()); // Only one snapshot
        assert!(!stack.can_redo());

        stack.push(&make_graph("second")).unwrap();
        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        stack.undo();
        assert!(!stack.can_undo());
        assert!(stack.can_redo());

        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.index(), -1);
    }
}
