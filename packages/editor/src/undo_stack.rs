//! # Undo/Redo Stack
//!
//! Tree operations are copy-on-write, so history is a stack of previous
//! roots rather than inverse mutations.
//!
//! - Each applied command records the root it replaced
//! - Undo swaps the current root with the most recent snapshot
//! - New commands clear the redo stack
//! - Batches group several commands into one undo step
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! stack.record(&previous_root, Some("Add section"));
//! if let Some(restored) = stack.undo(&current_root) {
//!     current_root = restored;
//! }
//! ```

use pagebuilder_model::Node;

/// A root the page held before one undo step
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub root: Node,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct UndoStack {
    /// Most recent last
    undo_stack: Vec<Snapshot>,

    /// Most recent last
    redo_stack: Vec<Snapshot>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Open batch; holds the root from before its first command once one lands
    current_batch: Option<Option<Snapshot>>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record the root an applied command replaced
    pub fn record(&mut self, previous: &Node, description: Option<&str>) {
        let snapshot = Snapshot {
            root: previous.clone(),
            description: description.map(str::to_string),
        };

        match &mut self.current_batch {
            Some(batch) => {
                // only the state before the batch matters
                if batch.is_none() {
                    *batch = Some(snapshot);
                }
                self.redo_stack.clear();
            }
            None => self.push(snapshot),
        }
    }

    pub fn begin_batch(&mut self) {
        if self.current_batch.is_none() {
            self.current_batch = Some(None);
        }
    }

    /// Close the open batch. Returns whether it recorded anything.
    pub fn end_batch(&mut self, description: Option<&str>) -> bool {
        match self.current_batch.take() {
            Some(Some(mut snapshot)) => {
                if let Some(description) = description {
                    snapshot.description = Some(description.to_string());
                }
                self.push(snapshot);
                true
            }
            _ => false,
        }
    }

    pub fn in_batch(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Step back. `current` moves to the redo stack.
    pub fn undo(&mut self, current: &Node) -> Option<Node> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(Snapshot {
            root: current.clone(),
            description: snapshot.description.clone(),
        });
        Some(snapshot.root)
    }

    /// Step forward again. `current` moves back to the undo stack.
    pub fn redo(&mut self, current: &Node) -> Option<Node> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(Snapshot {
            root: current.clone(),
            description: snapshot.description.clone(),
        });
        Some(snapshot.root)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().and_then(|s| s.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|s| s.description.as_deref())
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
    use pagebuilder_model::NodeKind;

    fn root(children: usize) -> Node {
        Node::new("r", NodeKind::Root).with_children(
            (0..children).map(|i| Node::new(format!("s{}", i), NodeKind::Section)),
        )
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut stack = UndoStack::new();
        stack.record(&root(0), Some("Add section"));

        let restored = stack.undo(&root(1)).unwrap();
        assert_eq!(restored, root(0));
        assert_eq!(stack.redo_description(), Some("Add section"));

        let again = stack.redo(&restored).unwrap();
        assert_eq!(again, root(1));
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut stack = UndoStack::new();
        stack.record(&root(0), None);
        stack.undo(&root(1));
        assert!(stack.can_redo());
        stack.record(&root(0), None);
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_batch_is_one_step() {
        let mut stack = UndoStack::new();
        stack.begin_batch();
        stack.record(&root(0), None);
        stack.record(&root(1), None);
        stack.record(&root(2), None);
        assert!(stack.end_batch(Some("Add three sections")));

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo(&root(3)), Some(root(0)));
    }

    #[test]
    fn test_empty_batch_records_nothing() {
        let mut stack = UndoStack::new();
        stack.begin_batch();
        assert!(!stack.end_batch(None));
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_max_levels() {
        let mut stack = UndoStack::with_max_levels(2);
        for i in 0..5 {
            stack.record(&root(i), None);
        }
        assert_eq!(stack.undo_levels(), 2);
        assert_eq!(stack.undo(&root(5)), Some(root(4)));
        assert_eq!(stack.undo(&root(4)), Some(root(3)));
        assert_eq!(stack.undo(&root(3)), None);
    }
}
