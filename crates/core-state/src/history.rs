use std::collections::VecDeque;

use core_text::ChangeSet;
use tracing::trace;

use crate::cursor::CursorSnapshot;

/// Default number of jump-list entries kept per buffer.
pub const HISTORY_DEPTH_DEFAULT: usize = 100;

/// Per-buffer jump list of cursor-set snapshots with a forward side.
#[derive(Debug, Clone)]
pub struct SelectionHistory {
    back: VecDeque<CursorSnapshot>,
    forward: Vec<CursorSnapshot>,
    depth: usize,
}

impl Default for SelectionHistory {
    fn default() -> Self {
        Self::new(HISTORY_DEPTH_DEFAULT)
    }
}

impl SelectionHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            back: VecDeque::new(),
            forward: Vec::new(),
            depth: depth.max(1),
        }
    }

    pub fn back_len(&self) -> usize {
        self.back.len()
    }

    pub fn forward_len(&self) -> usize {
        self.forward.len()
    }

    fn push_back_bounded(&mut self, snapshot: CursorSnapshot) {
        self.back.push_back(snapshot);
        if self.back.len() > self.depth {
            self.back.pop_front();
            trace!(target: "state.history", depth = self.depth, "history_trimmed");
        }
    }

    /// Record the cursor set that a commit is about to replace.
    pub fn push(&mut self, previous: CursorSnapshot) {
        if self.back.back() == Some(&previous) {
            trace!(target: "state.history", back = self.back.len(), "history_duplicate_skip");
            return;
        }
        self.push_back_bounded(previous);
        self.forward.clear();
        trace!(target: "state.history", back = self.back.len(), "history_push");
    }

    /// Pop the most recent entry, remembering `current` on the forward side.
    pub fn go_back(&mut self, current: CursorSnapshot) -> Option<CursorSnapshot> {
        let target = self.back.pop_back()?;
        self.forward.push(current);
        trace!(target: "state.history", back = self.back.len(), forward = self.forward.len(), "history_back");
        Some(target)
    }

    pub fn go_forward(&mut self, current: CursorSnapshot) -> Option<CursorSnapshot> {
        let target = self.forward.pop()?;
        self.push_back_bounded(current);
        trace!(target: "state.history", back = self.back.len(), forward = self.forward.len(), "history_forward");
        Some(target)
    }

    /// Carry every entry across an edit, dropping the ones whose text is gone.
    pub fn remap(&mut self, changes: &ChangeSet) {
        let before = self.back.len() + self.forward.len();
        let back: Vec<_> = self.back.drain(..).filter_map(|s| s.remap(changes)).collect();
        for snapshot in back {
            if self.back.back() != Some(&snapshot) {
                self.back.push_back(snapshot);
            }
        }
        self.forward = self
            .forward
            .drain(..)
            .filter_map(|s| s.remap(changes))
            .collect();
        self.forward.dedup();
        let after = self.back.len() + self.forward.len();
        if after != before {
            trace!(target: "state.history", before, after, "history_entries_dropped");
        }
    }
}
