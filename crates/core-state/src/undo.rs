use core_text::Buffer;
use ropey::Rope;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use tracing::trace;

use crate::cursor::CursorSnapshot;

/// Default number of snapshots retained in undo history.
pub const UNDO_DEPTH_DEFAULT: usize = 200;

/// What produced a snapshot; reported back on undo/redo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotKind {
    /// Replace or delete applied to every selection.
    Edit,
    /// Atomic content exchange between selections and their swap targets.
    Swap,
}

/// Text and cursors as they were before an edit.
#[derive(Clone, Debug)]
pub struct EditSnapshot {
    pub kind: SnapshotKind,
    pub text: Rope,
    pub cursors: CursorSnapshot,
    /// Content hash of the text at capture.
    pub hash: u64,
}

/// State to put back after an undo or redo.
#[derive(Clone, Debug)]
pub struct Restore {
    pub kind: SnapshotKind,
    pub text: Rope,
    pub cursors: CursorSnapshot,
}

#[derive(Debug)]
pub struct UndoEngine {
    undo_stack: Vec<EditSnapshot>,
    redo_stack: Vec<EditSnapshot>,
    depth: usize,
    /// Count of snapshots skipped due to identical successive content.
    snapshots_skipped: u64,
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new(UNDO_DEPTH_DEFAULT)
    }
}

impl UndoEngine {
    pub fn new(depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            depth: depth.max(1),
            snapshots_skipped: 0,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn snapshots_skipped(&self) -> u64 {
        self.snapshots_skipped
    }

    /// Capture the state an edit is about to replace.
    pub fn push_snapshot(&mut self, kind: SnapshotKind, buffer: &Buffer, cursors: CursorSnapshot) {
        let current_hash = buffer_hash(buffer.rope());
        if let Some(last) = self.undo_stack.last()
            && last.hash == current_hash
        {
            self.snapshots_skipped += 1;
            trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), hash = current_hash, "snapshot_dedupe_skip");
            return;
        }
        self.undo_stack.push(EditSnapshot {
            kind,
            text: buffer.rope().clone(),
            cursors,
            hash: current_hash,
        });
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), lines = buffer.line_count(), hash = current_hash, "push_snapshot");
        if self.undo_stack.len() > self.depth {
            let _ = self.undo_stack.remove(0);
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
        self.redo_stack.clear();
        trace!(target: "state.undo", "redo_stack_cleared_on_new_edit");
    }

    /// Pop the last snapshot, saving the present state for redo.
    pub fn undo(&mut self, buffer: &Buffer, cursors: CursorSnapshot) -> Option<Restore> {
        let last = self.undo_stack.pop()?;
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        self.redo_stack.push(EditSnapshot {
            kind: last.kind,
            text: buffer.rope().clone(),
            cursors,
            hash: buffer_hash(buffer.rope()),
        });
        trace!(target: "state.undo", redo_depth = self.redo_stack.len(), "redo_push_from_undo");
        Some(Restore {
            kind: last.kind,
            text: last.text,
            cursors: last.cursors,
        })
    }

    pub fn redo(&mut self, buffer: &Buffer, cursors: CursorSnapshot) -> Option<Restore> {
        let next = self.redo_stack.pop()?;
        trace!(target: "state.undo", redo_depth = self.redo_stack.len(), undo_depth = self.undo_stack.len(), "redo_pop");
        self.undo_stack.push(EditSnapshot {
            kind: next.kind,
            text: buffer.rope().clone(),
            cursors,
            hash: buffer_hash(buffer.rope()),
        });
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), "undo_push_from_redo");
        Some(Restore {
            kind: next.kind,
            text: next.text,
            cursors: next.cursors,
        })
    }
}

fn buffer_hash(rope: &Rope) -> u64 {
    let mut h = DefaultHasher::new();
    for chunk in rope.chunks() {
        h.write(chunk.as_bytes());
    }
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_selection::Selection;
    use core_text::{Edit, EditSet};
    use pretty_assertions::assert_eq;

    fn cursors(at: usize) -> CursorSnapshot {
        CursorSnapshot {
            selections: vec![Selection::point(at)],
            primary: 0,
        }
    }

    #[test]
    fn undo_then_redo_restores_text_and_cursors() {
        let mut b = Buffer::from_str("t", "abc").unwrap();
        let mut undo = UndoEngine::new(10);
        undo.push_snapshot(SnapshotKind::Edit, &b, cursors(1));
        b.apply(&EditSet::new(vec![Edit::replace(1..2, "XYZ")]).unwrap())
            .unwrap();
        let restore = undo.undo(&b, cursors(4)).unwrap();
        assert_eq!(restore.text.to_string(), "abc");
        assert_eq!(restore.cursors, cursors(1));
        b.restore(restore.text);
        let again = undo.redo(&b, cursors(1)).unwrap();
        assert_eq!(again.text.to_string(), "aXYZc");
        assert_eq!(again.cursors, cursors(4));
        assert_eq!(undo.undo_depth(), 1);
        assert_eq!(undo.redo_depth(), 0);
    }

    #[test]
    fn identical_content_is_deduped() {
        let b = Buffer::from_str("t", "same").unwrap();
        let mut undo = UndoEngine::new(10);
        undo.push_snapshot(SnapshotKind::Edit, &b, cursors(0));
        undo.push_snapshot(SnapshotKind::Swap, &b, cursors(2));
        assert_eq!(undo.undo_depth(), 1);
        assert_eq!(undo.snapshots_skipped(), 1);
    }

    #[test]
    fn depth_is_bounded() {
        let mut b = Buffer::from_str("t", "").unwrap();
        let mut undo = UndoEngine::new(3);
        for i in 0..5 {
            undo.push_snapshot(SnapshotKind::Edit, &b, cursors(i));
            b.apply(&EditSet::new(vec![Edit::replace(i..i, "x")]).unwrap())
                .unwrap();
        }
        assert_eq!(undo.undo_depth(), 3);
    }

    #[test]
    fn nothing_to_undo() {
        let b = Buffer::from_str("t", "x").unwrap();
        let mut undo = UndoEngine::default();
        assert!(undo.undo(&b, cursors(0)).is_none());
        assert!(undo.redo(&b, cursors(0)).is_none());
    }
}
