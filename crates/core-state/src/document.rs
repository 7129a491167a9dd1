use std::ops::Range;

use core_selection::Selection;
use core_syntax::{SyntaxProvider, provider_for_path};
use core_text::{Assoc, Buffer, ChangeSet};
use tracing::{debug, trace, warn};

use crate::cursor::CursorSet;
use crate::history::SelectionHistory;
use crate::query::LspCache;
use crate::undo::UndoEngine;

/// One open buffer with everything the session keeps per buffer.
pub struct Document {
    pub(crate) buffer: Buffer,
    pub(crate) syntax: Option<Box<dyn SyntaxProvider>>,
    pub(crate) cursors: CursorSet,
    pub(crate) history: SelectionHistory,
    pub(crate) undo: UndoEngine,
    pub(crate) lsp_cache: Option<LspCache>,
    /// Marked ranges, sorted and distinct.
    pub(crate) marks: Vec<Range<usize>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("buffer", &self.buffer)
            .field("syntax", &self.syntax.is_some())
            .field("cursors", &self.cursors)
            .field("marks", &self.marks)
            .finish_non_exhaustive()
    }
}

impl Document {
    pub(crate) fn new(buffer: Buffer, history_depth: usize, undo_depth: usize) -> Self {
        let syntax = attach_syntax(&buffer);
        Self {
            buffer,
            syntax,
            cursors: CursorSet::new(Selection::point(0)),
            history: SelectionHistory::new(history_depth),
            undo: UndoEngine::new(undo_depth),
            lsp_cache: None,
            marks: Vec::new(),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    pub fn history(&self) -> &SelectionHistory {
        &self.history
    }

    pub fn undo(&self) -> &UndoEngine {
        &self.undo
    }

    pub fn syntax(&self) -> Option<&dyn SyntaxProvider> {
        self.syntax.as_deref()
    }

    pub fn has_syntax(&self) -> bool {
        self.syntax.is_some()
    }

    pub fn marks(&self) -> &[Range<usize>] {
        &self.marks
    }

    /// Unmark each range that is already marked and mark the others.
    pub(crate) fn toggle_marks(&mut self, ranges: impl IntoIterator<Item = Range<usize>>) {
        for range in ranges {
            match self.marks.iter().position(|m| *m == range) {
                Some(idx) => {
                    self.marks.remove(idx);
                }
                None => self.marks.push(range),
            }
        }
        self.marks.sort_by_key(|m| (m.start, m.end));
        trace!(target: "state.marks", buffer = self.buffer.name(), marks = self.marks.len(), "marks_toggled");
    }

    /// Marks grow over text replaced at their edges and vanish with their text.
    fn remap_marks(&mut self, changes: &ChangeSet) {
        let before = self.marks.len();
        let mut marks: Vec<Range<usize>> = self
            .marks
            .iter()
            .filter_map(|m| {
                let start = changes.map(m.start, Assoc::Before);
                let end = changes.map(m.end, Assoc::After).max(start);
                (start < end || m.is_empty()).then_some(start..end)
            })
            .collect();
        marks.sort_by_key(|m| (m.start, m.end));
        marks.dedup();
        self.marks = marks;
        if self.marks.len() != before {
            trace!(target: "state.marks", before, after = self.marks.len(), "marks_dropped");
        }
    }

    /// Bring derived state in line with a new buffer version: remap the jump
    /// list and marks, reparse the tree and forget cached locations. Cursors
    /// are left to the caller.
    pub(crate) fn after_edit(&mut self, changes: &ChangeSet) {
        self.history.remap(changes);
        self.remap_marks(changes);
        self.lsp_cache = None;
        if let Some(syntax) = self.syntax.as_mut() {
            let text = self.buffer.text();
            if let Err(e) = syntax.reparse(self.buffer.version(), &text) {
                warn!(target: "syntax.parse", buffer = self.buffer.name(), error = %e, "reparse_failed_dropping_tree");
                self.syntax = None;
            }
        }
        debug!(
            target: "state.history",
            buffer = self.buffer.name(),
            from = changes.from_version().0,
            to = changes.to_version().0,
            "document_remapped"
        );
    }
}

fn attach_syntax(buffer: &Buffer) -> Option<Box<dyn SyntaxProvider>> {
    match provider_for_path(&buffer.display_path(), buffer.version(), &buffer.text())? {
        Ok(provider) => {
            debug!(target: "syntax.parse", buffer = buffer.name(), "syntax_attached");
            Some(provider)
        }
        Err(e) => {
            warn!(target: "syntax.parse", buffer = buffer.name(), error = %e, "syntax_unavailable");
            None
        }
    }
}
