//! Cross-file result list fed by global search and goto queries.

use std::path::PathBuf;

use core_selection::SelectionInfo;
use core_text::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickfixEntry {
    pub path: PathBuf,
    pub start: Position,
    pub end: Position,
    pub info: Option<SelectionInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct QuickfixList {
    title: String,
    entries: Vec<QuickfixEntry>,
    current: Option<usize>,
}

impl QuickfixList {
    /// Replace the list. Entries are ordered by path and position; exact
    /// duplicates are dropped.
    pub fn set(&mut self, title: impl Into<String>, mut entries: Vec<QuickfixEntry>) {
        entries.sort_by(|a, b| (&a.path, a.start, a.end).cmp(&(&b.path, b.start, b.end)));
        entries.dedup();
        self.title = title.into();
        self.entries = entries;
        self.current = None;
    }

    pub fn clear(&mut self) {
        self.title.clear();
        self.entries.clear();
        self.current = None;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[QuickfixEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&QuickfixEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Step forward; the first call lands on the first entry. Stops at the end.
    pub fn next(&mut self) -> Option<&QuickfixEntry> {
        let idx = match self.current {
            None => 0,
            Some(i) => i + 1,
        };
        if idx >= self.entries.len() {
            return None;
        }
        self.current = Some(idx);
        self.entries.get(idx)
    }

    pub fn previous(&mut self) -> Option<&QuickfixEntry> {
        let idx = self.current?.checked_sub(1)?;
        self.current = Some(idx);
        self.entries.get(idx)
    }
}
