//! Multi-cursor set sharing one selection mode.
//!
//! The set is never empty, stays ordered by extent and holds no two cursors
//! with the same extent. One cursor is primary; its identity survives merges.

use core_selection::Selection;
use core_text::ChangeSet;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub id: CursorId,
    pub selection: Selection,
}

/// Id-free copy of a cursor set, as kept by the jump list and undo stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSnapshot {
    pub selections: Vec<Selection>,
    pub primary: usize,
}

impl CursorSnapshot {
    pub fn primary(&self) -> Option<&Selection> {
        self.selections.get(self.primary)
    }

    /// Remap through an edit. Selections whose ends sat inside replaced text,
    /// or whose whole extent was deleted, are dropped; `None` when nothing
    /// survives.
    pub fn remap(&self, changes: &ChangeSet) -> Option<CursorSnapshot> {
        let mut selections = Vec::with_capacity(self.selections.len());
        let mut primary = 0;
        for (idx, sel) in self.selections.iter().enumerate() {
            let (Some(anchor), Some(active)) =
                (changes.map_strict(sel.anchor), changes.map_strict(sel.active))
            else {
                continue;
            };
            if anchor == active && !sel.is_empty() {
                continue;
            }
            if idx == self.primary {
                primary = selections.len();
            }
            selections.push(Selection {
                anchor,
                active,
                info: sel.info.clone(),
            });
        }
        if selections.is_empty() {
            return None;
        }
        Some(CursorSnapshot {
            selections,
            primary,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CursorSet {
    cursors: Vec<Cursor>,
    primary: CursorId,
    next_id: u64,
}

impl CursorSet {
    pub fn new(selection: Selection) -> Self {
        Self {
            cursors: vec![Cursor {
                id: CursorId(0),
                selection,
            }],
            primary: CursorId(0),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.iter()
    }

    pub fn primary_id(&self) -> CursorId {
        self.primary
    }

    pub fn primary(&self) -> &Cursor {
        // The primary id always names a live cursor; fall back to the first one.
        self.cursors
            .iter()
            .find(|c| c.id == self.primary)
            .unwrap_or(&self.cursors[0])
    }

    pub fn primary_index(&self) -> usize {
        self.cursors
            .iter()
            .position(|c| c.id == self.primary)
            .unwrap_or(0)
    }

    pub fn get(&self, id: CursorId) -> Option<&Cursor> {
        self.cursors.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<CursorId> {
        self.cursors.iter().map(|c| c.id).collect()
    }

    pub fn selections(&self) -> Vec<Selection> {
        self.cursors.iter().map(|c| c.selection.clone()).collect()
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            selections: self.selections(),
            primary: self.primary_index(),
        }
    }

    fn alloc(&mut self) -> CursorId {
        let id = CursorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Replace every cursor from a snapshot. Ids are fresh; the snapshot's
    /// primary becomes primary.
    pub fn restore(&mut self, snapshot: &CursorSnapshot) {
        if snapshot.selections.is_empty() {
            return;
        }
        let mut cursors = Vec::with_capacity(snapshot.selections.len());
        let mut primary = None;
        for (idx, selection) in snapshot.selections.iter().enumerate() {
            let id = self.alloc();
            if idx == snapshot.primary {
                primary = Some(id);
            }
            cursors.push(Cursor {
                id,
                selection: selection.clone(),
            });
        }
        self.primary = primary.unwrap_or(cursors[0].id);
        self.cursors = cursors;
        self.normalize();
    }

    /// Commit a batch of per-cursor results. Ids not named keep their selection.
    pub fn apply(&mut self, updates: impl IntoIterator<Item = (CursorId, Selection)>) {
        for (id, selection) in updates {
            if let Some(cursor) = self.cursors.iter_mut().find(|c| c.id == id) {
                cursor.selection = selection;
            }
        }
        self.normalize();
    }

    /// Add a cursor that becomes primary. Returns the id of the primary after
    /// merging, which is an existing cursor when the extent was already taken.
    pub fn add(&mut self, selection: Selection) -> CursorId {
        if let Some(existing) = self
            .cursors
            .iter()
            .find(|c| c.selection.same_extent(&selection))
        {
            self.primary = existing.id;
            return existing.id;
        }
        let id = self.alloc();
        self.cursors.push(Cursor { id, selection });
        self.primary = id;
        self.normalize();
        id
    }

    /// Replace every cursor by one per selection; the first one is primary.
    /// An empty list leaves the set untouched.
    pub fn replace_all(&mut self, selections: Vec<Selection>) -> bool {
        if selections.is_empty() {
            return false;
        }
        let mut cursors = Vec::with_capacity(selections.len());
        for selection in selections {
            let id = self.alloc();
            cursors.push(Cursor { id, selection });
        }
        self.primary = cursors[0].id;
        self.cursors = cursors;
        self.normalize();
        true
    }

    pub fn keep_primary_only(&mut self) -> bool {
        if self.cursors.len() == 1 {
            return false;
        }
        let primary = self.primary().clone();
        self.cursors = vec![primary];
        true
    }

    /// Drop the primary cursor; the nearest remaining one takes over.
    /// Refused when it is the only cursor.
    pub fn remove_primary(&mut self) -> bool {
        if self.cursors.len() == 1 {
            return false;
        }
        let idx = self.primary_index();
        let removed = self.cursors.remove(idx);
        let at = removed.selection.start();
        let successor = [idx.checked_sub(1), Some(idx)]
            .into_iter()
            .flatten()
            .filter_map(|i| self.cursors.get(i))
            .min_by_key(|c| c.selection.start().abs_diff(at))
            .map(|c| c.id);
        if let Some(id) = successor {
            self.primary = id;
        }
        trace!(target: "state.cursors", removed = removed.id.0, primary = self.primary.0, "primary_removed");
        true
    }

    /// Remap every cursor through an edit. A selection touching replaced text
    /// grows to cover the replacement.
    pub fn remap(&mut self, changes: &ChangeSet) {
        use core_text::Assoc;
        for cursor in &mut self.cursors {
            let sel = &cursor.selection;
            let (anchor, active) = if sel.anchor <= sel.active {
                (
                    changes.map(sel.anchor, Assoc::Before),
                    changes.map(sel.active, Assoc::After),
                )
            } else {
                (
                    changes.map(sel.anchor, Assoc::After),
                    changes.map(sel.active, Assoc::Before),
                )
            };
            cursor.selection = Selection {
                anchor,
                active,
                info: sel.info.clone(),
            };
        }
        self.normalize();
    }

    pub fn clamp(&mut self, len: usize) {
        for cursor in &mut self.cursors {
            cursor.selection = cursor.selection.clone().clamp(len);
        }
        self.normalize();
    }

    /// Sort by extent and merge cursors sharing one. In a merged group the
    /// primary survives if present, otherwise the earliest cursor of the group.
    fn normalize(&mut self) {
        let before = self.cursors.len();
        self.cursors
            .sort_by_key(|c| (c.selection.start(), c.selection.end(), c.id));
        let primary = self.primary;
        let mut merged: Vec<Cursor> = Vec::with_capacity(before);
        for cursor in self.cursors.drain(..) {
            match merged.last_mut() {
                Some(last) if last.selection.same_extent(&cursor.selection) => {
                    if cursor.id == primary {
                        *last = cursor;
                    }
                }
                _ => merged.push(cursor),
            }
        }
        self.cursors = merged;
        if !self.cursors.iter().any(|c| c.id == self.primary) {
            self.primary = self.cursors[0].id;
        }
        if self.cursors.len() != before {
            trace!(
                target: "state.cursors",
                before,
                after = self.cursors.len(),
                primary = self.primary.0,
                "cursors_merged"
            );
        }
    }
}
