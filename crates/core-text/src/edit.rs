//! Multi-range edits and the offset mapping they induce.

use std::ops::Range;

use thiserror::Error;

use crate::Version;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit ranges overlap: {first:?} and {second:?}")]
    Overlapping {
        first: Range<usize>,
        second: Range<usize>,
    },
    #[error("edit range {range:?} is reversed")]
    Reversed { range: Range<usize> },
    #[error("edit range {range:?} exceeds buffer length {len}")]
    OutOfBounds { range: Range<usize>, len: usize },
    #[error("edit range {range:?} splits a character")]
    NotCharBoundary { range: Range<usize> },
}

/// Replace `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, "")
    }
}

/// Sorted, pairwise non-overlapping edits applied as one version step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new(mut edits: Vec<Edit>) -> Result<Self, EditError> {
        if let Some(bad) = edits.iter().find(|e| e.range.start > e.range.end) {
            return Err(EditError::Reversed {
                range: bad.range.clone(),
            });
        }
        edits.sort_by_key(|e| (e.range.start, e.range.end));
        for pair in edits.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            // Two insertions at one point have no defined order.
            let same_point = a.range.is_empty() && b.range.is_empty() && a.range.start == b.range.start;
            if a.range.end > b.range.start || same_point {
                return Err(EditError::Overlapping {
                    first: a.range.clone(),
                    second: b.range.clone(),
                });
            }
        }
        Ok(Self { edits })
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Edit> {
        self.edits.iter()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Which side of an insertion an offset sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Change {
    old: Range<usize>,
    new_len: usize,
}

/// Offset mapping from one buffer version to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    from: Version,
    to: Version,
    changes: Vec<Change>,
}

impl ChangeSet {
    pub(crate) fn from_edits(from: Version, to: Version, edits: &EditSet) -> Self {
        let changes = edits
            .iter()
            .map(|e| Change {
                old: e.range.clone(),
                new_len: e.text.len(),
            })
            .collect();
        Self { from, to, changes }
    }

    /// Single-change mapping between two full texts (common prefix / suffix).
    pub fn between(old: &str, new: &str, from: Version, to: Version) -> Self {
        let prefix = common_prefix(old, new);
        let suffix = common_suffix(&old[prefix..], &new[prefix..]);
        let old_end = old.len() - suffix;
        let new_end = new.len() - suffix;
        let changes = if prefix == old_end && prefix == new_end {
            Vec::new()
        } else {
            vec![Change {
                old: prefix..old_end,
                new_len: new_end - prefix,
            }]
        };
        Self { from, to, changes }
    }

    pub fn from_version(&self) -> Version {
        self.from
    }

    pub fn to_version(&self) -> Version {
        self.to
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Map an old-version offset. Offsets inside a replaced range collapse to one
    /// of its new boundaries according to `assoc`.
    pub fn map(&self, offset: usize, assoc: Assoc) -> usize {
        let mut delta: isize = 0;
        for c in &self.changes {
            if offset < c.old.start {
                break;
            }
            let after = offset > c.old.end || (offset == c.old.end && !c.old.is_empty());
            if after {
                delta += c.new_len as isize - c.old.len() as isize;
                continue;
            }
            let new_start = (c.old.start as isize + delta) as usize;
            return match assoc {
                Assoc::Before => new_start,
                Assoc::After => new_start + c.new_len,
            };
        }
        (offset as isize + delta) as usize
    }

    /// Map an offset that must survive the edit: `None` when it sat strictly
    /// inside replaced text.
    pub fn map_strict(&self, offset: usize) -> Option<usize> {
        let destroyed = self
            .changes
            .iter()
            .any(|c| c.old.start < offset && offset < c.old.end);
        if destroyed {
            None
        } else {
            Some(self.map(offset, Assoc::Before))
        }
    }

    /// Range covered, in the new version, by the text that replaced `old`.
    pub fn new_range_of(&self, old: &Range<usize>) -> Option<Range<usize>> {
        let mut delta: isize = 0;
        for c in &self.changes {
            if c.old == *old {
                let start = (c.old.start as isize + delta) as usize;
                return Some(start..start + c.new_len);
            }
            delta += c.new_len as isize - c.old.len() as isize;
        }
        None
    }
}

fn common_prefix(a: &str, b: &str) -> usize {
    let mut n = 0;
    for ((i, ca), cb) in a.char_indices().zip(b.chars()) {
        if ca != cb {
            return i;
        }
        n = i + ca.len_utf8();
    }
    n
}

fn common_suffix(a: &str, b: &str) -> usize {
    let mut n = 0;
    for (ca, cb) in a.chars().rev().zip(b.chars().rev()) {
        if ca != cb {
            break;
        }
        n += ca.len_utf8();
    }
    n
}
