//! Atomic content exchange between selections and their resolved targets.

use std::ops::Range;

use core_text::{Buffer, Edit, EditSet};

use crate::cursor::CursorId;
use crate::notice::Notice;

/// One cursor's half of a swap: its own extent and the target's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPair {
    pub cursor: CursorId,
    pub source: Range<usize>,
    pub target: Range<usize>,
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Build the single edit exchanging every pair, or reject the whole swap when
/// any two involved ranges overlap.
pub fn plan(buffer: &Buffer, pairs: &[SwapPair]) -> Result<EditSet, Notice> {
    let mut ranges: Vec<&Range<usize>> = pairs
        .iter()
        .flat_map(|p| [&p.source, &p.target])
        .collect();
    ranges.sort_by_key(|r| (r.start, r.end));
    if ranges.windows(2).any(|w| overlaps(w[0], w[1]) || w[0] == w[1]) {
        return Err(Notice::ConflictingSwap);
    }
    let edits = pairs
        .iter()
        .flat_map(|p| {
            [
                Edit::replace(p.source.clone(), buffer.slice_bytes(p.target.start, p.target.end)),
                Edit::replace(p.target.clone(), buffer.slice_bytes(p.source.start, p.source.end)),
            ]
        })
        .collect();
    EditSet::new(edits).map_err(|_| Notice::ConflictingSwap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair(id: u64, source: Range<usize>, target: Range<usize>) -> SwapPair {
        SwapPair {
            cursor: CursorId(id),
            source,
            target,
        }
    }

    #[test]
    fn exchanges_contents_in_one_edit() {
        let mut b = Buffer::from_str("t", "one two").unwrap();
        let edits = plan(&b, &[pair(0, 0..3, 4..7)]).unwrap();
        let changes = b.apply(&edits).unwrap();
        assert_eq!(b.text(), "two one");
        assert_eq!(changes.new_range_of(&(4..7)), Some(4..7));
    }

    #[test]
    fn overlap_across_cursors_is_rejected() {
        let b = Buffer::from_str("t", "aa bb cc dd").unwrap();
        let err = plan(&b, &[pair(0, 0..2, 3..5), pair(1, 3..5, 6..8)]).unwrap_err();
        assert_eq!(err, Notice::ConflictingSwap);
    }

    #[test]
    fn own_overlap_is_rejected() {
        let b = Buffer::from_str("t", "abcdef").unwrap();
        assert_eq!(plan(&b, &[pair(0, 0..4, 2..6)]).unwrap_err(), Notice::ConflictingSwap);
    }

    #[test]
    fn adjacent_ranges_are_fine() {
        let mut b = Buffer::from_str("t", "abXY").unwrap();
        let edits = plan(&b, &[pair(0, 0..2, 2..4)]).unwrap();
        b.apply(&edits).unwrap();
        assert_eq!(b.text(), "XYab");
    }
}
