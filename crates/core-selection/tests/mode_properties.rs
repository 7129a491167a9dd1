use core_selection::{ModeKind, Movement, Resolution, ResolveContext, Selection, SelectionMode, resolve};
use core_text::Buffer;
use proptest::prelude::*;
use std::ops::Range;

fn contiguous_modes() -> impl Strategy<Value = ModeKind> {
    prop_oneof![
        Just(ModeKind::Character),
        Just(ModeKind::WordShort),
        Just(ModeKind::WordLong),
        Just(ModeKind::LineTrimmed),
        Just(ModeKind::LineFull),
        Just(ModeKind::Token),
    ]
}

fn step(mode: &SelectionMode, b: &Buffer, sel: &Selection, movement: Movement) -> Resolution {
    resolve(mode, &ResolveContext::new(b), sel, movement).unwrap()
}

/// Every selection reached from `First` by repeated `Next`.
fn walk(mode: &SelectionMode, b: &Buffer) -> Vec<Selection> {
    let mut out = Vec::new();
    let mut res = step(mode, b, &Selection::point(0), Movement::First);
    while let Resolution::Found(sel) = res {
        assert!(out.len() <= b.len_bytes() + 1, "walk does not terminate");
        res = step(mode, b, &sel, Movement::Next);
        out.push(sel);
    }
    out
}

fn covered(ranges: &[Range<usize>], byte: usize) -> bool {
    ranges.iter().any(|r| r.contains(&byte))
}

proptest! {
    #[test]
    fn next_from_first_covers_all_non_blank_text(
        text in "[a-zA-Z0-9_ \n(){}.,;:+\\-]{0,60}",
        kind in contiguous_modes(),
    ) {
        let b = Buffer::from_str("p", &text).unwrap();
        let mode = SelectionMode::new(kind.clone());
        let ranges: Vec<_> = walk(&mode, &b).iter().map(|s| s.range()).collect();
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].start <= pair[1].start, "{:?} not ordered", pair);
        }
        for (i, ch) in text.char_indices() {
            let must_cover = match kind {
                ModeKind::LineFull => true,
                _ => !ch.is_whitespace(),
            };
            if must_cover {
                prop_assert!(covered(&ranges, i), "byte {} ({:?}) uncovered in {:?}", i, ch, kind);
            }
        }
    }

    #[test]
    fn previous_undoes_next(
        text in "[a-zA-Z0-9_ \n(){}.,;:+\\-]{1,60}",
        kind in contiguous_modes(),
    ) {
        let b = Buffer::from_str("p", &text).unwrap();
        let mode = SelectionMode::new(kind);
        let stops = walk(&mode, &b);
        for pair in stops.windows(2) {
            let back = step(&mode, &b, &pair[1], Movement::Previous);
            prop_assert_eq!(back, Resolution::Found(pair[0].clone()));
        }
    }

    #[test]
    fn resolution_is_deterministic(
        text in "[a-zA-Z \n]{0,40}",
        offset in 0usize..45,
        kind in contiguous_modes(),
    ) {
        let b = Buffer::from_str("p", &text).unwrap();
        let mode = SelectionMode::new(kind);
        let sel = Selection::point(offset);
        for movement in [Movement::Next, Movement::Previous, Movement::Current, Movement::Up, Movement::Down] {
            let once = step(&mode, &b, &sel, movement);
            let twice = step(&mode, &b, &sel, movement);
            prop_assert_eq!(&once, &twice);
            if let Resolution::Found(found) = once {
                prop_assert!(found.end() <= b.len_bytes());
            }
        }
    }
}
