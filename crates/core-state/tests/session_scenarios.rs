use core_selection::{ModeSpec, Movement, SearchScope, Selection};
use core_state::{Notice, Session, Settings};
use core_text::{Buffer, BufferId};
use pretty_assertions::assert_eq;
use std::ops::Range;

fn session(name: &str, text: &str) -> Session {
    Session::new(Buffer::from_str(name, text).unwrap(), Settings::default())
}

fn ranges(s: &Session) -> Vec<Range<usize>> {
    s.cursors().iter().map(|c| c.selection.range()).collect()
}

fn primary(s: &Session) -> Range<usize> {
    s.cursors().primary().selection.range()
}

#[test]
fn column_cursor_at_line_end_stays_while_others_move() {
    let mut s = session("t.txt", "hello");
    s.switch_mode(&ModeSpec::Column).unwrap();
    s.set_selections(vec![Selection::point(0), Selection::point(5)]);
    let out = s.apply_movement(Movement::Next).unwrap();
    assert_eq!(out.notice, None);
    assert!(out.selection_changed);
    assert_eq!(ranges(&s), vec![0..1, 5..5]);
}

#[test]
fn extend_moves_active_end_then_escape_collapses() {
    let mut s = session("t.txt", "myOatPepperBanana");
    s.set_selections(vec![Selection::point(2)]);
    s.toggle_extend();
    s.apply_movement(Movement::Next).unwrap();
    let sel = &s.cursors().primary().selection;
    assert_eq!((sel.anchor, sel.active), (2, 5));
    s.apply_movement(Movement::Next).unwrap();
    let sel = &s.cursors().primary().selection;
    assert_eq!((sel.anchor, sel.active), (2, 11));
    s.escape();
    assert!(!s.is_extending());
    assert_eq!(s.cursors().primary().selection, Selection::point(11));
}

#[test]
fn extend_backward_lands_on_target_start() {
    let mut s = session("t.txt", "one two three");
    s.set_selections(vec![Selection::new(8..13)]);
    s.toggle_extend();
    s.apply_movement(Movement::Previous).unwrap();
    let sel = &s.cursors().primary().selection;
    assert_eq!((sel.anchor, sel.active), (8, 4));
    assert_eq!(sel.range(), 4..8);
    s.apply_movement(Movement::Previous).unwrap();
    let sel = &s.cursors().primary().selection;
    assert_eq!((sel.anchor, sel.active), (8, 0));
    assert_eq!(sel.range(), 0..8);
}

#[test]
fn extend_shrinks_back_toward_the_anchor() {
    let mut s = session("t.txt", "myOatPepperBanana");
    s.set_selections(vec![Selection::point(2)]);
    s.toggle_extend();
    s.apply_movement(Movement::Next).unwrap();
    s.apply_movement(Movement::Next).unwrap();
    s.apply_movement(Movement::Previous).unwrap();
    let sel = &s.cursors().primary().selection;
    assert_eq!((sel.anchor, sel.active), (2, 5));
}

#[test]
fn current_collapses_an_extension() {
    let mut s = session("t.txt", "ab cd");
    s.set_selections(vec![Selection::point(0)]);
    s.toggle_extend();
    s.apply_movement(Movement::Next).unwrap();
    s.apply_movement(Movement::Current).unwrap();
    assert!(!s.is_extending());
    assert_eq!(s.cursors().primary().selection, Selection::point(2));
}

#[test]
fn swap_exchanges_and_undoes_in_one_step() {
    let mut s = session("t.txt", "one two three");
    s.set_selections(vec![Selection::new(0..3)]);
    s.toggle_swap();
    let out = s.apply_movement(Movement::Next).unwrap();
    assert!(out.buffer_changed);
    assert!(!s.is_swap_armed());
    assert_eq!(s.buffer().text(), "two one three");
    assert_eq!(primary(&s), 4..7);
    assert_eq!(s.active_document().undo().undo_depth(), 1);
    s.undo();
    assert_eq!(s.buffer().text(), "one two three");
    assert_eq!(primary(&s), 0..3);
    s.redo();
    assert_eq!(s.buffer().text(), "two one three");
}

#[test]
fn multi_cursor_swap_is_one_edit() {
    let mut s = session("t.txt", "aa bb cc dd");
    s.set_selections(vec![Selection::new(0..2), Selection::new(6..8)]);
    s.toggle_swap();
    s.apply_movement(Movement::Next).unwrap();
    assert_eq!(s.buffer().text(), "bb aa dd cc");
    assert_eq!(ranges(&s), vec![3..5, 9..11]);
    s.undo();
    assert_eq!(s.buffer().text(), "aa bb cc dd");
}

#[test]
fn overlapping_swap_is_rejected_untouched() {
    let mut s = session("t.txt", "aa bb cc");
    s.set_selections(vec![Selection::new(0..2), Selection::new(3..5)]);
    let version = s.buffer().version();
    s.toggle_swap();
    let out = s.apply_movement(Movement::Next).unwrap();
    assert_eq!(out.notice, Some(Notice::ConflictingSwap));
    assert_eq!(s.buffer().text(), "aa bb cc");
    assert_eq!(s.buffer().version(), version);
    assert_eq!(ranges(&s), vec![0..2, 3..5]);
    assert_eq!(s.active_document().undo().undo_depth(), 0);
}

#[test]
fn history_round_trip_and_remap() {
    let mut s = session("t.txt", "a b c");
    s.set_selections(vec![Selection::new(0..1)]);
    s.apply_movement(Movement::Next).unwrap();
    s.apply_movement(Movement::Next).unwrap();
    assert_eq!(primary(&s), 4..5);
    s.apply_movement(Movement::GoBack).unwrap();
    assert_eq!(primary(&s), 2..3);
    s.apply_movement(Movement::GoForward).unwrap();
    assert_eq!(primary(&s), 4..5);

    s.set_selections(vec![Selection::new(0..1)]);
    s.replace_selections("xyz").unwrap();
    assert_eq!(s.buffer().text(), "xyz b c");
    assert_eq!(primary(&s), 0..3);
    s.apply_movement(Movement::GoBack).unwrap();
    // 4..5 was recorded before the edit and moved with the text.
    assert_eq!(primary(&s), 6..7);
}

#[test]
fn go_back_on_empty_history_is_no_match() {
    let mut s = session("t.txt", "abc");
    let out = s.apply_movement(Movement::GoBack).unwrap();
    assert_eq!(out.notice, Some(Notice::NoMatch));
}

#[test]
fn merged_cursors_keep_primary_identity() {
    let mut s = session("t.txt", "abc");
    s.switch_mode(&ModeSpec::Character).unwrap();
    s.set_selections(vec![Selection::new(1..2), Selection::new(0..1)]);
    let primary_id = s.cursors().primary_id();
    assert_eq!(primary(&s), 1..2);
    s.apply_movement(Movement::Previous).unwrap();
    assert_eq!(s.cursors().len(), 1);
    assert_eq!(s.cursors().primary_id(), primary_id);
    assert_eq!(primary(&s), 0..1);
}

#[test]
fn cursor_set_operations() {
    let mut s = session("t.txt", "a b c");
    s.set_selections(vec![Selection::new(0..1)]);
    s.add_cursor(Movement::Next).unwrap();
    assert_eq!(ranges(&s), vec![0..1, 2..3]);
    assert_eq!(primary(&s), 2..3);
    s.select_all().unwrap();
    assert_eq!(ranges(&s), vec![0..1, 2..3, 4..5]);
    s.remove_primary();
    assert_eq!(ranges(&s), vec![2..3, 4..5]);
    assert_eq!(primary(&s), 2..3);
    s.keep_primary_only();
    assert_eq!(ranges(&s), vec![2..3]);
}

#[test]
fn replace_every_selection_is_one_undo_step() {
    let mut s = session("t.txt", "a b c");
    s.select_all().unwrap();
    s.replace_selections("XY").unwrap();
    assert_eq!(s.buffer().text(), "XY XY XY");
    assert_eq!(ranges(&s), vec![0..2, 3..5, 6..8]);
    s.undo();
    assert_eq!(s.buffer().text(), "a b c");
    assert_eq!(s.cursors().len(), 3);
    assert_eq!(s.undo().notice, Some(Notice::NothingToUndo));
}

#[test]
fn overlapping_selections_refuse_edits() {
    let mut s = session("t.txt", "abcdef");
    s.set_selections(vec![Selection::new(0..3), Selection::new(2..5)]);
    let out = s.delete_selections().unwrap();
    assert_eq!(out.notice, Some(Notice::ConflictingEdit));
    assert_eq!(s.buffer().text(), "abcdef");
}

#[test]
fn global_search_fills_quickfix_across_buffers() {
    let mut s = session("a.txt", "foo bar\nfoo");
    let other = s.open(Buffer::from_str("b.txt", "xx foo").unwrap());
    s.switch_mode(&ModeSpec::Search {
        query: "foo".into(),
        scope: SearchScope::Global,
        case_insensitive: None,
    })
    .unwrap();
    assert_eq!(s.quickfix().len(), 3);
    assert_eq!(primary(&s), 0..3);
    s.quickfix_next().unwrap();
    s.quickfix_next().unwrap();
    assert_eq!(s.active(), BufferId(0));
    assert_eq!(primary(&s), 8..11);
    s.quickfix_next().unwrap();
    assert_eq!(s.active(), other);
    assert_eq!(primary(&s), 3..6);
    let out = s.quickfix_next().unwrap();
    assert_eq!(out.notice, Some(Notice::QuickfixExhausted));
    s.quickfix_previous().unwrap();
    assert_eq!(s.active(), BufferId(0));
}

#[test]
fn marks_survive_edits_and_drive_mark_mode() {
    let mut s = session("t.txt", "alpha beta gamma delta");
    s.set_selections(vec![Selection::new(0..5), Selection::new(11..16)]);
    let out = s.toggle_marks();
    assert_eq!(out.notice, None);
    assert_eq!(s.active_document().marks(), &[0..5, 11..16]);
    s.set_selections(vec![Selection::new(6..10)]);
    s.replace_selections("b").unwrap();
    assert_eq!(s.buffer().text(), "alpha b gamma delta");
    assert_eq!(s.active_document().marks(), &[0..5, 8..13]);

    s.switch_mode(&ModeSpec::Mark).unwrap();
    s.apply_movement(Movement::First).unwrap();
    assert_eq!(primary(&s), 0..5);
    s.apply_movement(Movement::Next).unwrap();
    assert_eq!(primary(&s), 8..13);
    let out = s.apply_movement(Movement::Next).unwrap();
    assert_eq!(out.notice, Some(Notice::NoMatch));

    s.toggle_marks();
    assert_eq!(s.active_document().marks(), &[0..5]);
}

#[test]
fn marking_a_point_reports_no_match() {
    let mut s = session("t.txt", "alpha");
    let out = s.toggle_marks();
    assert_eq!(out.notice, Some(Notice::NoMatch));
    assert!(s.active_document().marks().is_empty());
}

#[test]
fn naming_agnostic_mode_matches_other_spellings() {
    let mut s = session("t.txt", "fetch_user(); fetchUser(); FetchUser();");
    s.switch_mode(&ModeSpec::NamingAgnostic("fetch user".into()))
        .unwrap();
    assert_eq!(s.mode().kind.name(), "naming");
    s.apply_movement(Movement::First).unwrap();
    assert_eq!(primary(&s), 0..10);
    s.apply_movement(Movement::Next).unwrap();
    assert_eq!(primary(&s), 14..23);
    s.apply_movement(Movement::Next).unwrap();
    assert_eq!(primary(&s), 27..36);
}

#[test]
fn buffers_keep_their_own_cursors() {
    let mut s = session("a.txt", "one two");
    let b = s.open(Buffer::from_str("b.txt", "three").unwrap());
    s.set_selections(vec![Selection::new(4..7)]);
    s.switch_buffer(b);
    assert_eq!(primary(&s), 0..0);
    s.switch_buffer(BufferId(0));
    assert_eq!(primary(&s), 4..7);
}
