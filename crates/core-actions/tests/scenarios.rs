mod common;

use common::{ranges, run, run_script, selected, session};
use pretty_assertions::assert_eq;

#[test]
fn word_short_walks_casing_words() {
    let mut s = session("t.txt", "myOatPepperBanana");
    run(&mut s, "first");
    assert_eq!(selected(&s), "my");
    run(&mut s, "next 3");
    assert_eq!(selected(&s), "Banana");
    let r = run(&mut s, "next");
    assert!(!r.changed);
    assert_eq!(r.status.as_deref(), Some("no match"));
    assert_eq!(selected(&s), "Banana");
}

#[test]
fn line_modes_trim_or_keep_whitespace() {
    let mut s = session("t.txt", "  foo  \nbar\n");
    run(&mut s, "mode line");
    assert_eq!(selected(&s), "foo");
    run(&mut s, "mode line-full");
    assert_eq!(selected(&s), "  foo  \n");
}

#[test]
fn column_miss_on_one_cursor_is_not_global() {
    let mut s = session("t.txt", "hello");
    let r = run_script(
        &mut s,
        "mode column
         select 0 5
         next",
    );
    assert_eq!(r.status, None);
    assert_eq!(ranges(&s), vec![0..1, 5..5]);
}

#[test]
fn extend_then_escape() {
    let mut s = session("t.txt", "myOatPepperBanana");
    run_script(
        &mut s,
        "select 2
         extend
         next",
    );
    let sel = s.cursors().primary().selection.clone();
    assert_eq!((sel.anchor, sel.active), (2, 5));
    run(&mut s, "escape");
    assert_eq!(ranges(&s), vec![5..5]);
}

#[test]
fn swap_script_is_one_undo_step() {
    let mut s = session("t.txt", "one two three");
    let r = run_script(
        &mut s,
        "select 0..3
         swap
         next",
    );
    assert!(r.buffer_changed);
    assert_eq!(s.buffer().text(), "two one three");
    run(&mut s, "undo");
    assert_eq!(s.buffer().text(), "one two three");
    let r = run(&mut s, "undo");
    assert_eq!(r.status.as_deref(), Some("already at oldest change"));
    run(&mut s, "redo");
    assert_eq!(s.buffer().text(), "two one three");
}

#[test]
fn multi_cursor_replace_and_history() {
    let mut s = session("t.txt", "a b c");
    run_script(
        &mut s,
        "first
         next
         select-all",
    );
    assert_eq!(ranges(&s), vec![0..1, 2..3, 4..5]);
    run(&mut s, "replace xy");
    assert_eq!(s.buffer().text(), "xy xy xy");
    run(&mut s, "keep-primary");
    assert_eq!(s.cursors().len(), 1);
    run(&mut s, "back");
    assert_eq!(ranges(&s), vec![0..2, 3..5, 6..8]);
    run(&mut s, "forward");
    assert_eq!(s.cursors().len(), 1);
}

#[test]
fn add_and_remove_cursors() {
    let mut s = session("t.txt", "a b c");
    run_script(
        &mut s,
        "select 0..1
         add next
         add next",
    );
    assert_eq!(ranges(&s), vec![0..1, 2..3, 4..5]);
    assert_eq!(selected(&s), "c");
    run(&mut s, "remove-primary");
    assert_eq!(ranges(&s), vec![0..1, 2..3]);
    run(&mut s, "keep-primary");
    let r = run(&mut s, "remove-primary");
    assert_eq!(r.status.as_deref(), Some("only one cursor"));
}

#[test]
fn invalid_regex_is_reported_and_mode_kept() {
    let mut s = session("t.txt", "abc");
    let r = run(&mut s, "mode regex (oops");
    assert!(r.status.unwrap().starts_with("invalid regex"));
    assert_eq!(s.mode().kind.name(), "word-short");
}

#[test]
fn delete_removes_every_selection() {
    let mut s = session("t.txt", "one two three");
    run_script(
        &mut s,
        "mode search o
         select-all
         delete",
    );
    assert_eq!(s.buffer().text(), "ne tw three");
}

#[test]
fn naming_matches_become_marks() {
    let mut s = session("t.rs", "let oldName = old_name + OLD_NAME;");
    let r = run_script(
        &mut s,
        "mode naming old name
         select-all
         mark",
    );
    assert!(r.changed);
    assert_eq!(r.status, None);
    assert_eq!(s.active_document().marks(), &[4..11, 14..22, 25..33]);
    run_script(
        &mut s,
        "select 0..3
         mode mark
         last",
    );
    assert_eq!(selected(&s), "OLD_NAME");
    run(&mut s, "prev");
    assert_eq!(selected(&s), "old_name");
    let r = run(&mut s, "mode naming _");
    assert_eq!(r.status.as_deref(), Some("empty search pattern"));
    assert_eq!(s.mode().kind.name(), "mark");
}
