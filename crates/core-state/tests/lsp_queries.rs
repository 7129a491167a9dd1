use std::time::{Duration, Instant};

use core_lsp::{
    GotoKind, Location, LspError, QueryFamily, ScriptedLspClient, Severity, SeverityRange,
};
use core_selection::{ModeSpec, Movement, Selection};
use core_state::{Notice, Session, Settings};
use core_text::{Buffer, BufferId, Position};
use pretty_assertions::assert_eq;

const SRC: &str = "fn a() {}\nfn b() {}\n";

fn diagnostics() -> Vec<Location> {
    vec![
        Location::new("t.rs", Position::new(1, 3), Position::new(1, 4))
            .diagnostic(Severity::Warning, "unused b"),
        Location::new("t.rs", Position::new(0, 3), Position::new(0, 4))
            .diagnostic(Severity::Error, "bad a"),
    ]
}

fn setup(manual: bool) -> (Session, ScriptedLspClient) {
    let client = ScriptedLspClient::new();
    client.answer(QueryFamily::Diagnostics, diagnostics());
    client.set_manual(manual);
    let mut s = Session::new(Buffer::from_str("t.rs", SRC).unwrap(), Settings::default());
    s.set_lsp_client(Box::new(client.clone()));
    (s, client)
}

fn all_diagnostics() -> ModeSpec {
    ModeSpec::Diagnostics(SeverityRange::all())
}

fn primary(s: &Session) -> std::ops::Range<usize> {
    s.cursors().primary().selection.range()
}

#[test]
fn immediate_answer_snaps_and_navigates_from_cache() {
    let (mut s, client) = setup(false);
    let out = s.switch_mode(&all_diagnostics()).unwrap();
    assert_eq!(out.pending, None);
    assert_eq!(primary(&s), 3..4);
    let info = s.cursors().primary().selection.info.clone().unwrap();
    assert_eq!(info.message.as_deref(), Some("bad a"));
    s.apply_movement(Movement::Next).unwrap();
    assert_eq!(primary(&s), 13..14);
    // Served from the cache: one request only.
    assert_eq!(client.requests().len(), 1);
}

#[test]
fn severity_filter_applies() {
    let (mut s, _client) = setup(false);
    s.switch_mode(&ModeSpec::Diagnostics(SeverityRange::only(Severity::Warning)))
        .unwrap();
    assert_eq!(primary(&s), 13..14);
    let out = s.apply_movement(Movement::Previous).unwrap();
    assert_eq!(out.notice, Some(Notice::NoMatch));
}

#[test]
fn pending_query_blocks_the_buffer_until_answered() {
    let (mut s, client) = setup(true);
    let out = s.switch_mode(&all_diagnostics()).unwrap();
    let token = out.pending.expect("query in flight");
    assert!(s.has_pending(BufferId(0)));
    assert_eq!(s.pending_tokens(), vec![token]);

    let busy = s.apply_movement(Movement::Next).unwrap();
    assert_eq!(busy.notice, Some(Notice::Busy));
    assert_eq!(primary(&s), 0..0);

    assert!(client.respond_next());
    let outcomes = s.poll_queries(Instant::now()).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].selection_changed);
    assert!(!s.has_pending(BufferId(0)));
    assert_eq!(primary(&s), 3..4);
}

#[test]
fn stale_answer_is_discarded_and_reissued() {
    let (mut s, client) = setup(true);
    let first = s.switch_mode(&all_diagnostics()).unwrap().pending.unwrap();
    // New cursor identities make the in-flight answer stale.
    s.set_selections(vec![Selection::point(12)]);
    let out = s.deliver(first, Ok(diagnostics())).unwrap();
    let second = out.pending.expect("re-issued");
    assert!(second > first);
    assert_eq!(primary(&s), 12..12);
    assert_eq!(client.requests().len(), 2);

    // The first request's receiver went away with the stale query.
    assert!(!client.respond_next());
    assert!(client.respond_next());
    s.poll_queries(Instant::now()).unwrap();
    assert_eq!(primary(&s), 13..14);
}

#[test]
fn stale_failure_is_reissued_not_reported() {
    let (mut s, client) = setup(true);
    s.set_selections(vec![Selection::point(0), Selection::point(12)]);
    let first = s.switch_mode(&all_diagnostics()).unwrap().pending.unwrap();
    s.keep_primary_only();
    let out = s.deliver(first, Err(LspError::Timeout)).unwrap();
    assert_eq!(out.notice, None);
    let second = out.pending.expect("re-issued");
    assert!(second > first);
    assert_eq!(s.pending_tokens(), vec![second]);
    assert!(s.status().is_none());

    assert!(!client.respond_next());
    assert!(client.respond_next());
    s.poll_queries(Instant::now()).unwrap();
    assert!(!s.has_pending(BufferId(0)));
    assert_eq!(primary(&s), 3..4);
}

#[test]
fn mode_switch_and_edits_cancel_queries() {
    let (mut s, client) = setup(true);
    s.switch_mode(&all_diagnostics()).unwrap();
    s.switch_mode(&ModeSpec::WordShort).unwrap();
    assert!(!s.has_pending(BufferId(0)));
    // The receiver was dropped with the query.
    assert!(!client.respond_next());

    s.switch_mode(&all_diagnostics()).unwrap();
    assert!(s.has_pending(BufferId(0)));
    s.replace_selections("x").unwrap();
    assert!(!s.has_pending(BufferId(0)));
}

#[test]
fn unanswered_query_times_out() {
    let (mut s, _client) = setup(true);
    s.switch_mode(&all_diagnostics()).unwrap();
    let later = Instant::now() + Duration::from_secs(5);
    let outcomes = s.poll_queries(later).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].notice, Some(Notice::QueryFailed(LspError::Timeout)));
    assert!(!s.has_pending(BufferId(0)));
    assert!(s.status().is_some());
}

#[test]
fn server_failure_is_reported() {
    let (mut s, client) = setup(false);
    client.fail(
        QueryFamily::Diagnostics,
        LspError::Unavailable("crashed".into()),
    );
    let out = s.switch_mode(&all_diagnostics()).unwrap();
    assert!(matches!(out.notice, Some(Notice::QueryFailed(_))));
    assert_eq!(primary(&s), 0..0);
}

#[test]
fn unsupported_query_keeps_previous_mode() {
    let (mut s, _client) = setup(false);
    let out = s
        .switch_mode(&ModeSpec::Goto(GotoKind::Implementations))
        .unwrap();
    assert!(matches!(out.notice, Some(Notice::ModeUnavailable { .. })));
    assert_eq!(s.mode().kind.name(), "word-short");
}

#[test]
fn no_client_means_unavailable() {
    let mut s = Session::new(Buffer::from_str("t.rs", SRC).unwrap(), Settings::default());
    let out = s.switch_mode(&all_diagnostics()).unwrap();
    assert!(matches!(out.notice, Some(Notice::ModeUnavailable { .. })));
}

#[test]
fn goto_into_another_file_follows_quickfix() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("lib.rs");
    std::fs::write(&target, "fn target() {}\n").unwrap();
    let client = ScriptedLspClient::new();
    client.answer(
        QueryFamily::Goto(GotoKind::Definitions),
        vec![Location::new(&target, Position::new(0, 3), Position::new(0, 9))],
    );
    let mut s = Session::new(Buffer::from_str("t.rs", SRC).unwrap(), Settings::default());
    s.set_lsp_client(Box::new(client));
    s.switch_mode(&ModeSpec::Goto(GotoKind::Definitions)).unwrap();
    assert_eq!(s.quickfix().len(), 1);
    assert_eq!(s.active(), BufferId(1));
    assert_eq!(s.buffer().slice_bytes(3, 9), "target");
    assert_eq!(primary(&s), 3..9);
}
