#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::{CommandParser, DispatchResult, ParsedCommand, dispatch};
use core_state::{Session, Settings};
use core_text::Buffer;
use std::ops::Range;

/// Route engine events to the test harness; `RUST_LOG=actions.dispatch=trace` shows them.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn session(name: &str, text: &str) -> Session {
    init_logging();
    Session::new(Buffer::from_str(name, text).unwrap(), Settings::default())
}

/// Parse and dispatch one script line, panicking on anything but an action.
pub fn run(session: &mut Session, line: &str) -> DispatchResult {
    match CommandParser::parse(line) {
        ParsedCommand::Action(action) => dispatch(action, session).unwrap(),
        other => panic!("{line:?} is not an action: {other:?}"),
    }
}

/// Run every non-empty line, returning the result of the last one.
pub fn run_script(session: &mut Session, script: &str) -> DispatchResult {
    let mut last = DispatchResult::clean();
    for line in script.lines() {
        if CommandParser::parse(line) == ParsedCommand::Empty {
            continue;
        }
        last = run(session, line);
    }
    last
}

pub fn ranges(session: &Session) -> Vec<Range<usize>> {
    session.cursors().iter().map(|c| c.selection.range()).collect()
}

pub fn selected(session: &Session) -> String {
    let r = session.cursors().primary().selection.range();
    session.buffer().slice_bytes(r.start, r.end)
}
