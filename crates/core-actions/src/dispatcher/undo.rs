//! Undo / Redo dispatch.
//!
//! Delegates to the snapshot engine owned by the active document. A restore
//! is a new buffer version, so both directions report a buffer change.

use super::DispatchResult;
use core_state::Session;

pub(crate) fn handle_undo(session: &mut Session) -> DispatchResult {
    let before = session.buffer().version();
    let result = DispatchResult::from_outcome(session.undo());
    let after = session.buffer().version();
    tracing::trace!(target: "actions.dispatch", op = "undo", buffer_changed = (before != after), "undo");
    result
}

pub(crate) fn handle_redo(session: &mut Session) -> DispatchResult {
    let before = session.buffer().version();
    let result = DispatchResult::from_outcome(session.redo());
    let after = session.buffer().version();
    tracing::trace!(target: "actions.dispatch", op = "redo", buffer_changed = (before != after), "redo");
    result
}
