//! Movement and cursor-set handlers.
//!
//! All of these resolve through the current selection mode, so they share the
//! session's busy rule: while an LSP query is in flight for the active buffer
//! the session answers with a status and leaves cursors alone.

use super::DispatchResult;
use core_selection::{EngineError, Movement};
use core_state::Session;

pub(crate) fn handle_move(
    movement: Movement,
    session: &mut Session,
) -> Result<DispatchResult, EngineError> {
    let outcome = session.apply_movement(movement)?;
    tracing::trace!(target: "actions.dispatch", op = "move", movement = movement.name(), "movement");
    Ok(DispatchResult::from_outcome(outcome))
}

pub(crate) fn handle_add_cursor(
    movement: Movement,
    session: &mut Session,
) -> Result<DispatchResult, EngineError> {
    let before = session.cursors().len();
    let result = DispatchResult::from_outcome(session.add_cursor(movement)?);
    tracing::trace!(
        target: "actions.dispatch",
        op = "add_cursor",
        before,
        after = session.cursors().len(),
        "add_cursor"
    );
    Ok(result)
}

pub(crate) fn handle_select_all(session: &mut Session) -> Result<DispatchResult, EngineError> {
    let result = DispatchResult::from_outcome(session.select_all()?);
    tracing::trace!(target: "actions.dispatch", op = "select_all", cursors = session.cursors().len(), "select_all");
    Ok(result)
}

pub(crate) fn handle_toggle_marks(session: &mut Session) -> DispatchResult {
    let mut result = DispatchResult::from_outcome(session.toggle_marks());
    tracing::trace!(
        target: "actions.dispatch",
        op = "toggle_marks",
        marks = session.active_document().marks().len(),
        "toggle_marks"
    );
    // Marks are drawn, so toggling one is visible without any cursor moving.
    if result.status.is_none() {
        result.changed = true;
    }
    result
}

pub(crate) fn handle_quickfix(
    forward: bool,
    session: &mut Session,
) -> Result<DispatchResult, EngineError> {
    let outcome = if forward {
        session.quickfix_next()?
    } else {
        session.quickfix_previous()?
    };
    let mut result = DispatchResult::from_outcome(outcome);
    // Jumping may land in another buffer even when the extent is equal.
    if result.status.is_none() {
        result.changed = true;
    }
    Ok(result)
}
