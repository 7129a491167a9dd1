//! Content edits applied to every cursor as one atomic change.

use super::DispatchResult;
use core_selection::EngineError;
use core_state::Session;

pub(crate) fn handle_replace(text: &str, session: &mut Session) -> Result<DispatchResult, EngineError> {
    let cursors = session.cursors().len();
    let result = DispatchResult::from_outcome(session.replace_selections(text)?);
    tracing::trace!(
        target: "actions.dispatch",
        op = "replace",
        cursors,
        inserted_bytes = text.len(),
        applied = result.buffer_changed,
        "edit"
    );
    Ok(result)
}

pub(crate) fn handle_delete(session: &mut Session) -> Result<DispatchResult, EngineError> {
    let cursors = session.cursors().len();
    let result = DispatchResult::from_outcome(session.delete_selections()?);
    tracing::trace!(target: "actions.dispatch", op = "delete", cursors, applied = result.buffer_changed, "edit");
    Ok(result)
}
