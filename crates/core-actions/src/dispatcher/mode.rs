//! Mode transitions and the extend / swap toggles.

use super::DispatchResult;
use core_selection::{EngineError, ModeSpec};
use core_state::Session;

pub(crate) fn handle_switch_mode(
    spec: &ModeSpec,
    session: &mut Session,
) -> Result<DispatchResult, EngineError> {
    let before = session.mode().kind.name();
    let mut result = DispatchResult::from_outcome(session.switch_mode(spec)?);
    let after = session.mode().kind.name();
    tracing::trace!(target: "actions.dispatch", op = "switch_mode", from = before, to = after, "mode_change");
    // The status line shows the mode, so a switch is visible even without movement.
    if result.status.is_none() {
        result.changed = true;
    }
    Ok(result)
}

pub(crate) fn handle_toggle_extend(session: &mut Session) -> DispatchResult {
    session.toggle_extend();
    DispatchResult::changed()
}

pub(crate) fn handle_toggle_swap(session: &mut Session) -> DispatchResult {
    session.toggle_swap();
    DispatchResult::changed()
}

pub(crate) fn handle_escape(session: &mut Session) -> DispatchResult {
    let mut result = DispatchResult::from_outcome(session.escape());
    result.changed = true;
    result
}
