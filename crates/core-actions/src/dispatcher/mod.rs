//! Dispatcher applying [`Action`] to a [`Session`].
//!
//! The work is split by concern:
//! * `motion`  - movements, cursor-set operations, marks and quickfix navigation
//! * `mode`    - mode switches and the extend / swap / escape toggles
//! * `edit`    - replace and delete across every cursor
//! * `undo`    - undo / redo
//!
//! Every handler funnels the session's [`Outcome`] through
//! [`DispatchResult::from_outcome`] so front ends see one result shape. Only
//! contract violations come back as `Err`; everything else is a status.

use crate::Action;
use core_state::{Outcome, QueryToken, Session};
use core_selection::EngineError;

pub mod command_parser;
mod edit;
mod mode;
mod motion;
mod undo;

/// Result of dispatching a single `Action`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchResult {
    /// Selections or content changed and anything showing them is stale.
    pub changed: bool,
    pub buffer_changed: bool,
    /// The final result arrives with this LSP query.
    pub pending: Option<QueryToken>,
    /// Transient status text for the action (no match, busy, conflicts...).
    pub status: Option<String>,
}

impl DispatchResult {
    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }

    pub fn clean() -> Self {
        Self::default()
    }

    pub fn from_outcome(outcome: Outcome) -> Self {
        Self {
            changed: outcome.selection_changed || outcome.buffer_changed,
            buffer_changed: outcome.buffer_changed,
            pending: outcome.pending,
            status: outcome.notice.map(|n| n.to_string()),
        }
    }

    /// Fold a later result into this one. The latest status and pending token win.
    pub(crate) fn absorb(&mut self, later: DispatchResult) {
        self.changed |= later.changed;
        self.buffer_changed |= later.buffer_changed;
        if later.pending.is_some() {
            self.pending = later.pending;
        }
        if later.status.is_some() {
            self.status = later.status;
        }
    }
}

/// Apply an action to the session.
pub fn dispatch(action: Action, session: &mut Session) -> Result<DispatchResult, EngineError> {
    let name = action.name();
    let result = match action {
        Action::Move(movement) => motion::handle_move(movement, session)?,
        Action::MoveCount { movement, count } => {
            let mut result = DispatchResult::clean();
            for _ in 0..count {
                let r = motion::handle_move(movement, session)?;
                let stop = r.status.is_some() || r.pending.is_some();
                result.absorb(r);
                if stop {
                    break;
                }
            }
            result
        }
        Action::SwitchMode(spec) => mode::handle_switch_mode(&spec, session)?,
        Action::ToggleExtend => mode::handle_toggle_extend(session),
        Action::ToggleSwap => mode::handle_toggle_swap(session),
        Action::Escape => mode::handle_escape(session),
        Action::AddCursor(movement) => motion::handle_add_cursor(movement, session)?,
        Action::SelectAll => motion::handle_select_all(session)?,
        Action::KeepPrimaryOnly => {
            DispatchResult::from_outcome(session.keep_primary_only())
        }
        Action::RemovePrimary => DispatchResult::from_outcome(session.remove_primary()),
        Action::ToggleMarks => motion::handle_toggle_marks(session),
        Action::Select(selections) => {
            DispatchResult::from_outcome(session.set_selections(selections))
        }
        Action::Replace(text) => edit::handle_replace(&text, session)?,
        Action::Delete => edit::handle_delete(session)?,
        Action::Undo => undo::handle_undo(session),
        Action::Redo => undo::handle_redo(session),
        Action::QuickfixNext => motion::handle_quickfix(true, session)?,
        Action::QuickfixPrevious => motion::handle_quickfix(false, session)?,
        Action::SwitchBuffer(id) => DispatchResult::from_outcome(session.switch_buffer(id)),
    };
    tracing::trace!(
        target: "actions.dispatch",
        action = name,
        changed = result.changed,
        buffer_changed = result.buffer_changed,
        pending = result.pending.is_some(),
        status = result.status.as_deref(),
        "dispatched"
    );
    Ok(result)
}
