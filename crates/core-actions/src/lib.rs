//! Actions consumed by the selection engine and the dispatcher applying them
//! to a [`core_state::Session`].
//!
//! Key handling lives outside this crate. Front ends (the headless script
//! driver, tests, a future keymap) build [`Action`] values and hand them to
//! [`dispatcher::dispatch`].

use core_selection::{ModeSpec, Movement, Selection};
use core_text::BufferId;

pub mod dispatcher;

pub use dispatcher::command_parser::{CommandParser, ParsedCommand};
pub use dispatcher::{DispatchResult, dispatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move(Movement),
    /// Repeat a movement, stopping early at the first miss or pending query.
    MoveCount {
        movement: Movement,
        count: usize,
    },
    SwitchMode(ModeSpec),
    ToggleExtend,
    ToggleSwap,
    Escape,
    AddCursor(Movement),
    SelectAll,
    KeepPrimaryOnly,
    RemovePrimary,
    /// Mark each selection, or unmark it when already marked.
    ToggleMarks,
    /// Replace the cursor set outright (script `select`, mouse, restore).
    Select(Vec<Selection>),
    Replace(String),
    Delete,
    Undo,
    Redo,
    QuickfixNext,
    QuickfixPrevious,
    SwitchBuffer(BufferId),
}

impl Action {
    /// Stable label for logs. Never includes buffer content.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Move(_) => "move",
            Action::MoveCount { .. } => "move_count",
            Action::SwitchMode(_) => "switch_mode",
            Action::ToggleExtend => "toggle_extend",
            Action::ToggleSwap => "toggle_swap",
            Action::Escape => "escape",
            Action::AddCursor(_) => "add_cursor",
            Action::SelectAll => "select_all",
            Action::KeepPrimaryOnly => "keep_primary_only",
            Action::RemovePrimary => "remove_primary",
            Action::ToggleMarks => "toggle_marks",
            Action::Select(_) => "select",
            Action::Replace(_) => "replace",
            Action::Delete => "delete",
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::QuickfixNext => "quickfix_next",
            Action::QuickfixPrevious => "quickfix_previous",
            Action::SwitchBuffer(_) => "switch_buffer",
        }
    }
}
