use core_lsp::LspError;
use core_selection::ModeError;
use core_text::BufferId;
use thiserror::Error;

/// Non-fatal result of an action, shown to the user as a status message.
/// State is left unchanged whenever one of these is reported, unless noted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Notice {
    #[error("no match")]
    NoMatch,
    #[error("{mode}: movement not supported")]
    Unsupported { mode: String },
    #[error("{mode} unavailable: {reason}")]
    ModeUnavailable { mode: String, reason: String },
    #[error(transparent)]
    InvalidPattern(#[from] ModeError),
    #[error("swap ranges overlap")]
    ConflictingSwap,
    #[error("selections overlap; edit rejected")]
    ConflictingEdit,
    #[error("waiting for language server")]
    Busy,
    #[error(transparent)]
    QueryFailed(#[from] LspError),
    #[error("already at oldest change")]
    NothingToUndo,
    #[error("already at newest change")]
    NothingToRedo,
    #[error("only one cursor")]
    OnlyCursor,
    #[error("quickfix list exhausted")]
    QuickfixExhausted,
    #[error("no buffer {0}")]
    UnknownBuffer(BufferId),
    /// The target file could not be opened; the list position still advanced.
    #[error("cannot open {path}: {reason}")]
    OpenFailed { path: String, reason: String },
}
