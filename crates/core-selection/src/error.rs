use core_syntax::SyntaxError;
use core_text::EditError;
use thiserror::Error;

/// Failure to build a selection mode from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("empty search pattern")]
    EmptyPattern,
    #[error("invalid regex: {0}")]
    InvalidRegex(String),
}

impl From<regex::Error> for ModeError {
    fn from(e: regex::Error) -> Self {
        ModeError::InvalidRegex(e.to_string())
    }
}

/// Fatal engine failure. Everything recoverable is reported as a status instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("collaborator contract violated: {0}")]
    ContractViolation(String),
}

impl From<SyntaxError> for EngineError {
    fn from(e: SyntaxError) -> Self {
        EngineError::ContractViolation(e.to_string())
    }
}

impl From<EditError> for EngineError {
    fn from(e: EditError) -> Self {
        EngineError::ContractViolation(e.to_string())
    }
}
