//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::bank::BankError;
use quiz_core::evaluator::SelectionError;

/// Errors that abort session start.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Bank(#[from] BankError),
}

/// A user action that was rejected. State is left untouched and nothing is
/// saved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionError {
    #[error("select at least one option before submitting")]
    EmptySelection,

    #[error("option {position} does not exist; the question has {option_count} options")]
    SelectionOutOfRange { position: usize, option_count: usize },

    #[error("this question takes a single answer, got {selected}")]
    TooManySelections { selected: usize },

    #[error("the current question is already answered")]
    AlreadyAnswered,

    #[error("the current question has not been answered yet")]
    NotAnswered,

    #[error("no question matches the current filters")]
    NoQuestion,
}

impl From<SelectionError> for ActionError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::OutOfRange {
                position,
                option_count,
            } => Self::SelectionOutOfRange {
                position,
                option_count,
            },
            SelectionError::TooMany { selected } => Self::TooManySelections { selected },
            _ => Self::EmptySelection,
        }
    }
}
