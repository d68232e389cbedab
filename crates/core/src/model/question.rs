use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question has no options")]
    NoOptions,

    #[error("question has no correct option")]
    NoCorrectOption,
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionStatus {
    Correct,
    Incorrect,
}

/// One answer choice, in its original bank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    pub status: OptionStatus,
}

impl QuizOption {
    #[must_use]
    pub fn correct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: OptionStatus::Correct,
        }
    }

    #[must_use]
    pub fn incorrect(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: OptionStatus::Incorrect,
        }
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.status == OptionStatus::Correct
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// An immutable multiple-choice question owned by the bank.
///
/// Always carries at least one correct option; construction goes through
/// [`Question::new`], which enforces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<QuizOption>,
    explanation: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are no options, or
    /// none of the options is correct.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<QuizOption>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if !options.iter().any(QuizOption::is_correct) {
            return Err(QuestionError::NoCorrectOption);
        }

        let explanation = explanation.filter(|e| !e.trim().is_empty());

        Ok(Self {
            id,
            text,
            options,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Original indices of the correct options, ascending.
    pub fn correct_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, opt)| opt.is_correct())
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|opt| opt.is_correct()).count()
    }

    /// Questions with several correct options accept several selections.
    #[must_use]
    pub fn is_multi_select(&self) -> bool {
        self.correct_count() > 1
    }

    /// Question text cut to `max_chars` characters, with `...` when cut.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() > max_chars {
            let head: String = self.text.chars().take(max_chars).collect();
            format!("{head}...")
        } else {
            self.text.clone()
        }
    }
}
