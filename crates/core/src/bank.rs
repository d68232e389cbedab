//! Question bank loading.
//!
//! The bank is a JSON array of question records. Question ids are positions
//! in that array, so the file order is the canonical bank order.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::{Question, QuestionError, QuestionId, QuizOption};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed question bank: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question bank is empty")]
    Empty,

    #[error("question at position {index} carries id {id}")]
    MisplacedQuestion { index: usize, id: QuestionId },

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<QuizOption>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Ordered, read-only collection of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from already-validated questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` for an empty list, or
    /// `BankError::MisplacedQuestion` when a question id does not match its
    /// position.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        for (index, q) in questions.iter().enumerate() {
            if q.id().index() != index {
                return Err(BankError::MisplacedQuestion { index, id: q.id() });
            }
        }
        Ok(Self { questions })
    }

    /// Parse a bank from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the JSON is malformed, the bank is empty, or any
    /// question fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, BankError> {
        let raw: Vec<RawQuestion> = serde_json::from_str(json)?;
        let questions = raw
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                Question::new(QuestionId::new(index), r.question, r.options, r.explanation)
                    .map_err(|source| BankError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    /// Read and parse a bank file.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Io` if the file cannot be read, otherwise the same
    /// errors as [`QuestionBank::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        id.index() < self.questions.len()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Bank-order ids.
    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + use<> {
        (0..self.questions.len()).map(QuestionId::new)
    }
}
