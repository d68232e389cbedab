#![forbid(unsafe_code)]

pub mod error;
pub mod session;

pub use quiz_core::Clock;

pub use error::{ActionError, SessionError};
pub use session::{
    AnswerFeedback, MarkedItem, Overview, ProgressView, QuestionView, QuizSession, SessionState,
    SyncStatus,
};
