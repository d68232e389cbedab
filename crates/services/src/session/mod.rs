mod state;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{ActionError, SessionError};
pub use state::{PREVIEW_CHARS, SessionState};
pub use view::{
    AnswerFeedback, DisplayOption, MarkedItem, OptionFeedback, Overview, ProgressView,
    QuestionView, SyncStatus,
};
pub use workflow::QuizSession;
