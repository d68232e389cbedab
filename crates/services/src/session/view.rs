use quiz_core::model::{QuestionId, SessionStats};

/// Presentation-agnostic snapshot of the question under the cursor.
///
/// Options are listed in display order. `feedback` is present once the
/// question has been answered in the current epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<DisplayOption>,
    pub correct_count: usize,
    pub multi_select: bool,
    pub marked: bool,
    /// Changes whenever the option order is redrawn.
    pub epoch: u64,
    pub feedback: Option<AnswerFeedback>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOption {
    pub position: usize,
    pub text: String,
}

/// Result of a submission, in the display order the user answered in.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub question: QuestionId,
    pub correct: bool,
    pub options: Vec<OptionFeedback>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionFeedback {
    pub position: usize,
    pub text: String,
    pub is_correct: bool,
    pub selected: bool,
}

/// Where the cursor sits inside the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressView {
    pub question: QuestionId,
    /// Zero-based position inside the view.
    pub position: usize,
    pub view_len: usize,
}

/// Whole-bank and session aggregates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overview {
    pub bank_size: usize,
    pub answered: usize,
    pub answered_correct: usize,
    pub marked: usize,
    pub session: SessionStats,
}

impl Overview {
    /// Share of answered questions whose latest attempt was correct.
    #[must_use]
    pub fn overall_accuracy(&self) -> Option<f64> {
        ratio(self.answered_correct, self.answered)
    }

    #[must_use]
    pub fn session_accuracy(&self) -> Option<f64> {
        self.session.accuracy()
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

/// Entry of the marked-question list, sorted by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedItem {
    pub id: QuestionId,
    pub preview: String,
}

/// Outcome of the last load or save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Synced,
    /// The store could not be reached. Progress lives in memory only until a
    /// later save succeeds.
    LocalOnly { reason: String },
}

impl SyncStatus {
    #[must_use]
    pub fn is_local_only(&self) -> bool {
        matches!(self, Self::LocalOnly { .. })
    }
}
