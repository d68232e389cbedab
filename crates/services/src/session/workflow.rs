use std::path::Path;
use std::sync::Arc;

use quiz_core::bank::QuestionBank;
use quiz_core::filtering::FilterCounts;
use quiz_core::model::{FilterState, FilterTag, QuestionId, SessionStats, UserId};
use storage::repository::ProgressRepository;

use super::state::SessionState;
use super::view::{AnswerFeedback, MarkedItem, Overview, ProgressView, QuestionView, SyncStatus};
use crate::Clock;
use crate::error::{ActionError, SessionError};

/// One user's quiz session: in-memory state plus write-through persistence.
///
/// Every action that changes persisted data saves before returning. A failed
/// load or save never fails the action; the session keeps working in memory,
/// reports [`SyncStatus::LocalOnly`] and retries on the next save.
pub struct QuizSession {
    state: SessionState,
    progress: Arc<dyn ProgressRepository>,
    user: UserId,
    clock: Clock,
    sync: SyncStatus,
}

impl QuizSession {
    /// Start a session over `state`, restoring `user`'s stored progress if
    /// there is any.
    ///
    /// A failed load starts from empty state. The first save that succeeds
    /// afterwards replaces whatever the store held for `user`.
    pub async fn start(
        mut state: SessionState,
        user: UserId,
        progress: Arc<dyn ProgressRepository>,
        clock: Clock,
    ) -> Self {
        let sync = match progress.load(&user).await {
            Ok(Some(record)) => {
                tracing::info!(user_id = %user, answered = record.history.len(), "resuming stored progress");
                state.hydrate(&record);
                SyncStatus::Synced
            }
            Ok(None) => {
                tracing::info!(user_id = %user, "no stored progress; starting fresh");
                SyncStatus::Synced
            }
            Err(err) => {
                tracing::warn!(
                    user_id = %user,
                    error = %err,
                    "could not load progress; continuing locally, the next successful save overwrites the stored row"
                );
                SyncStatus::LocalOnly {
                    reason: err.to_string(),
                }
            }
        };

        Self {
            state,
            progress,
            user,
            clock,
            sync,
        }
    }

    /// Load the question bank at `path` and start a session over it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Bank` if the bank cannot be read or is invalid.
    pub async fn open(
        path: impl AsRef<Path>,
        user: UserId,
        progress: Arc<dyn ProgressRepository>,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        let bank = QuestionBank::load(path)?;
        Ok(Self::start(SessionState::new(bank), user, progress, clock).await)
    }

    async fn persist(&mut self) {
        let record = self.state.snapshot(self.clock.now());
        match self.progress.save(&self.user, &record).await {
            Ok(()) => {
                if self.sync.is_local_only() {
                    tracing::info!(user_id = %self.user, "progress store reachable again");
                }
                self.sync = SyncStatus::Synced;
            }
            Err(err) => {
                tracing::warn!(user_id = %self.user, error = %err, "saving progress failed; keeping changes in memory");
                self.sync = SyncStatus::LocalOnly {
                    reason: err.to_string(),
                };
            }
        }
    }

    // ─── actions ───

    /// Grade the selected display positions and save.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` if the answer is rejected; nothing is saved then.
    pub async fn submit_answer(
        &mut self,
        positions: impl IntoIterator<Item = usize>,
    ) -> Result<AnswerFeedback, ActionError> {
        let feedback = self.state.submit(positions)?;
        self.persist().await;
        Ok(feedback)
    }

    /// Clear the shown answer for another attempt. Not saved: no stored field
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` on an empty view or an unanswered question.
    pub fn retry(&mut self) -> Result<(), ActionError> {
        self.state.retry()
    }

    /// Returns false (and saves nothing) on an empty view.
    pub async fn next(&mut self) -> bool {
        let moved = self.state.next();
        if moved {
            self.persist().await;
        }
        moved
    }

    /// Returns false (and saves nothing) on an empty view.
    pub async fn prev(&mut self) -> bool {
        let moved = self.state.prev();
        if moved {
            self.persist().await;
        }
        moved
    }

    /// Jump to a zero-based bank index. See [`SessionState::jump_to`].
    pub async fn jump_to(&mut self, bank_index: usize) -> QuestionId {
        let id = self.state.jump_to(bank_index);
        self.persist().await;
        id
    }

    /// # Errors
    ///
    /// Returns `ActionError::NoQuestion` on an empty view.
    pub async fn toggle_mark(&mut self) -> Result<bool, ActionError> {
        let marked = self.state.toggle_mark()?;
        self.persist().await;
        Ok(marked)
    }

    /// Apply a new tag selection, normalized like [`FilterState::new`].
    pub async fn set_filters(&mut self, tags: impl IntoIterator<Item = FilterTag>) -> bool {
        let changed = self.state.set_filters(FilterState::new(tags));
        if changed {
            self.persist().await;
        }
        changed
    }

    pub async fn reset_filters(&mut self) -> bool {
        let changed = self.state.reset_filters();
        if changed {
            self.persist().await;
        }
        changed
    }

    pub async fn toggle_bank_shuffle(&mut self) -> bool {
        let shuffled = self.state.toggle_bank_shuffle();
        self.persist().await;
        shuffled
    }

    pub async fn clear_history(&mut self) {
        self.state.clear_history();
        self.persist().await;
    }

    pub async fn clear_marks(&mut self) {
        self.state.clear_marks();
        self.persist().await;
    }

    // ─── reads ───

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn sync_status(&self) -> &SyncStatus {
        &self.sync
    }

    #[must_use]
    pub fn current_question(&self) -> Option<QuestionView> {
        self.state.current_question()
    }

    #[must_use]
    pub fn progress(&self) -> Option<ProgressView> {
        self.state.progress()
    }

    #[must_use]
    pub fn is_view_empty(&self) -> bool {
        self.state.is_view_empty()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.state.stats()
    }

    #[must_use]
    pub fn filters(&self) -> &FilterState {
        self.state.filters()
    }

    #[must_use]
    pub fn filter_counts(&self) -> FilterCounts {
        self.state.filter_counts()
    }

    #[must_use]
    pub fn overview(&self) -> Overview {
        self.state.overview()
    }

    #[must_use]
    pub fn marked_list(&self) -> Vec<MarkedItem> {
        self.state.marked_list()
    }

    #[must_use]
    pub fn is_bank_shuffled(&self) -> bool {
        self.state.is_bank_shuffled()
    }
}
