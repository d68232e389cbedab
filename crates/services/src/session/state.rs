use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quiz_core::bank::QuestionBank;
use quiz_core::evaluator::{self, Selection};
use quiz_core::filtering::{self, BaseOrder, FilterCounts};
use quiz_core::model::{FilterState, History, MarkSet, Question, QuestionId, SessionStats};
use quiz_core::navigation::NavigationCursor;
use quiz_core::shuffle::ShuffleEngine;
use storage::PersistedRecord;

use super::view::{
    AnswerFeedback, DisplayOption, MarkedItem, OptionFeedback, Overview, ProgressView,
    QuestionView,
};
use crate::error::ActionError;

/// Characters of question text shown in the marked list.
pub const PREVIEW_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AnswerPhase {
    Unanswered,
    Answered { selection: Selection, correct: bool },
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Everything one quiz session holds in memory.
///
/// Actions are synchronous and never touch storage; `QuizSession` decides
/// when to persist. After every action the cursor is clamped to the view,
/// and whenever the question under the cursor changes a new shuffle epoch
/// starts and any shown answer is discarded.
pub struct SessionState {
    bank: QuestionBank,
    history: History,
    marks: MarkSet,
    filters: FilterState,
    base: BaseOrder,
    cursor: NavigationCursor,
    shuffle: ShuffleEngine,
    phase: AnswerPhase,
    shown: Option<QuestionId>,
    rng: StdRng,
}

impl SessionState {
    #[must_use]
    pub fn new(bank: QuestionBank) -> Self {
        Self::from_rng(bank, StdRng::from_os_rng())
    }

    /// Deterministic session: option orders and bank shuffles depend only on
    /// `seed` and the sequence of actions.
    #[must_use]
    pub fn with_seed(bank: QuestionBank, seed: u64) -> Self {
        Self::from_rng(bank, StdRng::seed_from_u64(seed))
    }

    fn from_rng(bank: QuestionBank, mut rng: StdRng) -> Self {
        let shuffle = ShuffleEngine::with_seed(rng.random());
        let mut state = Self {
            bank,
            history: History::new(),
            marks: MarkSet::new(),
            filters: FilterState::all(),
            base: BaseOrder::bank_order(),
            cursor: NavigationCursor::new(),
            shuffle,
            phase: AnswerPhase::Unanswered,
            shown: None,
            rng,
        };
        state.settle();
        state
    }

    // ─── reads ───

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.history.stats()
    }

    #[must_use]
    pub fn is_bank_shuffled(&self) -> bool {
        self.base.is_shuffled()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.shuffle.epoch()
    }

    /// Question ids visible under the current filters, in base order.
    #[must_use]
    pub fn view(&self) -> Vec<QuestionId> {
        filtering::filtered_indices(
            &self.base,
            self.bank.len(),
            &self.filters,
            &self.history,
            &self.marks,
        )
    }

    #[must_use]
    pub fn is_view_empty(&self) -> bool {
        self.view().is_empty()
    }

    #[must_use]
    pub fn current_id(&self) -> Option<QuestionId> {
        let view = self.view();
        self.cursor.clamped(view.len()).map(|p| view[p])
    }

    #[must_use]
    pub fn progress(&self) -> Option<ProgressView> {
        let view = self.view();
        let position = self.cursor.clamped(view.len())?;
        Some(ProgressView {
            question: view[position],
            position,
            view_len: view.len(),
        })
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self.phase, AnswerPhase::Answered { .. })
    }

    #[must_use]
    pub fn is_current_marked(&self) -> bool {
        self.current_id().is_some_and(|id| self.marks.contains(id))
    }

    /// The question under the cursor with its options in display order, or
    /// `None` when the view is empty.
    #[must_use]
    pub fn current_question(&self) -> Option<QuestionView> {
        let id = self.current_id()?;
        let question = self.bank.get(id)?;
        let order = self.shuffle.peek_order(question);

        let options = order
            .iter()
            .enumerate()
            .map(|(position, &original)| DisplayOption {
                position,
                text: question.options()[original].text.clone(),
            })
            .collect();

        let feedback = match &self.phase {
            AnswerPhase::Answered { selection, correct } => {
                Some(build_feedback(question, &order, selection, *correct))
            }
            AnswerPhase::Unanswered => None,
        };

        Some(QuestionView {
            id,
            text: question.text().to_owned(),
            options,
            correct_count: question.correct_count(),
            multi_select: question.is_multi_select(),
            marked: self.marks.contains(id),
            epoch: self.shuffle.epoch(),
            feedback,
        })
    }

    #[must_use]
    pub fn filter_counts(&self) -> FilterCounts {
        FilterCounts::compute(self.bank.len(), &self.history, &self.marks)
    }

    #[must_use]
    pub fn overview(&self) -> Overview {
        Overview {
            bank_size: self.bank.len(),
            answered: self.history.answered_count(),
            answered_correct: self.history.answered_correct_count(),
            marked: self.marks.len(),
            session: self.history.stats(),
        }
    }

    /// Marked questions in id order with shortened text.
    #[must_use]
    pub fn marked_list(&self) -> Vec<MarkedItem> {
        self.marks
            .iter()
            .filter_map(|id| {
                self.bank.get(id).map(|q| MarkedItem {
                    id,
                    preview: q.preview(PREVIEW_CHARS),
                })
            })
            .collect()
    }

    // ─── actions ───

    /// Grade `positions` (display positions) against the current question and
    /// record the outcome.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` when the view is empty, the question was already
    /// answered in this epoch, or the selection is invalid. Nothing changes
    /// on error.
    pub fn submit(
        &mut self,
        positions: impl IntoIterator<Item = usize>,
    ) -> Result<AnswerFeedback, ActionError> {
        let id = self.current_id().ok_or(ActionError::NoQuestion)?;
        if self.is_answered() {
            return Err(ActionError::AlreadyAnswered);
        }
        let question = self.bank.get(id).ok_or(ActionError::NoQuestion)?;
        let selection = Selection::new(question, positions)?;
        let order = self.shuffle.option_order(question).to_vec();

        let correct = evaluator::is_correct(question, &selection, &order);
        let feedback = build_feedback(question, &order, &selection, correct);

        let entry = self.history.record_answer(id, correct);
        tracing::debug!(question = %id, correct, attempts = entry.attempts, "answer recorded");
        self.phase = AnswerPhase::Answered { selection, correct };

        // Under an `unanswered` or `incorrect` filter the question may just
        // have left the view.
        self.settle();
        Ok(feedback)
    }

    /// Drop the shown answer and redraw the option order for another try.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::NoQuestion` on an empty view and
    /// `ActionError::NotAnswered` if there is nothing to retry.
    pub fn retry(&mut self) -> Result<(), ActionError> {
        if self.current_id().is_none() {
            return Err(ActionError::NoQuestion);
        }
        if !self.is_answered() {
            return Err(ActionError::NotAnswered);
        }
        self.present();
        Ok(())
    }

    /// Step forward, wrapping at the end. Returns false on an empty view.
    pub fn next(&mut self) -> bool {
        let len = self.view().len();
        if !self.cursor.next(len) {
            return false;
        }
        self.present();
        true
    }

    /// Step back, wrapping at the start. Returns false on an empty view.
    pub fn prev(&mut self) -> bool {
        let len = self.view().len();
        if !self.cursor.prev(len) {
            return false;
        }
        self.present();
        true
    }

    /// Move to the question at `bank_index`.
    ///
    /// An index past the end is clamped to the last question. When the target
    /// is hidden by the current filters, filters reset to `{all}` and the
    /// cursor lands on the target in the unfiltered order.
    pub fn jump_to(&mut self, bank_index: usize) -> QuestionId {
        let target = QuestionId::new(bank_index.min(self.bank.len().saturating_sub(1)));
        let view = self.view();
        if !self.cursor.seek(&view, target) {
            tracing::debug!(question = %target, filters = %self.filters, "jump target hidden; clearing filters");
            self.filters = FilterState::all();
            let view = self.view();
            self.cursor.seek(&view, target);
        }
        self.present();
        target
    }

    /// Flip the mark on the current question. Returns whether it is now
    /// marked.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::NoQuestion` on an empty view.
    pub fn toggle_mark(&mut self) -> Result<bool, ActionError> {
        let id = self.current_id().ok_or(ActionError::NoQuestion)?;
        let marked = self.marks.toggle(id);
        self.settle();
        Ok(marked)
    }

    /// Replace the active filters. Returns false when they are unchanged.
    pub fn set_filters(&mut self, filters: FilterState) -> bool {
        if filters == self.filters {
            return false;
        }
        self.filters = filters;
        self.cursor.reset();
        self.present();
        true
    }

    /// Back to `{all}` at position 0. Returns false if already there.
    pub fn reset_filters(&mut self) -> bool {
        if self.filters.is_all() && self.cursor.raw() == 0 {
            return false;
        }
        self.filters = FilterState::all();
        self.cursor.reset();
        self.present();
        true
    }

    /// Toggle bank-order shuffling. Turning it on rolls a new permutation.
    /// Returns the new mode.
    pub fn toggle_bank_shuffle(&mut self) -> bool {
        if self.base.is_shuffled() {
            self.base.unshuffle();
        } else {
            self.base.shuffle(self.bank.len(), &mut self.rng);
        }
        self.cursor.reset();
        self.present();
        self.base.is_shuffled()
    }

    /// Forget every answer and zero the counters. Marks stay.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.settle();
    }

    /// Remove every mark. History stays.
    pub fn clear_marks(&mut self) {
        self.marks.clear();
        self.settle();
    }

    // ─── persistence ───

    /// Restore progress from a stored record.
    ///
    /// Ids outside the bank are dropped and the last shown index is clamped,
    /// so a record saved against a larger bank still loads.
    pub fn hydrate(&mut self, record: &PersistedRecord) {
        let entries: std::collections::BTreeMap<_, _> = record
            .history
            .iter()
            .filter(|(id, _)| self.bank.contains(**id))
            .map(|(id, entry)| (*id, *entry))
            .collect();
        let marks: MarkSet = record
            .marked
            .iter()
            .copied()
            .filter(|id| self.bank.contains(*id))
            .collect();

        let dropped = (record.history.len() - entries.len()) + (record.marked.len() - marks.len());
        if dropped > 0 {
            tracing::warn!(dropped, bank_size = self.bank.len(), "stored progress references questions outside the bank");
        }

        self.history = History::from_parts(entries, record.stats);
        self.marks = marks;

        let last = record
            .last_question_index
            .index()
            .min(self.bank.len().saturating_sub(1));
        let view = self.view();
        self.cursor.seek(&view, QuestionId::new(last));
        self.present();
    }

    /// Record to persist for the current state.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> PersistedRecord {
        PersistedRecord {
            history: self.history.entries().clone(),
            marked: self.marks.iter().collect(),
            stats: self.history.stats(),
            last_question_index: self.current_id().unwrap_or(QuestionId::new(0)),
            updated_at: Some(now),
        }
    }

    // ─── epoch bookkeeping ───

    /// Clamp the cursor; start a new epoch only if the question under it
    /// changed.
    fn settle(&mut self) {
        let view = self.view();
        let current = self.cursor.current(&view);
        if current != self.shown {
            self.show(current);
        }
    }

    /// Clamp the cursor and always start a new epoch.
    fn present(&mut self) {
        let view = self.view();
        let current = self.cursor.current(&view);
        self.show(current);
    }

    fn show(&mut self, current: Option<QuestionId>) {
        self.shown = current;
        self.phase = AnswerPhase::Unanswered;
        let seed = self.rng.random();
        self.shuffle.new_epoch_with_seed(seed);
        if let Some(question) = current.and_then(|id| self.bank.get(id)) {
            self.shuffle.option_order(question);
        }
    }
}

fn build_feedback(
    question: &Question,
    order: &[usize],
    selection: &Selection,
    correct: bool,
) -> AnswerFeedback {
    let options = order
        .iter()
        .enumerate()
        .map(|(position, &original)| {
            let option = &question.options()[original];
            OptionFeedback {
                position,
                text: option.text.clone(),
                is_correct: option.is_correct(),
                selected: selection.contains(position),
            }
        })
        .collect();

    AnswerFeedback {
        question: question.id(),
        correct,
        options,
        explanation: question.explanation().map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{FilterTag, HistoryEntry};
    use quiz_core::time::fixed_now;

    const BANK: &str = r#"[
        {"question": "Q0", "options": [
            {"text": "q0 right", "status": "correct"},
            {"text": "q0 wrong a", "status": "incorrect"},
            {"text": "q0 wrong b", "status": "incorrect"}]},
        {"question": "Q1", "options": [
            {"text": "q1 right a", "status": "correct"},
            {"text": "q1 wrong", "status": "incorrect"},
            {"text": "q1 right b", "status": "correct"}],
         "explanation": "two answers"},
        {"question": "Q2", "options": [
            {"text": "q2 wrong", "status": "incorrect"},
            {"text": "q2 right", "status": "correct"}]},
        {"question": "Q3", "options": [
            {"text": "q3 right", "status": "correct"},
            {"text": "q3 wrong", "status": "incorrect"}]},
        {"question": "Q4 has a rather long text that will not fit in a preview", "options": [
            {"text": "q4 right", "status": "correct"},
            {"text": "q4 wrong", "status": "incorrect"}]}
    ]"#;

    fn state() -> SessionState {
        SessionState::with_seed(QuestionBank::from_json_str(BANK).unwrap(), 42)
    }

    fn ids(raw: &[usize]) -> Vec<QuestionId> {
        raw.iter().copied().map(QuestionId::new).collect()
    }

    fn positions(state: &SessionState, want_correct: bool) -> Vec<usize> {
        let view = state.current_question().unwrap();
        let question = state.bank().get(view.id).unwrap();
        view.options
            .iter()
            .filter(|shown| {
                question
                    .options()
                    .iter()
                    .any(|o| o.text == shown.text && o.is_correct() == want_correct)
            })
            .map(|shown| shown.position)
            .collect()
    }

    fn answer(state: &mut SessionState, correct: bool) -> AnswerFeedback {
        let picked = positions(state, correct);
        let picked = if correct { picked } else { picked[..1].to_vec() };
        state.submit(picked).unwrap()
    }

    #[test]
    fn starts_on_first_question_unanswered() {
        let s = state();
        assert_eq!(s.current_id(), Some(QuestionId::new(0)));
        assert!(!s.is_answered());
        assert_eq!(s.progress().unwrap().view_len, 5);
    }

    #[test]
    fn correct_answer_through_shuffled_order() {
        let mut s = state();
        let feedback = answer(&mut s, true);
        assert!(feedback.correct);
        assert_eq!(feedback.options.iter().filter(|o| o.selected).count(), 1);
        assert!(feedback.options.iter().all(|o| !o.selected || o.is_correct));
        assert_eq!(s.history().get(QuestionId::new(0)), Some(&HistoryEntry::first(true)));
        assert_eq!(s.stats(), SessionStats::new(1, 0));
    }

    #[test]
    fn multi_select_requires_every_correct_option() {
        let mut s = state();
        s.jump_to(1);
        let correct = positions(&s, true);
        assert_eq!(correct.len(), 2);

        let feedback = s.submit([correct[0]]).unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.explanation.as_deref(), Some("two answers"));

        s.retry().unwrap();
        let feedback = s.submit(positions(&s, true)).unwrap();
        assert!(feedback.correct);
    }

    #[test]
    fn option_order_is_stable_until_the_question_changes() {
        let mut s = state();
        let first = s.current_question().unwrap();
        assert_eq!(s.current_question().unwrap(), first);

        s.toggle_mark().unwrap();
        let marked = s.current_question().unwrap();
        assert_eq!(marked.epoch, first.epoch);
        assert_eq!(marked.options, first.options);

        s.next();
        assert!(s.epoch() > first.epoch);
    }

    #[test]
    fn empty_selection_is_rejected_without_changes() {
        let mut s = state();
        let epoch = s.epoch();
        assert_eq!(s.submit([]), Err(ActionError::EmptySelection));
        assert_eq!(s.submit([7]), Err(ActionError::SelectionOutOfRange { position: 7, option_count: 3 }));
        assert_eq!(s.submit([0, 1]), Err(ActionError::TooManySelections { selected: 2 }));
        assert!(s.history().entries().is_empty());
        assert_eq!(s.stats().total(), 0);
        assert!(!s.is_answered());
        assert_eq!(s.epoch(), epoch);
    }

    #[test]
    fn second_submit_needs_retry() {
        let mut s = state();
        answer(&mut s, false);
        assert_eq!(s.submit([0]), Err(ActionError::AlreadyAnswered));

        let epoch = s.epoch();
        s.retry().unwrap();
        assert!(!s.is_answered());
        assert!(s.epoch() > epoch);
        assert_eq!(s.current_id(), Some(QuestionId::new(0)));

        answer(&mut s, true);
        let entry = s.history().get(QuestionId::new(0)).unwrap();
        assert!(entry.correct);
        assert_eq!(entry.attempts, 2);
        assert_eq!(s.stats(), SessionStats::new(1, 1));
        assert_eq!(s.stats().total(), 2);
    }

    #[test]
    fn retry_without_answer_is_rejected() {
        let mut s = state();
        assert_eq!(s.retry(), Err(ActionError::NotAnswered));
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let mut s = state();
        assert!(s.prev());
        assert_eq!(s.current_id(), Some(QuestionId::new(4)));
        assert!(s.next());
        assert_eq!(s.current_id(), Some(QuestionId::new(0)));
        assert!(s.next());
        assert_eq!(s.current_id(), Some(QuestionId::new(1)));
    }

    #[test]
    fn navigation_discards_shown_answer() {
        let mut s = state();
        answer(&mut s, true);
        s.next();
        s.prev();
        assert!(!s.is_answered());
        assert!(s.current_question().unwrap().feedback.is_none());
    }

    #[test]
    fn marked_or_incorrect_filter_is_a_union() {
        let mut s = state();
        answer(&mut s, false);
        s.jump_to(1);
        s.toggle_mark().unwrap();
        s.jump_to(2);
        answer(&mut s, true);
        s.jump_to(3);
        s.toggle_mark().unwrap();

        assert!(s.set_filters(FilterState::new([FilterTag::Marked, FilterTag::Incorrect])));
        assert_eq!(s.view(), ids(&[0, 1, 3]));
        assert_eq!(s.progress().unwrap().position, 0);
        assert!(!s.set_filters(FilterState::new([FilterTag::Incorrect, FilterTag::Marked])));

        let counts = s.filter_counts();
        assert_eq!((counts.all, counts.marked, counts.incorrect, counts.unanswered), (5, 2, 1, 3));
    }

    #[test]
    fn empty_view_is_a_valid_state() {
        let mut s = state();
        assert!(s.set_filters(FilterState::new([FilterTag::Marked])));
        assert!(s.is_view_empty());
        assert!(s.current_question().is_none());
        assert!(s.progress().is_none());
        assert!(!s.next());
        assert!(!s.prev());
        assert_eq!(s.toggle_mark(), Err(ActionError::NoQuestion));
        assert_eq!(s.submit([0]), Err(ActionError::NoQuestion));

        assert!(s.reset_filters());
        assert!(s.filters().is_all());
        assert_eq!(s.current_id(), Some(QuestionId::new(0)));
        assert!(!s.reset_filters());
    }

    #[test]
    fn stale_cursor_clamps_when_the_view_shrinks() {
        let mut s = state();
        for index in [1, 3, 4] {
            s.jump_to(index);
            s.toggle_mark().unwrap();
        }
        s.set_filters(FilterState::new([FilterTag::Marked]));
        s.next();
        s.next();
        assert_eq!(s.current_id(), Some(QuestionId::new(4)));

        // Unmarking the last visible question drops it from the view.
        s.toggle_mark().unwrap();
        assert_eq!(s.view(), ids(&[1, 3]));
        assert_eq!(s.progress().unwrap().position, 0);
        assert_eq!(s.current_id(), Some(QuestionId::new(1)));
    }

    #[test]
    fn answering_under_unanswered_filter_moves_on() {
        let mut s = state();
        s.set_filters(FilterState::new([FilterTag::Unanswered]));
        let feedback = answer(&mut s, true);
        assert_eq!(feedback.question, QuestionId::new(0));
        assert_eq!(s.current_id(), Some(QuestionId::new(1)));
        assert!(!s.is_answered());
    }

    #[test]
    fn jump_inside_view_keeps_filters() {
        let mut s = state();
        s.jump_to(2);
        s.toggle_mark().unwrap();
        s.jump_to(4);
        s.toggle_mark().unwrap();
        s.set_filters(FilterState::new([FilterTag::Marked]));

        assert_eq!(s.jump_to(4), QuestionId::new(4));
        assert!(s.filters().contains(FilterTag::Marked));
        assert_eq!(s.progress().unwrap().position, 1);
    }

    #[test]
    fn jump_outside_view_resets_filters() {
        let mut s = state();
        s.jump_to(2);
        s.toggle_mark().unwrap();
        s.set_filters(FilterState::new([FilterTag::Marked]));

        assert_eq!(s.jump_to(3), QuestionId::new(3));
        assert!(s.filters().is_all());
        assert_eq!(s.current_id(), Some(QuestionId::new(3)));
        assert_eq!(s.progress().unwrap().position, 3);
    }

    #[test]
    fn jump_past_the_end_clamps() {
        let mut s = state();
        assert_eq!(s.jump_to(99), QuestionId::new(4));
        assert_eq!(s.current_id(), Some(QuestionId::new(4)));
    }

    #[test]
    fn bank_shuffle_reorders_the_base() {
        let mut s = state();
        s.jump_to(3);
        assert!(s.toggle_bank_shuffle());
        let mut view = s.view();
        assert_eq!(s.progress().unwrap().position, 0);
        view.sort();
        assert_eq!(view, ids(&[0, 1, 2, 3, 4]));

        assert!(!s.toggle_bank_shuffle());
        assert_eq!(s.view(), ids(&[0, 1, 2, 3, 4]));
        assert_eq!(s.current_id(), Some(QuestionId::new(0)));
    }

    #[test]
    fn clearing_history_keeps_marks_and_vice_versa() {
        let mut s = state();
        answer(&mut s, false);
        s.toggle_mark().unwrap();

        s.clear_history();
        assert!(s.history().entries().is_empty());
        assert_eq!(s.stats(), SessionStats::default());
        assert!(s.marks().contains(QuestionId::new(0)));

        s.retry().unwrap();
        answer(&mut s, true);
        s.clear_marks();
        assert!(s.marks().is_empty());
        assert!(s.history().is_answered(QuestionId::new(0)));
    }

    #[test]
    fn overview_and_marked_list() {
        let mut s = state();
        answer(&mut s, true);
        s.jump_to(4);
        s.toggle_mark().unwrap();
        answer(&mut s, false);
        s.jump_to(1);
        s.toggle_mark().unwrap();

        let overview = s.overview();
        assert_eq!(overview.bank_size, 5);
        assert_eq!(overview.answered, 2);
        assert_eq!(overview.answered_correct, 1);
        assert_eq!(overview.marked, 2);
        assert_eq!(overview.overall_accuracy(), Some(0.5));

        let list = s.marked_list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, QuestionId::new(1));
        assert_eq!(list[0].preview, "Q1");
        assert_eq!(list[1].id, QuestionId::new(4));
        assert_eq!(list[1].preview, "Q4 has a rather long text that will not ...");
    }

    #[test]
    fn snapshot_then_hydrate_restores_progress() {
        let mut s = state();
        answer(&mut s, false);
        s.jump_to(3);
        s.toggle_mark().unwrap();
        answer(&mut s, true);

        let record = s.snapshot(fixed_now());
        assert_eq!(record.last_question_index, QuestionId::new(3));
        assert_eq!(record.stats, SessionStats::new(1, 1));
        assert_eq!(record.updated_at, Some(fixed_now()));

        let mut restored = state();
        restored.hydrate(&record);
        assert_eq!(restored.current_id(), Some(QuestionId::new(3)));
        assert_eq!(restored.history(), s.history());
        assert!(restored.marks().contains(QuestionId::new(3)));
        assert!(!restored.is_answered());
    }

    #[test]
    fn hydrate_tolerates_a_smaller_bank() {
        let mut record = PersistedRecord::default();
        record.history.insert(QuestionId::new(1), HistoryEntry::first(true));
        record.history.insert(QuestionId::new(40), HistoryEntry::first(false));
        record.marked = ids(&[2, 41]).into_iter().collect();
        record.stats = SessionStats::new(1, 1);
        record.last_question_index = QuestionId::new(40);

        let mut s = state();
        s.hydrate(&record);
        assert_eq!(s.history().answered_count(), 1);
        assert_eq!(s.marks().len(), 1);
        assert_eq!(s.stats(), SessionStats::new(1, 1));
        assert_eq!(s.current_id(), Some(QuestionId::new(4)));
    }
}
