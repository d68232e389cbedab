//! Filtered view computation.
//!
//! A view is the base ordering (bank order, or one fixed shuffled permutation
//! of it) narrowed by the active filter tags. Specific tags combine with OR,
//! and the result keeps base-ordering order.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{FilterState, FilterTag, History, MarkSet, QuestionId};

/// Order in which the bank is walked before filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseOrder {
    shuffled: Option<Vec<QuestionId>>,
}

impl BaseOrder {
    #[must_use]
    pub fn bank_order() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_shuffled(&self) -> bool {
        self.shuffled.is_some()
    }

    /// Switch to a newly rolled permutation of `bank_len` questions.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, bank_len: usize, rng: &mut R) {
        let mut ids: Vec<QuestionId> = (0..bank_len).map(QuestionId::new).collect();
        ids.shuffle(rng);
        self.shuffled = Some(ids);
    }

    /// Back to plain bank order.
    pub fn unshuffle(&mut self) {
        self.shuffled = None;
    }

    /// Every question id, in base order.
    #[must_use]
    pub fn ids(&self, bank_len: usize) -> Vec<QuestionId> {
        match &self.shuffled {
            Some(ids) => ids.clone(),
            None => (0..bank_len).map(QuestionId::new).collect(),
        }
    }
}

fn matches(tag: FilterTag, id: QuestionId, history: &History, marks: &MarkSet) -> bool {
    match tag {
        FilterTag::All => true,
        FilterTag::Marked => marks.contains(id),
        FilterTag::Incorrect => history.is_incorrect(id),
        FilterTag::Unanswered => !history.is_answered(id),
    }
}

/// Ids visible under `filters`, in base order. May be empty.
#[must_use]
pub fn filtered_indices(
    base: &BaseOrder,
    bank_len: usize,
    filters: &FilterState,
    history: &History,
    marks: &MarkSet,
) -> Vec<QuestionId> {
    let ids = base.ids(bank_len);
    if filters.is_all() {
        return ids;
    }
    ids.into_iter()
        .filter(|&id| filters.tags().any(|tag| matches(tag, id, history, marks)))
        .collect()
}

/// How many questions each tag would select on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCounts {
    pub all: usize,
    pub marked: usize,
    pub incorrect: usize,
    pub unanswered: usize,
}

impl FilterCounts {
    #[must_use]
    pub fn compute(bank_len: usize, history: &History, marks: &MarkSet) -> Self {
        Self {
            all: bank_len,
            marked: marks.len(),
            incorrect: history.incorrect_count(),
            unanswered: bank_len.saturating_sub(history.answered_count()),
        }
    }

    #[must_use]
    pub fn get(&self, tag: FilterTag) -> usize {
        match tag {
            FilterTag::All => self.all,
            FilterTag::Marked => self.marked,
            FilterTag::Incorrect => self.incorrect,
            FilterTag::Unanswered => self.unanswered,
        }
    }
}
