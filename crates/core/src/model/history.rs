use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::QuestionId;

//
// ─── HISTORY ENTRY ─────────────────────────────────────────────────────────────
//

/// Outcome of the most recent attempt at a question, plus how many attempts
/// were made in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub correct: bool,
    #[serde(default)]
    pub attempts: u32,
}

impl HistoryEntry {
    #[must_use]
    pub fn first(correct: bool) -> Self {
        Self {
            correct,
            attempts: 1,
        }
    }
}

//
// ─── SESSION STATS ─────────────────────────────────────────────────────────────
//

/// Running answer counters. `total` is always `correct + incorrect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    correct: u32,
    incorrect: u32,
}

impl SessionStats {
    #[must_use]
    pub fn new(correct: u32, incorrect: u32) -> Self {
        Self { correct, incorrect }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct.saturating_add(self.incorrect)
    }

    /// Share of correct answers in `[0, 1]`, or `None` before any answer.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| f64::from(self.correct) / f64::from(total))
    }

    fn record(&mut self, correct: bool) {
        if correct {
            self.correct = self.correct.saturating_add(1);
        } else {
            self.incorrect = self.incorrect.saturating_add(1);
        }
    }
}

//
// ─── HISTORY STORE ─────────────────────────────────────────────────────────────
//

/// Per-question answer history together with the session counters.
///
/// Entries are only created or updated by [`History::record_answer`] and only
/// removed by [`History::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: BTreeMap<QuestionId, HistoryEntry>,
    stats: SessionStats,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts.
    #[must_use]
    pub fn from_parts(entries: BTreeMap<QuestionId, HistoryEntry>, stats: SessionStats) -> Self {
        Self { entries, stats }
    }

    /// Apply one evaluated submission.
    ///
    /// The entry keeps the latest outcome, not a cumulative one. Repeated
    /// submissions for the same question all count towards the stats.
    pub fn record_answer(&mut self, id: QuestionId, correct: bool) -> HistoryEntry {
        let entry = self
            .entries
            .entry(id)
            .and_modify(|e| {
                e.attempts = e.attempts.saturating_add(1);
                e.correct = correct;
            })
            .or_insert_with(|| HistoryEntry::first(correct));
        let snapshot = *entry;
        self.stats.record(correct);
        snapshot
    }

    /// Drop every entry and zero the stats.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = SessionStats::default();
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&HistoryEntry> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Answered at least once and the latest attempt was wrong.
    #[must_use]
    pub fn is_incorrect(&self, id: QuestionId) -> bool {
        self.entries.get(&id).is_some_and(|e| !e.correct)
    }

    #[must_use]
    pub fn entries(&self) -> &BTreeMap<QuestionId, HistoryEntry> {
        &self.entries
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn answered_correct_count(&self) -> usize {
        self.entries.values().filter(|e| e.correct).count()
    }

    #[must_use]
    pub fn incorrect_count(&self) -> usize {
        self.entries.values().filter(|e| !e.correct).count()
    }
}
