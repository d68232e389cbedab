use std::collections::BTreeSet;

use crate::model::ids::QuestionId;

/// Questions the user flagged as favorites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet {
    ids: BTreeSet<QuestionId>,
}

impl MarkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the mark on `id`. Returns whether it is marked afterwards.
    pub fn toggle(&mut self, id: QuestionId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Marked ids in ascending bank order.
    pub fn iter(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<QuestionId> for MarkSet {
    fn from_iter<I: IntoIterator<Item = QuestionId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
