use std::collections::BTreeSet;
use thiserror::Error;

use crate::model::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("select at least one option")]
    Empty,

    #[error("display position {position} is out of range for {option_count} options")]
    OutOfRange { position: usize, option_count: usize },

    #[error("this question takes a single answer, got {selected}")]
    TooMany { selected: usize },
}

/// A validated, non-empty set of display positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    positions: BTreeSet<usize>,
}

impl Selection {
    /// Validate raw positions against `question`.
    ///
    /// Duplicates collapse. Single-answer questions accept exactly one
    /// position.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError` for an empty selection, a position past the
    /// last option, or several positions on a single-answer question.
    pub fn new(
        question: &Question,
        positions: impl IntoIterator<Item = usize>,
    ) -> Result<Self, SelectionError> {
        let positions: BTreeSet<usize> = positions.into_iter().collect();
        if positions.is_empty() {
            return Err(SelectionError::Empty);
        }

        let option_count = question.option_count();
        if let Some(&position) = positions.iter().find(|&&p| p >= option_count) {
            return Err(SelectionError::OutOfRange {
                position,
                option_count,
            });
        }

        if !question.is_multi_select() && positions.len() > 1 {
            return Err(SelectionError::TooMany {
                selected: positions.len(),
            });
        }

        Ok(Self { positions })
    }

    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        self.positions.contains(&position)
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// True iff the selected display positions map, through `option_order`, onto
/// exactly the set of correct original indices.
#[must_use]
pub fn is_correct(question: &Question, selection: &Selection, option_order: &[usize]) -> bool {
    let chosen: Option<BTreeSet<usize>> = selection
        .positions()
        .map(|p| option_order.get(p).copied())
        .collect();
    let Some(chosen) = chosen else {
        return false;
    };
    let correct: BTreeSet<usize> = question.correct_indices().collect();
    chosen == correct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, QuizOption};

    fn wrong_right_wrong() -> Question {
        Question::new(
            QuestionId::new(0),
            "Q",
            vec![
                QuizOption::incorrect("w0"),
                QuizOption::correct("c1"),
                QuizOption::incorrect("w2"),
            ],
            None,
        )
        .unwrap()
    }

    fn multi() -> Question {
        Question::new(
            QuestionId::new(1),
            "Q",
            vec![
                QuizOption::correct("c0"),
                QuizOption::incorrect("w1"),
                QuizOption::correct("c2"),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn maps_display_positions_through_the_order() {
        let q = wrong_right_wrong();
        let order = [2, 1, 0];

        let pick_middle = Selection::new(&q, [1]).unwrap();
        assert!(is_correct(&q, &pick_middle, &order));

        let pick_first = Selection::new(&q, [0]).unwrap();
        assert!(!is_correct(&q, &pick_first, &order));
    }

    #[test]
    fn correctness_is_independent_of_order() {
        let q = multi();
        for order in [[0, 1, 2], [2, 1, 0], [1, 0, 2], [1, 2, 0]] {
            let correct_positions: Vec<usize> = order
                .iter()
                .enumerate()
                .filter(|(_, original)| **original != 1)
                .map(|(display, _)| display)
                .collect();
            let selection = Selection::new(&q, correct_positions).unwrap();
            assert!(is_correct(&q, &selection, &order));

            let partial = Selection::new(&q, [order.iter().position(|&o| o == 0).unwrap()]).unwrap();
            assert!(!is_correct(&q, &partial, &order));
        }
    }

    #[test]
    fn superset_is_wrong() {
        let q = multi();
        let all = Selection::new(&q, [0, 1, 2]).unwrap();
        assert!(!is_correct(&q, &all, &[0, 1, 2]));
    }

    #[test]
    fn validation_rejects_bad_input() {
        let q = wrong_right_wrong();
        assert_eq!(Selection::new(&q, []), Err(SelectionError::Empty));
        assert_eq!(
            Selection::new(&q, [3]),
            Err(SelectionError::OutOfRange {
                position: 3,
                option_count: 3
            })
        );
        assert_eq!(
            Selection::new(&q, [0, 2]),
            Err(SelectionError::TooMany { selected: 2 })
        );
        assert_eq!(Selection::new(&q, [1, 1]).unwrap().len(), 1);
    }
}
