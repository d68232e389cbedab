use crate::model::QuestionId;

/// Position inside the current filtered view (not a bank index).
///
/// Every accessor takes the current view length and clamps a stale position
/// back to 0 before using it, so a shrunken view never faults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationCursor {
    position: usize,
}

impl NavigationCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(position: usize) -> Self {
        Self { position }
    }

    /// Raw stored position, possibly stale.
    #[must_use]
    pub fn raw(&self) -> usize {
        self.position
    }

    /// Usable position for a view of `view_len` without storing the clamp.
    #[must_use]
    pub fn clamped(&self, view_len: usize) -> Option<usize> {
        match view_len {
            0 => None,
            len if self.position >= len => Some(0),
            _ => Some(self.position),
        }
    }

    /// Clamp against `view_len` and return the usable position, or `None` for
    /// an empty view.
    pub fn resolve(&mut self, view_len: usize) -> Option<usize> {
        if self.position >= view_len {
            self.position = 0;
        }
        (view_len > 0).then_some(self.position)
    }

    /// Id under the cursor.
    pub fn current(&mut self, view: &[QuestionId]) -> Option<QuestionId> {
        self.resolve(view.len()).map(|p| view[p])
    }

    /// Step forward, wrapping to the first item. Returns false on an empty view.
    pub fn next(&mut self, view_len: usize) -> bool {
        let Some(position) = self.resolve(view_len) else {
            return false;
        };
        self.position = if position + 1 < view_len { position + 1 } else { 0 };
        true
    }

    /// Step back, wrapping to the last item. Returns false on an empty view.
    pub fn prev(&mut self, view_len: usize) -> bool {
        let Some(position) = self.resolve(view_len) else {
            return false;
        };
        self.position = if position > 0 { position - 1 } else { view_len - 1 };
        true
    }

    /// Move onto `id` if the view contains it.
    pub fn seek(&mut self, view: &[QuestionId], id: QuestionId) -> bool {
        match view.iter().position(|&v| v == id) {
            Some(position) => {
                self.position = position;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}
