/// Shows one slide at a time out of an ordered list.
///
/// The position is always clamped to `0..len`; moving past either edge is a
/// no-op, never a wrap-around. With zero slides every command is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideNavigator {
    len: usize,
    current: usize,
}

impl SlideNavigator {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&self) -> usize {
        self.current
    }

    /// Moves to `index`, clamped into range. Returns the new position.
    pub fn show(&mut self, index: usize) -> usize {
        if self.len > 0 {
            self.current = index.min(self.len - 1);
        }
        self.current
    }

    pub fn next(&mut self) -> usize {
        self.show(self.current.saturating_add(1))
    }

    pub fn prev(&mut self) -> usize {
        self.show(self.current.saturating_sub(1))
    }

    pub fn first(&mut self) -> usize {
        self.show(0)
    }

    pub fn last(&mut self) -> usize {
        self.show(self.len.saturating_sub(1))
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.len > 0 && index == self.current
    }

    /// Whether the "previous" control is enabled.
    pub fn can_prev(&self) -> bool {
        self.current > 0
    }

    /// Whether the "next" control is enabled.
    pub fn can_next(&self) -> bool {
        self.current + 1 < self.len
    }
}
