/// Abstract movement requested by the user, interpreted by the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Next,
    Previous,
    First,
    Last,
    Left,
    Right,
    Up,
    Down,
    Current,
    GoBack,
    GoForward,
    /// The n-th candidate (zero based) of the current mode.
    Index(usize),
    /// Nearest preceding line indented less than the current one.
    ParentLine,
}

impl Movement {
    /// Movements whose extension grows toward the start of the buffer.
    pub fn is_backward(&self) -> bool {
        matches!(
            self,
            Movement::Previous
                | Movement::Left
                | Movement::First
                | Movement::Up
                | Movement::ParentLine
        )
    }

    /// Jump-list movements bypass the selection mode entirely.
    pub fn is_history(&self) -> bool {
        matches!(self, Movement::GoBack | Movement::GoForward)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Movement::Next => "next",
            Movement::Previous => "previous",
            Movement::First => "first",
            Movement::Last => "last",
            Movement::Left => "left",
            Movement::Right => "right",
            Movement::Up => "up",
            Movement::Down => "down",
            Movement::Current => "current",
            Movement::GoBack => "back",
            Movement::GoForward => "forward",
            Movement::Index(_) => "index",
            Movement::ParentLine => "parent-line",
        }
    }
}
