use std::ops::Range;

/// Mode-specific annotation carried by a selection (diagnostic text, match title).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SelectionInfo {
    pub title: Option<String>,
    pub message: Option<String>,
}

impl SelectionInfo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A byte range in one buffer version.
///
/// `anchor` is the fixed end and `active` the moving end; the selected extent
/// is `min..max` of the two. Resolved units keep `anchor` at the start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub anchor: usize,
    pub active: usize,
    pub info: Option<SelectionInfo>,
}

impl Selection {
    pub fn new(range: Range<usize>) -> Self {
        Self {
            anchor: range.start,
            active: range.end,
            info: None,
        }
    }

    pub fn point(offset: usize) -> Self {
        Self {
            anchor: offset,
            active: offset,
            info: None,
        }
    }

    pub fn with_info(mut self, info: Option<SelectionInfo>) -> Self {
        self.info = info;
        self
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.active)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.active)
    }

    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_point(&self) -> bool {
        self.anchor == self.active
    }

    pub fn is_empty(&self) -> bool {
        self.is_point()
    }

    /// Same extent regardless of direction or annotation.
    pub fn same_extent(&self, other: &Selection) -> bool {
        self.range() == other.range()
    }

    /// Keep the anchor, move the active end.
    pub fn extend_to(&self, active: usize) -> Self {
        Self {
            anchor: self.anchor,
            active,
            info: None,
        }
    }

    pub fn collapse_to_active(&self) -> Self {
        Self::point(self.active)
    }

    /// Clamp both ends into `[0, len]`.
    pub fn clamp(mut self, len: usize) -> Self {
        self.anchor = self.anchor.min(len);
        self.active = self.active.min(len);
        self
    }
}
