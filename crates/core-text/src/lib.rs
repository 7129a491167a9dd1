//! Versioned rope-backed text buffer.
//!
//! Every mutation goes through [`Buffer::apply`] (or [`Buffer::restore`]) and
//! bumps the buffer [`Version`]. Offsets handed out by higher layers are byte
//! offsets into one specific version; the returned [`ChangeSet`] is the only
//! way to carry them over to the next version.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ropey::Rope;

pub mod edit;
pub mod grapheme;

pub use edit::{Assoc, ChangeSet, Edit, EditError, EditSet};

/// Identifier of an open document inside a session workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub usize);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonically increasing content version of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u64);

impl Version {
    pub fn next(self) -> Self {
        Version(self.0 + 1)
    }
}

/// A position inside a buffer expressed as (line index, byte offset within that line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub byte: usize,
}

impl Position {
    pub fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }
    pub fn origin() -> Self {
        Self { line: 0, byte: 0 }
    }
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    name: String,
    path: Option<PathBuf>,
    version: Version,
}

impl fmt::Debug for Buffer {
    // Content stays out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("len_bytes", &self.rope.len_bytes())
            .finish()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
            path: None,
            version: Version::default(),
        })
    }

    /// Read a buffer from disk. The file name becomes the buffer name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut buffer = Self::from_str(name, &content)?;
        buffer.path = Some(path.to_path_buf());
        Ok(buffer)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Path used for ordering and for matching LSP locations; falls back to the name.
    pub fn display_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Whole buffer content.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Total number of lines in the buffer. A trailing newline opens a final empty line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Line content without its terminator.
    pub fn line_content(&self, idx: usize) -> String {
        let mut s = self.line(idx).unwrap_or_default();
        if s.ends_with('\n') {
            s.pop();
            if s.ends_with('\r') {
                s.pop();
            }
        }
        s
    }

    /// Byte length of a line (excluding any terminator).
    pub fn line_byte_len(&self, idx: usize) -> usize {
        self.line_content(idx).len()
    }

    /// Absolute byte offset of the first byte of `idx` (clamped to the last line).
    pub fn line_start(&self, idx: usize) -> usize {
        let idx = idx.min(self.rope.len_lines().saturating_sub(1));
        self.rope.line_to_byte(idx)
    }

    /// Byte range of a line including its terminator.
    pub fn line_range(&self, idx: usize) -> Range<usize> {
        let start = self.line_start(idx);
        let len = self.line(idx).map(|l| l.len()).unwrap_or(0);
        start..start + len
    }

    /// Line index containing `offset` (clamped).
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.byte_to_line(self.clamp_offset(offset))
    }

    /// Clamp an offset into `[0, len]` and back onto a char boundary.
    pub fn clamp_offset(&self, offset: usize) -> usize {
        let len = self.rope.len_bytes();
        if offset >= len {
            return len;
        }
        let ch = self.rope.byte_to_char(offset);
        self.rope.char_to_byte(ch)
    }

    pub fn offset_to_line_col(&self, offset: usize) -> Position {
        let offset = self.clamp_offset(offset);
        let line = self.rope.byte_to_line(offset);
        Position::new(line, offset - self.rope.line_to_byte(line))
    }

    /// Convert a (line, byte) position to an absolute offset, clamping both components.
    pub fn line_col_to_offset(&self, pos: Position) -> usize {
        let last = self.rope.len_lines().saturating_sub(1);
        let line = pos.line.min(last);
        let byte = pos.byte.min(self.line_byte_len(line));
        self.clamp_offset(self.rope.line_to_byte(line) + byte)
    }

    /// Return the UTF-8 slice in the absolute byte range `[start,end)` (clamped).
    pub fn slice_bytes(&self, start: usize, end: usize) -> String {
        let s = self.clamp_offset(start);
        let e = self.clamp_offset(end);
        if s >= e {
            return String::new();
        }
        let start_char = self.rope.byte_to_char(s);
        let end_char = self.rope.byte_to_char(e);
        self.rope.slice(start_char..end_char).to_string()
    }

    /// Apply a multi-range edit atomically, producing a new version.
    ///
    /// Either every edit lands or the buffer is left untouched.
    pub fn apply(&mut self, edits: &EditSet) -> Result<ChangeSet, EditError> {
        let len = self.rope.len_bytes();
        for edit in edits.iter() {
            if edit.range.end > len {
                return Err(EditError::OutOfBounds {
                    range: edit.range.clone(),
                    len,
                });
            }
            if self.clamp_offset(edit.range.start) != edit.range.start
                || self.clamp_offset(edit.range.end) != edit.range.end
            {
                return Err(EditError::NotCharBoundary {
                    range: edit.range.clone(),
                });
            }
        }
        let from = self.version;
        // Back to front so earlier offsets stay valid while editing.
        for edit in edits.iter().rev() {
            let start_char = self.rope.byte_to_char(edit.range.start);
            let end_char = self.rope.byte_to_char(edit.range.end);
            if start_char < end_char {
                self.rope.remove(start_char..end_char);
            }
            if !edit.text.is_empty() {
                self.rope.insert(start_char, &edit.text);
            }
        }
        self.version = from.next();
        Ok(ChangeSet::from_edits(from, self.version, edits))
    }

    /// Replace the whole content (undo / redo restore) as a new version.
    pub fn restore(&mut self, rope: Rope) -> ChangeSet {
        let old = self.rope.to_string();
        let new = rope.to_string();
        let from = self.version;
        self.rope = rope;
        self.version = from.next();
        ChangeSet::between(&old, &new, from, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_buffer_and_read_line() {
        let b = Buffer::from_str("test", "hello\nworld").unwrap();
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(0).unwrap(), "hello\n");
        assert_eq!(b.line(1).unwrap(), "world");
        assert_eq!(b.version(), Version(0));
    }

    #[test]
    fn offset_line_col_conversion() {
        let b = Buffer::from_str("t", "ab\ncde\n").unwrap();
        assert_eq!(b.offset_to_line_col(4), Position::new(1, 1));
        assert_eq!(b.line_col_to_offset(Position::new(1, 1)), 4);
        // Column past end of line clamps to the line end.
        assert_eq!(b.line_col_to_offset(Position::new(0, 10)), 2);
        assert_eq!(b.line_col_to_offset(Position::new(9, 0)), 7);
        assert_eq!(b.offset_to_line_col(100), Position::new(2, 0));
    }

    #[test]
    fn line_ranges_include_terminator() {
        let b = Buffer::from_str("t", "  foo  \nbar").unwrap();
        assert_eq!(b.line_range(0), 0..8);
        assert_eq!(b.line_range(1), 8..11);
        assert_eq!(b.line_content(0), "  foo  ");
        assert_eq!(b.line_of_offset(9), 1);
    }

    #[test]
    fn clamp_offset_snaps_to_char_boundary() {
        let b = Buffer::from_str("t", "aé").unwrap();
        assert_eq!(b.clamp_offset(2), 1);
        assert_eq!(b.clamp_offset(3), 3);
        assert_eq!(b.clamp_offset(99), 3);
    }

    #[test]
    fn apply_bumps_version_and_edits_all_ranges() {
        let mut b = Buffer::from_str("t", "one two three").unwrap();
        let edits = EditSet::new(vec![
            Edit::replace(0..3, "1"),
            Edit::replace(8..13, "3"),
        ])
        .unwrap();
        let changes = b.apply(&edits).unwrap();
        assert_eq!(b.text(), "1 two 3");
        assert_eq!(b.version(), Version(1));
        assert_eq!(changes.from_version(), Version(0));
        assert_eq!(changes.to_version(), Version(1));
    }

    #[test]
    fn apply_out_of_bounds_leaves_buffer_untouched() {
        let mut b = Buffer::from_str("t", "abc").unwrap();
        let edits = EditSet::new(vec![Edit::replace(0..1, "x"), Edit::replace(2..9, "y")]).unwrap();
        assert!(matches!(b.apply(&edits), Err(EditError::OutOfBounds { .. })));
        assert_eq!(b.text(), "abc");
        assert_eq!(b.version(), Version(0));
    }

    #[test]
    fn restore_produces_new_version() {
        let mut b = Buffer::from_str("t", "hello world").unwrap();
        let changes = b.restore(Rope::from_str("hello there world"));
        assert_eq!(b.version(), Version(1));
        assert_eq!(changes.map(6, Assoc::After), 12);
        assert_eq!(b.text(), "hello there world");
    }

    #[test]
    fn from_path_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.rs");
        std::fs::write(&path, "fn main() {}\n").unwrap();
        let b = Buffer::from_path(&path).unwrap();
        assert_eq!(b.name(), "sample.rs");
        assert_eq!(b.path(), Some(path.as_path()));
        assert_eq!(b.line_count(), 2);
    }
}
