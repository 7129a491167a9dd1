//! Ordered candidate lists for the list-based modes and the rules that pick
//! a target out of them.

use std::ops::Range;

use core_lsp::Location;
use core_text::{Buffer, grapheme};
use unicode_segmentation::UnicodeSegmentation;

use crate::resolver::ResolveContext;
use crate::{EngineError, ModeKind, Selection, SelectionInfo, lexer, words};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub range: Range<usize>,
    pub info: Option<SelectionInfo>,
}

impl Candidate {
    pub fn new(range: Range<usize>) -> Self {
        Self { range, info: None }
    }

    pub fn selection(&self) -> Selection {
        Selection::new(self.range.clone()).with_info(self.info.clone())
    }
}

/// Candidates sorted by start, then end, then annotation.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    items: Vec<Candidate>,
}

impl Candidates {
    pub fn new(mut items: Vec<Candidate>) -> Self {
        items.sort_by(|a, b| {
            (a.range.start, a.range.end, &a.info).cmp(&(b.range.start, b.range.end, &b.info))
        });
        items.dedup();
        Self { items }
    }

    fn from_ranges(ranges: Vec<Range<usize>>) -> Self {
        Self::new(ranges.into_iter().map(Candidate::new).collect())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }

    /// Index of the candidate equal to `sel`, preferring a matching annotation.
    pub fn exact(&self, sel: &Selection) -> Option<usize> {
        let range = sel.range();
        self.items
            .iter()
            .position(|c| c.range == range && c.info == sel.info)
            .or_else(|| self.items.iter().position(|c| c.range == range))
    }

    pub fn first(&self) -> Option<&Candidate> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Candidate> {
        self.items.last()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.items.get(index)
    }

    pub fn next(&self, sel: &Selection) -> Option<&Candidate> {
        if let Some(i) = self.exact(sel) {
            return self.items.get(i + 1);
        }
        let r = sel.range();
        self.items
            .iter()
            .find(|c| c.range.start >= r.end && c.range != r)
    }

    pub fn previous(&self, sel: &Selection) -> Option<&Candidate> {
        if let Some(i) = self.exact(sel) {
            return i.checked_sub(1).and_then(|p| self.items.get(p));
        }
        let r = sel.range();
        self.items
            .iter()
            .rev()
            .find(|c| c.range.end <= r.start && c.range != r)
    }

    /// Exact match, else the innermost candidate containing `sel`, else the
    /// first overlapping one, else the nearest (same line first).
    pub fn current(&self, sel: &Selection, line_of: impl Fn(usize) -> usize) -> Option<&Candidate> {
        if let Some(i) = self.exact(sel) {
            return self.items.get(i);
        }
        let r = sel.range();
        let contains = |c: &Candidate| {
            if r.is_empty() {
                c.range.start <= r.start
                    && (r.start < c.range.end || (c.range.is_empty() && c.range.start == r.start))
            } else {
                c.range.start <= r.start && r.end <= c.range.end
            }
        };
        let innermost = self
            .items
            .iter()
            .filter(|c| contains(c))
            .max_by_key(|c| (c.range.start, std::cmp::Reverse(c.range.len())));
        if innermost.is_some() {
            return innermost;
        }
        if let Some(c) = self
            .items
            .iter()
            .find(|c| c.range.start < r.end && r.start < c.range.end)
        {
            return Some(c);
        }
        let line = line_of(r.start);
        self.items.iter().min_by_key(|c| {
            let distance = if c.range.end <= r.start {
                r.start - c.range.end
            } else {
                c.range.start.saturating_sub(r.end)
            };
            (line_of(c.range.start) != line, distance, c.range.len())
        })
    }
}

/// Candidate list for a list-based mode; `None` for structural modes.
pub(crate) fn for_mode(
    kind: &ModeKind,
    ctx: &ResolveContext<'_>,
    reference: &Selection,
) -> Result<Option<Candidates>, EngineError> {
    let buffer = ctx.buffer;
    let list = match kind {
        ModeKind::Character => Candidates::from_ranges(characters(&buffer.text())),
        ModeKind::WordShort => Candidates::from_ranges(words::short_words(&buffer.text())),
        ModeKind::WordLong => Candidates::from_ranges(words::long_words(&buffer.text())),
        ModeKind::LineTrimmed => Candidates::from_ranges(lines(buffer, true)),
        ModeKind::LineFull => Candidates::from_ranges(lines(buffer, false)),
        ModeKind::Column => {
            Candidates::from_ranges(columns(buffer, buffer.line_of_offset(reference.start())))
        }
        ModeKind::Token => match ctx.syntax {
            Some(provider) => Candidates::from_ranges(core_syntax::tokens(provider, buffer.version())?),
            None => Candidates::from_ranges(lexer::tokens(&buffer.text())),
        },
        ModeKind::RegexMatch(pattern)
        | ModeKind::TextSearch { pattern, .. }
        | ModeKind::NamingAgnostic(pattern) => Candidates::from_ranges(pattern.matches(&buffer.text())),
        ModeKind::Mark => Candidates::from_ranges(ctx.marks.to_vec()),
        ModeKind::LspQuery(kind) => {
            let title = kind.to_string();
            Candidates::new(
                ctx.locations
                    .iter()
                    .filter(|l| l.path == buffer.display_path())
                    .map(|l| location_candidate(buffer, l, &title))
                    .collect(),
            )
        }
        ModeKind::SyntaxNode { .. } => return Ok(None),
    };
    Ok(Some(list))
}

fn location_candidate(buffer: &Buffer, location: &Location, title: &str) -> Candidate {
    let start = buffer.line_col_to_offset(location.start);
    let end = buffer.line_col_to_offset(location.end).max(start);
    let mut info = SelectionInfo::titled(title);
    info.message = location.message.clone();
    Candidate {
        range: start..end,
        info: Some(info),
    }
}

fn characters(text: &str) -> Vec<Range<usize>> {
    text.grapheme_indices(true)
        .filter(|(_, g)| !grapheme::is_line_terminator(g))
        .map(|(i, g)| i..i + g.len())
        .collect()
}

/// Index past the last real line; a trailing newline does not open a selectable line.
fn line_limit(buffer: &Buffer) -> usize {
    let count = buffer.line_count();
    if count > 1 && buffer.line_range(count - 1).is_empty() {
        count - 1
    } else {
        count
    }
}

fn lines(buffer: &Buffer, trimmed: bool) -> Vec<Range<usize>> {
    (0..line_limit(buffer))
        .map(|idx| {
            let full = buffer.line_range(idx);
            if !trimmed {
                return full;
            }
            let content = buffer.line_content(idx);
            let lead = content.len() - content.trim_start().len();
            let body = content.trim();
            if body.is_empty() {
                full.start..full.start
            } else {
                let start = full.start + lead;
                start..start + body.len()
            }
        })
        .collect()
}

fn columns(buffer: &Buffer, line: usize) -> Vec<Range<usize>> {
    let base = buffer.line_start(line);
    buffer
        .line_content(line)
        .grapheme_indices(true)
        .map(|(i, g)| base + i..base + i + g.len())
        .collect()
}

/// Candidate list of line modes, exposed for Up/Down and ParentLine.
pub(crate) fn line_candidates(buffer: &Buffer, trimmed: bool) -> Candidates {
    Candidates::from_ranges(lines(buffer, trimmed))
}

pub(crate) fn column_candidates(buffer: &Buffer, line: usize) -> Candidates {
    Candidates::from_ranges(columns(buffer, line))
}

pub(crate) fn selectable_lines(buffer: &Buffer) -> usize {
    line_limit(buffer)
}
