//! Movement resolution: `(mode, selection, movement) -> Resolution`.
//!
//! Resolution is pure. It reads the buffer, the optional syntax tree, the
//! buffer's marks and the cached LSP locations from a [`ResolveContext`] and
//! never mutates anything;
//! committing the result is the caller's business.

use core_lsp::Location;
use core_syntax::SyntaxProvider;
use core_text::{Buffer, grapheme};
use tracing::trace;

use crate::candidates::{self, Candidates};
use crate::structural::Structure;
use crate::{EngineError, ModeKind, Movement, Selection, SelectionMode, WrapPolicy};

/// Read-only view of everything a mode may consult.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub buffer: &'a Buffer,
    pub syntax: Option<&'a dyn SyntaxProvider>,
    pub locations: &'a [Location],
    pub marks: &'a [std::ops::Range<usize>],
}

impl<'a> ResolveContext<'a> {
    pub fn new(buffer: &'a Buffer) -> Self {
        Self {
            buffer,
            syntax: None,
            locations: &[],
            marks: &[],
        }
    }

    pub fn with_syntax(mut self, syntax: Option<&'a dyn SyntaxProvider>) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_locations(mut self, locations: &'a [Location]) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_marks(mut self, marks: &'a [std::ops::Range<usize>]) -> Self {
        self.marks = marks;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Selection),
    NoMatch,
    /// The mode has no meaning for this movement; callers treat it like `NoMatch`.
    Unsupported,
}

impl Resolution {
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Found(_) => "found",
            Resolution::NoMatch => "no_match",
            Resolution::Unsupported => "unsupported",
        }
    }

    pub fn found(self) -> Option<Selection> {
        match self {
            Resolution::Found(sel) => Some(sel),
            _ => None,
        }
    }
}

fn found(candidate: Option<&candidates::Candidate>) -> Resolution {
    candidate.map_or(Resolution::NoMatch, |c| Resolution::Found(c.selection()))
}

/// Resolve one cursor's movement under `mode`.
pub fn resolve(
    mode: &SelectionMode,
    ctx: &ResolveContext<'_>,
    selection: &Selection,
    movement: Movement,
) -> Result<Resolution, EngineError> {
    let outcome = match movement {
        // Jump-list movements never reach a mode.
        Movement::GoBack | Movement::GoForward => Resolution::Unsupported,
        Movement::ParentLine => match parent_line_start(ctx.buffer, selection.start()) {
            Some(offset) => resolve_in_mode(mode, ctx, &Selection::point(offset), Movement::Current)?,
            None => Resolution::NoMatch,
        },
        Movement::Left => resolve_in_mode(mode, ctx, selection, Movement::Previous)?,
        Movement::Right => resolve_in_mode(mode, ctx, selection, Movement::Next)?,
        other => resolve_in_mode(mode, ctx, selection, other)?,
    };
    let outcome = match outcome {
        Resolution::Found(sel) => Resolution::Found(sel.clamp(ctx.buffer.len_bytes())),
        other => other,
    };
    trace!(
        target: "selection.resolve",
        mode = mode.kind.name(),
        movement = movement.name(),
        from_start = selection.start(),
        from_end = selection.end(),
        outcome = outcome.label(),
        "resolved"
    );
    Ok(outcome)
}

fn resolve_in_mode(
    mode: &SelectionMode,
    ctx: &ResolveContext<'_>,
    sel: &Selection,
    movement: Movement,
) -> Result<Resolution, EngineError> {
    if let ModeKind::SyntaxNode { kinds } = &mode.kind {
        let Some(provider) = ctx.syntax else {
            return Ok(Resolution::Unsupported);
        };
        let tree = Structure::new(provider, ctx.buffer.version(), kinds)?;
        return Ok(match movement {
            Movement::Current => tree.current(sel)?,
            Movement::Next => match tree.next(sel)? {
                Resolution::NoMatch if mode.wrap == WrapPolicy::Wrap => tree.first(sel)?,
                other => other,
            },
            Movement::Previous => match tree.previous(sel)? {
                Resolution::NoMatch if mode.wrap == WrapPolicy::Wrap => tree.last(sel)?,
                other => other,
            },
            Movement::First => tree.first(sel)?,
            Movement::Last => tree.last(sel)?,
            Movement::Index(n) => tree.index(sel, n)?,
            Movement::Up => tree.up(sel)?,
            Movement::Down => tree.down(sel)?,
            _ => Resolution::Unsupported,
        });
    }

    let list = match candidates::for_mode(&mode.kind, ctx, sel)? {
        Some(list) => list,
        None => return Ok(Resolution::Unsupported),
    };
    Ok(match movement {
        Movement::Current => found(list.current(sel, |o| ctx.buffer.line_of_offset(o))),
        Movement::Next => match list.next(sel) {
            Some(c) => Resolution::Found(c.selection()),
            None if mode.wrap == WrapPolicy::Wrap => found(list.first()),
            None => Resolution::NoMatch,
        },
        Movement::Previous => match list.previous(sel) {
            Some(c) => Resolution::Found(c.selection()),
            None if mode.wrap == WrapPolicy::Wrap => found(list.last()),
            None => Resolution::NoMatch,
        },
        Movement::First => found(list.first()),
        Movement::Last => found(list.last()),
        Movement::Index(n) => found(list.get(n)),
        Movement::Up | Movement::Down => vertical(mode, ctx.buffer, sel, movement == Movement::Down),
        _ => Resolution::Unsupported,
    })
}

fn vertical(mode: &SelectionMode, buffer: &Buffer, sel: &Selection, down: bool) -> Resolution {
    if !matches!(
        mode.kind,
        ModeKind::LineTrimmed | ModeKind::LineFull | ModeKind::Column
    ) {
        return Resolution::Unsupported;
    }
    let line = buffer.line_of_offset(sel.start());
    let target = if down {
        Some(line + 1)
    } else {
        line.checked_sub(1)
    };
    let Some(target) = target.filter(|&t| t < candidates::selectable_lines(buffer)) else {
        return Resolution::NoMatch;
    };
    match mode.kind {
        ModeKind::LineTrimmed => found(candidates::line_candidates(buffer, true).get(target)),
        ModeKind::LineFull => found(candidates::line_candidates(buffer, false).get(target)),
        ModeKind::Column => {
            let content = buffer.line_content(line);
            let offset_in_line = sel.start() - buffer.line_start(line);
            let col = grapheme::visual_col(&content, offset_in_line);
            let below = buffer.line_content(target);
            let byte = grapheme::byte_for_visual_col(&below, col);
            let base = buffer.line_start(target);
            if byte >= below.len() {
                // Shorter line: land on its end.
                Resolution::Found(Selection::point(base + below.len()))
            } else {
                let end = grapheme::next_boundary(&below, byte);
                Resolution::Found(Selection::new(base + byte..base + end))
            }
        }
        _ => Resolution::Unsupported,
    }
}

fn indent_of(content: &str) -> Option<usize> {
    if content.trim().is_empty() {
        return None;
    }
    Some(content.len() - content.trim_start().len())
}

/// First non-blank offset of the nearest earlier line indented less than the line of `offset`.
fn parent_line_start(buffer: &Buffer, offset: usize) -> Option<usize> {
    let line = buffer.line_of_offset(offset);
    let indent = indent_of(&buffer.line_content(line))?;
    (0..line).rev().find_map(|idx| {
        let content = buffer.line_content(idx);
        indent_of(&content)
            .filter(|&i| i < indent)
            .map(|i| buffer.line_start(idx) + i)
    })
}

/// Every candidate of the mode, for select-all.
pub fn all_candidates(
    mode: &SelectionMode,
    ctx: &ResolveContext<'_>,
    reference: &Selection,
) -> Result<Vec<Selection>, EngineError> {
    if let ModeKind::SyntaxNode { kinds } = &mode.kind {
        let Some(provider) = ctx.syntax else {
            return Ok(Vec::new());
        };
        return Structure::new(provider, ctx.buffer.version(), kinds)?.all();
    }
    let list = candidates::for_mode(&mode.kind, ctx, reference)?.unwrap_or_else(Candidates::default);
    Ok(list.iter().map(|c| c.selection()).collect())
}
