//! Language-server query contract.
//!
//! The editor never speaks the protocol itself: it hands an [`LspRequest`] to
//! an [`LspClient`] and gets back a oneshot receiver that later yields the
//! resulting [`Location`]s. Transport, encoding and server lifecycle live
//! behind the trait.

use std::fmt;
use std::path::PathBuf;

use core_text::{Position, Version};
use thiserror::Error;
use tokio::sync::oneshot;

mod scripted;

pub use scripted::ScriptedLspClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GotoKind {
    Definitions,
    Declarations,
    Implementations,
    References,
    ReferencesIncludingDeclaration,
    TypeDefinitions,
}

impl GotoKind {
    pub fn name(&self) -> &'static str {
        match self {
            GotoKind::Definitions => "definitions",
            GotoKind::Declarations => "declarations",
            GotoKind::Implementations => "implementations",
            GotoKind::References => "references",
            GotoKind::ReferencesIncludingDeclaration => "references+declaration",
            GotoKind::TypeDefinitions => "type definitions",
        }
    }
}

/// Diagnostic severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// Inclusive band of severities, from `most` severe to `least` severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeverityRange {
    pub most: Severity,
    pub least: Severity,
}

impl SeverityRange {
    pub fn all() -> Self {
        Self {
            most: Severity::Error,
            least: Severity::Hint,
        }
    }

    pub fn only(severity: Severity) -> Self {
        Self {
            most: severity,
            least: severity,
        }
    }

    pub fn is_all(&self) -> bool {
        *self == Self::all()
    }

    /// Diagnostics without a severity only pass an unrestricted range.
    pub fn contains(&self, severity: Option<Severity>) -> bool {
        match severity {
            Some(s) => self.most <= s && s <= self.least,
            None => self.is_all(),
        }
    }
}

impl Default for SeverityRange {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LspQueryKind {
    Diagnostics(SeverityRange),
    Goto(GotoKind),
}

/// Request identity without parameters; what a server advertises support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Diagnostics,
    Goto(GotoKind),
}

impl LspQueryKind {
    pub fn family(&self) -> QueryFamily {
        match self {
            LspQueryKind::Diagnostics(_) => QueryFamily::Diagnostics,
            LspQueryKind::Goto(kind) => QueryFamily::Goto(*kind),
        }
    }
}

impl fmt::Display for LspQueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LspQueryKind::Diagnostics(_) => write!(f, "diagnostics"),
            LspQueryKind::Goto(kind) => write!(f, "{}", kind.name()),
        }
    }
}

/// A span in some file, optionally annotated (diagnostic message, severity).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: PathBuf,
    pub start: Position,
    pub end: Position,
    pub message: Option<String>,
    pub severity: Option<Severity>,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, start: Position, end: Position) -> Self {
        Self {
            path: path.into(),
            start,
            end,
            message: None,
            severity: None,
        }
    }

    pub fn diagnostic(mut self, severity: Severity, message: impl Into<String>) -> Self {
        self.severity = Some(severity);
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LspRequest {
    pub kind: LspQueryKind,
    pub path: PathBuf,
    pub position: Position,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LspError {
    #[error("language server unavailable: {0}")]
    Unavailable(String),
    #[error("language server request timed out")]
    Timeout,
}

pub type LspResponse = Result<Vec<Location>, LspError>;

pub trait LspClient {
    fn supports(&self, family: QueryFamily) -> bool;
    /// Start a request; the answer arrives on the returned receiver.
    fn request(&self, request: LspRequest) -> oneshot::Receiver<LspResponse>;
}

/// Order by path then position and drop exact duplicates. Same-span entries
/// with different messages are kept apart.
pub fn normalize_locations(mut locations: Vec<Location>) -> Vec<Location> {
    locations.sort_by(|a, b| {
        (&a.path, a.start, a.end, &a.message).cmp(&(&b.path, b.start, b.end, &b.message))
    });
    locations.dedup_by(|a, b| a.path == b.path && a.start == b.start && a.end == b.end && a.message == b.message);
    locations
}

/// Apply the severity band of a diagnostics query; other kinds pass through.
pub fn filter_for_kind(kind: &LspQueryKind, locations: Vec<Location>) -> Vec<Location> {
    match kind {
        LspQueryKind::Diagnostics(range) => locations
            .into_iter()
            .filter(|l| range.contains(l.severity))
            .collect(),
        LspQueryKind::Goto(_) => locations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn loc(path: &str, line: usize, byte: usize) -> Location {
        Location::new(path, Position::new(line, byte), Position::new(line, byte + 1))
    }

    #[test]
    fn normalize_sorts_by_path_then_offset_and_dedups() {
        let out = normalize_locations(vec![
            loc("b.rs", 0, 0),
            loc("a.rs", 2, 0),
            loc("a.rs", 0, 4),
            loc("a.rs", 2, 0),
        ]);
        assert_eq!(out, vec![loc("a.rs", 0, 4), loc("a.rs", 2, 0), loc("b.rs", 0, 0)]);
    }

    #[test]
    fn same_span_different_messages_survive() {
        let a = loc("a.rs", 0, 0).diagnostic(Severity::Error, "first");
        let b = loc("a.rs", 0, 0).diagnostic(Severity::Warning, "second");
        assert_eq!(normalize_locations(vec![b.clone(), a.clone()]), vec![a, b]);
    }

    #[test]
    fn severity_band() {
        let errors = SeverityRange::only(Severity::Error);
        assert!(errors.contains(Some(Severity::Error)));
        assert!(!errors.contains(Some(Severity::Hint)));
        assert!(!errors.contains(None));
        assert!(SeverityRange::all().contains(None));
        let kind = LspQueryKind::Diagnostics(SeverityRange {
            most: Severity::Warning,
            least: Severity::Information,
        });
        let kept = filter_for_kind(
            &kind,
            vec![
                loc("a.rs", 0, 0).diagnostic(Severity::Error, "e"),
                loc("a.rs", 1, 0).diagnostic(Severity::Warning, "w"),
                loc("a.rs", 2, 0).diagnostic(Severity::Information, "i"),
            ],
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].severity, Some(Severity::Warning));
    }
}
