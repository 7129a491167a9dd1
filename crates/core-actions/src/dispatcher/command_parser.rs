//! Script line parsing.
//!
//! Converts one line of a driver script (or a `-c` argument) into a
//! `ParsedCommand`. Pure classification: no session access and no side
//! effects. Errors are represented as `ParsedCommand::Unknown(String)` which
//! the driver reports and skips.
//!
//! Grammar, one command per line, `#` starts a comment:
//! * movements: `next [n]`, `prev [n]`, `first`, `last`, `left`, `right`,
//!   `up`, `down`, `current`, `back`, `forward`, `parent-line`, `index <n>`
//! * `mode <name> [args]` where name is one of `character`, `word-short`,
//!   `word-long`, `line`, `line-full`, `column`, `token`, `syntax [kind..]`,
//!   `regex <pattern>`, `search <text>`, `search-global <text>`,
//!   `naming <text>`, `mark`, `diagnostics [severity]`, `goto <kind>`
//! * cursor set: `add <movement>`, `select-all`, `keep-primary`,
//!   `remove-primary`, `select <a..b | a>...`, `mark`
//! * toggles: `extend`, `swap`, `escape`
//! * edits: `replace <text>` (`\n`, `\t` and `\\` escapes), `delete`, `undo`,
//!   `redo`
//! * `qf-next`, `qf-prev`, `buffer <n>`, `open <path>`, `print`

use std::path::PathBuf;

use crate::Action;
use core_lsp::{GotoKind, Severity, SeverityRange};
use core_selection::{ModeSpec, Movement, SearchScope, Selection};
use core_text::BufferId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Action(Action),
    /// Write the cursor set to the driver's output.
    Print,
    Open(PathBuf),
    /// Blank line or comment.
    Empty,
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(raw: &str) -> ParsedCommand {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return ParsedCommand::Empty;
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim_start()),
            None => (line, ""),
        };
        // Commands taking free text keep the rest of the line verbatim.
        match head {
            "replace" => return ParsedCommand::Action(Action::Replace(unescape(rest))),
            "mode" => {
                return parse_mode(rest)
                    .map(|spec| ParsedCommand::Action(Action::SwitchMode(spec)))
                    .unwrap_or_else(|| ParsedCommand::Unknown(line.to_string()));
            }
            "open" if !rest.is_empty() => return ParsedCommand::Open(PathBuf::from(rest)),
            _ => {}
        }
        let args: Vec<&str> = rest.split_whitespace().collect();
        let parsed = match (head, args.as_slice()) {
            ("print", []) => Some(ParsedCommand::Print),
            ("extend", []) => Some(ParsedCommand::Action(Action::ToggleExtend)),
            ("swap", []) => Some(ParsedCommand::Action(Action::ToggleSwap)),
            ("escape", []) => Some(ParsedCommand::Action(Action::Escape)),
            ("select-all", []) => Some(ParsedCommand::Action(Action::SelectAll)),
            ("keep-primary", []) => Some(ParsedCommand::Action(Action::KeepPrimaryOnly)),
            ("remove-primary", []) => Some(ParsedCommand::Action(Action::RemovePrimary)),
            ("mark", []) => Some(ParsedCommand::Action(Action::ToggleMarks)),
            ("delete", []) => Some(ParsedCommand::Action(Action::Delete)),
            ("undo", []) => Some(ParsedCommand::Action(Action::Undo)),
            ("redo", []) => Some(ParsedCommand::Action(Action::Redo)),
            ("qf-next", []) => Some(ParsedCommand::Action(Action::QuickfixNext)),
            ("qf-prev", []) => Some(ParsedCommand::Action(Action::QuickfixPrevious)),
            ("buffer", [n]) => n
                .parse()
                .ok()
                .map(|n| ParsedCommand::Action(Action::SwitchBuffer(BufferId(n)))),
            ("add", args) => parse_movement(args)
                .map(|movement| ParsedCommand::Action(Action::AddCursor(movement))),
            ("select", args) if !args.is_empty() => args
                .iter()
                .map(|a| parse_selection(a))
                .collect::<Option<Vec<_>>>()
                .map(|sels| ParsedCommand::Action(Action::Select(sels))),
            _ => parse_counted_movement(head, &args).map(ParsedCommand::Action),
        };
        parsed.unwrap_or_else(|| ParsedCommand::Unknown(line.to_string()))
    }
}

fn movement_named(name: &str) -> Option<Movement> {
    Some(match name {
        "next" | "n" => Movement::Next,
        "prev" | "previous" | "p" => Movement::Previous,
        "first" => Movement::First,
        "last" => Movement::Last,
        "left" => Movement::Left,
        "right" => Movement::Right,
        "up" => Movement::Up,
        "down" => Movement::Down,
        "current" => Movement::Current,
        "back" => Movement::GoBack,
        "forward" => Movement::GoForward,
        "parent-line" => Movement::ParentLine,
        _ => return None,
    })
}

fn parse_movement(args: &[&str]) -> Option<Movement> {
    match args {
        ["index", n] => n.parse().ok().map(Movement::Index),
        [name] => movement_named(name),
        _ => None,
    }
}

fn parse_counted_movement(head: &str, args: &[&str]) -> Option<Action> {
    if head == "index" {
        return match args {
            [n] => n.parse().ok().map(|n| Action::Move(Movement::Index(n))),
            _ => None,
        };
    }
    let movement = movement_named(head)?;
    match args {
        [] => Some(Action::Move(movement)),
        [count] => {
            let count: usize = count.parse().ok()?;
            Some(Action::MoveCount { movement, count })
        }
        _ => None,
    }
}

/// `a..b` selects forward, `b..a` (with `b > a`) keeps the anchor at `b`, a
/// bare offset is a point.
fn parse_selection(arg: &str) -> Option<Selection> {
    match arg.split_once("..") {
        Some((a, b)) => {
            let anchor: usize = a.parse().ok()?;
            let active: usize = b.parse().ok()?;
            Some(Selection::point(anchor).extend_to(active))
        }
        None => arg.parse().ok().map(Selection::point),
    }
}

fn parse_mode(body: &str) -> Option<ModeSpec> {
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (body, ""),
    };
    let spec = match (name, rest) {
        ("character" | "char", "") => ModeSpec::Character,
        ("word-short" | "word", "") => ModeSpec::WordShort,
        ("word-long" | "WORD", "") => ModeSpec::WordLong,
        ("line", "") => ModeSpec::LineTrimmed,
        ("line-full", "") => ModeSpec::LineFull,
        ("column", "") => ModeSpec::Column,
        ("token", "") => ModeSpec::Token,
        ("syntax", kinds) => ModeSpec::SyntaxNode {
            kinds: kinds.split_whitespace().map(str::to_string).collect(),
        },
        ("regex", pattern) if !pattern.is_empty() => ModeSpec::Regex(pattern.to_string()),
        ("search", query) if !query.is_empty() => search(query, SearchScope::Local),
        ("search-global", query) if !query.is_empty() => search(query, SearchScope::Global),
        ("naming", query) if !query.is_empty() => ModeSpec::NamingAgnostic(unescape(query)),
        ("mark", "") => ModeSpec::Mark,
        ("diagnostics", "") => ModeSpec::Diagnostics(SeverityRange::all()),
        ("diagnostics", severity) => ModeSpec::Diagnostics(SeverityRange::only(severity_named(severity)?)),
        ("goto", kind) => ModeSpec::Goto(goto_named(kind)?),
        _ => return None,
    };
    Some(spec)
}

fn search(query: &str, scope: SearchScope) -> ModeSpec {
    ModeSpec::Search {
        query: unescape(query),
        scope,
        case_insensitive: None,
    }
}

fn severity_named(name: &str) -> Option<Severity> {
    Some(match name {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "information" | "info" => Severity::Information,
        "hint" => Severity::Hint,
        _ => return None,
    })
}

fn goto_named(name: &str) -> Option<GotoKind> {
    Some(match name {
        "definitions" | "definition" => GotoKind::Definitions,
        "declarations" | "declaration" => GotoKind::Declarations,
        "implementations" | "implementation" => GotoKind::Implementations,
        "references" => GotoKind::References,
        "references+declaration" => GotoKind::ReferencesIncludingDeclaration,
        "type-definitions" | "type-definition" => GotoKind::TypeDefinitions,
        _ => return None,
    })
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
