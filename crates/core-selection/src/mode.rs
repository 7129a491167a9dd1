use std::fmt;

use core_lsp::{GotoKind, LspQueryKind, SeverityRange};
use regex::{Regex, RegexBuilder};

use crate::ModeError;

/// What Next/Previous do after running off either end of the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapPolicy {
    #[default]
    Stay,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Local,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Literal,
    Regex,
    /// The query's words in any common naming convention.
    NamingAgnostic,
}

/// A compiled search: a literal query, a user regex, or a query matched
/// across naming conventions.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    source: String,
    flavor: Flavor,
    case_insensitive: bool,
    regex: Regex,
}

impl SearchPattern {
    pub fn literal(query: &str, case_insensitive: bool) -> Result<Self, ModeError> {
        Self::build(query, Flavor::Literal, case_insensitive)
    }

    pub fn regex(pattern: &str) -> Result<Self, ModeError> {
        Self::build(pattern, Flavor::Regex, false)
    }

    /// `"ali bu"` also finds `aliBu`, `AliBu`, `ali_bu`, `ALI-BU`, `Ali Bu`
    /// and the other spellings from [`naming_variants`].
    pub fn naming_agnostic(query: &str) -> Result<Self, ModeError> {
        Self::build(query, Flavor::NamingAgnostic, false)
    }

    fn build(source: &str, flavor: Flavor, case_insensitive: bool) -> Result<Self, ModeError> {
        if source.is_empty() {
            return Err(ModeError::EmptyPattern);
        }
        let expr = match flavor {
            Flavor::Literal => regex::escape(source),
            Flavor::Regex => source.to_string(),
            Flavor::NamingAgnostic => {
                let variants = naming_variants(source);
                if variants.is_empty() {
                    return Err(ModeError::EmptyPattern);
                }
                variants
                    .iter()
                    .map(|v| regex::escape(v))
                    .collect::<Vec<_>>()
                    .join("|")
            }
        };
        let regex = RegexBuilder::new(&expr)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            source: source.to_string(),
            flavor,
            case_insensitive,
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Non-empty matches in text order.
    pub fn matches(&self, text: &str) -> Vec<std::ops::Range<usize>> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
            .collect()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Spellings of `query` in the usual naming conventions, longest first so
/// that an alternation prefers the separated forms. Empty when the query
/// holds no words.
pub fn naming_variants(query: &str) -> Vec<String> {
    let words: Vec<String> = crate::words::short_words(query)
        .into_iter()
        .map(|r| query[r].trim_end_matches('_').to_lowercase())
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect();
    if words.is_empty() {
        return Vec::new();
    }
    let upper: Vec<String> = words.iter().map(|w| w.to_uppercase()).collect();
    let title: Vec<String> = words.iter().map(|w| capitalize(w)).collect();
    let camel = std::iter::once(words[0].clone())
        .chain(title[1..].iter().cloned())
        .collect::<String>();
    let mut variants = vec![
        words.join(" "),
        upper.join(" "),
        title.join(" "),
        words.join("_"),
        upper.join("_"),
        words.join("-"),
        upper.join("-"),
        title.join("-"),
        title.concat(),
        camel,
        words.concat(),
    ];
    variants.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    variants.dedup();
    variants
}

impl PartialEq for SearchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.flavor == other.flavor
            && self.case_insensitive == other.case_insensitive
    }
}

impl Eq for SearchPattern {}

/// Addressing strategy shared by every cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeKind {
    Character,
    WordShort,
    WordLong,
    LineTrimmed,
    LineFull,
    Column,
    Token,
    /// Structural nodes; a non-empty `kinds` restricts which nodes qualify.
    SyntaxNode { kinds: Vec<String> },
    RegexMatch(SearchPattern),
    TextSearch {
        pattern: SearchPattern,
        scope: SearchScope,
    },
    LspQuery(LspQueryKind),
    /// The query's words in any naming convention, within the buffer.
    NamingAgnostic(SearchPattern),
    /// The buffer's marked ranges.
    Mark,
}

impl ModeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModeKind::Character => "character",
            ModeKind::WordShort => "word-short",
            ModeKind::WordLong => "word-long",
            ModeKind::LineTrimmed => "line",
            ModeKind::LineFull => "line-full",
            ModeKind::Column => "column",
            ModeKind::Token => "token",
            ModeKind::SyntaxNode { .. } => "syntax",
            ModeKind::RegexMatch(_) => "regex",
            ModeKind::TextSearch {
                scope: SearchScope::Local,
                ..
            } => "search",
            ModeKind::TextSearch {
                scope: SearchScope::Global,
                ..
            } => "search-global",
            ModeKind::LspQuery(LspQueryKind::Diagnostics(_)) => "diagnostics",
            ModeKind::LspQuery(LspQueryKind::Goto(_)) => "goto",
            ModeKind::NamingAgnostic(_) => "naming",
            ModeKind::Mark => "mark",
        }
    }

    pub fn default_wrap(&self) -> WrapPolicy {
        match self {
            ModeKind::RegexMatch(_) | ModeKind::TextSearch { .. } | ModeKind::NamingAgnostic(_) => {
                WrapPolicy::Wrap
            }
            _ => WrapPolicy::Stay,
        }
    }

    pub fn lsp_kind(&self) -> Option<LspQueryKind> {
        match self {
            ModeKind::LspQuery(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::RegexMatch(p) => write!(f, "regex /{}/", p.source()),
            ModeKind::TextSearch { pattern, scope } => {
                let scope = match scope {
                    SearchScope::Local => "search",
                    SearchScope::Global => "search-global",
                };
                write!(f, "{scope} \"{}\"", pattern.source())
            }
            ModeKind::LspQuery(kind) => write!(f, "{kind}"),
            ModeKind::NamingAgnostic(p) => write!(f, "naming \"{}\"", p.source()),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionMode {
    pub kind: ModeKind,
    pub wrap: WrapPolicy,
}

impl SelectionMode {
    pub fn new(kind: ModeKind) -> Self {
        let wrap = kind.default_wrap();
        Self { kind, wrap }
    }

    pub fn with_wrap(mut self, wrap: WrapPolicy) -> Self {
        self.wrap = wrap;
        self
    }
}

impl Default for SelectionMode {
    fn default() -> Self {
        Self::new(ModeKind::WordShort)
    }
}

/// Uncompiled mode request as typed by a user or script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSpec {
    Character,
    WordShort,
    WordLong,
    LineTrimmed,
    LineFull,
    Column,
    Token,
    SyntaxNode { kinds: Vec<String> },
    Regex(String),
    Search {
        query: String,
        scope: SearchScope,
        case_insensitive: Option<bool>,
    },
    Diagnostics(SeverityRange),
    Goto(GotoKind),
    NamingAgnostic(String),
    Mark,
}

impl ModeSpec {
    /// Compile into a mode kind; `case_insensitive` applies to searches that do not say.
    pub fn compile(&self, case_insensitive: bool) -> Result<ModeKind, ModeError> {
        Ok(match self {
            ModeSpec::Character => ModeKind::Character,
            ModeSpec::WordShort => ModeKind::WordShort,
            ModeSpec::WordLong => ModeKind::WordLong,
            ModeSpec::LineTrimmed => ModeKind::LineTrimmed,
            ModeSpec::LineFull => ModeKind::LineFull,
            ModeSpec::Column => ModeKind::Column,
            ModeSpec::Token => ModeKind::Token,
            ModeSpec::SyntaxNode { kinds } => ModeKind::SyntaxNode {
                kinds: kinds.clone(),
            },
            ModeSpec::Regex(pattern) => ModeKind::RegexMatch(SearchPattern::regex(pattern)?),
            ModeSpec::Search {
                query,
                scope,
                case_insensitive: ci,
            } => ModeKind::TextSearch {
                pattern: SearchPattern::literal(query, ci.unwrap_or(case_insensitive))?,
                scope: *scope,
            },
            ModeSpec::Diagnostics(range) => ModeKind::LspQuery(LspQueryKind::Diagnostics(*range)),
            ModeSpec::Goto(kind) => ModeKind::LspQuery(LspQueryKind::Goto(*kind)),
            ModeSpec::NamingAgnostic(query) => {
                ModeKind::NamingAgnostic(SearchPattern::naming_agnostic(query)?)
            }
            ModeSpec::Mark => ModeKind::Mark,
        })
    }
}
