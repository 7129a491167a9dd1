//! Syntax-tree access for structural selection.
//!
//! Nodes are handed out as opaque [`NodeRef`] values: an index into the
//! provider's arena tagged with the buffer version the tree was built for.
//! Once the buffer moves on, every outstanding `NodeRef` is dead and the
//! provider answers with [`SyntaxError::StaleNode`].

use std::ops::Range;
use std::path::Path;

use core_text::Version;
use thiserror::Error;

mod tree;

pub use tree::TreeSitterSyntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    version: Version,
    index: u32,
}

impl NodeRef {
    pub(crate) fn new(version: Version, index: u32) -> Self {
        Self { version, index }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("node from version {node:?} used against tree at version {tree:?}")]
    StaleNode { node: Version, tree: Version },
    #[error("tree is at version {tree:?}, requested {requested:?}")]
    VersionMismatch { requested: Version, tree: Version },
    #[error("grammar rejected: {0}")]
    Language(String),
    #[error("parser produced no tree")]
    ParseFailed,
}

/// Read access to a syntax tree for one buffer.
pub trait SyntaxProvider {
    /// Buffer version the current tree was built from.
    fn version(&self) -> Version;
    fn root(&self, version: Version) -> Result<NodeRef, SyntaxError>;
    /// Smallest node covering `range` (a point range picks the node containing that byte).
    fn node_at(&self, version: Version, range: Range<usize>) -> Result<NodeRef, SyntaxError>;
    fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>, SyntaxError>;
    fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>, SyntaxError>;
    fn next_sibling(&self, node: NodeRef) -> Result<Option<NodeRef>, SyntaxError>;
    fn previous_sibling(&self, node: NodeRef) -> Result<Option<NodeRef>, SyntaxError>;
    fn range(&self, node: NodeRef) -> Result<Range<usize>, SyntaxError>;
    fn kind(&self, node: NodeRef) -> Result<&str, SyntaxError>;
    /// Named nodes are grammar rules; anonymous ones are punctuation and keywords.
    fn is_named(&self, node: NodeRef) -> Result<bool, SyntaxError>;
    /// Rebuild the tree for a new buffer version.
    fn reparse(&mut self, version: Version, text: &str) -> Result<(), SyntaxError>;
}

/// Node kinds whose interior is opaque at token granularity.
pub fn is_literal_kind(kind: &str) -> bool {
    kind.contains("string") || kind.contains("comment") || kind == "char_literal"
}

/// Lexical tokens of the tree: leaves, with literal nodes kept whole.
pub fn tokens(
    provider: &dyn SyntaxProvider,
    version: Version,
) -> Result<Vec<Range<usize>>, SyntaxError> {
    let mut out = Vec::new();
    let mut stack = vec![provider.root(version)?];
    while let Some(node) = stack.pop() {
        let children = provider.children(node)?;
        if children.is_empty() || is_literal_kind(provider.kind(node)?) {
            let range = provider.range(node)?;
            if !range.is_empty() {
                out.push(range);
            }
            continue;
        }
        stack.extend(children.into_iter().rev());
    }
    out.sort_by_key(|r| (r.start, r.end));
    out.dedup();
    Ok(out)
}

/// Build a provider for a path when a grammar for its extension is bundled.
pub fn provider_for_path(
    path: &Path,
    version: Version,
    text: &str,
) -> Option<Result<Box<dyn SyntaxProvider>, SyntaxError>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("rs") => Some(
            TreeSitterSyntax::rust(version, text).map(|p| Box::new(p) as Box<dyn SyntaxProvider>),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(src: &str, ranges: &[Range<usize>]) -> Vec<String> {
        ranges.iter().map(|r| src[r.clone()].to_string()).collect()
    }

    #[test]
    fn tokens_keep_literals_whole() {
        let src = "let s = \"a b\"; /* note */\n";
        let tree = TreeSitterSyntax::rust(Version(0), src).unwrap();
        let toks = tokens(&tree, Version(0)).unwrap();
        assert_eq!(
            texts(src, &toks),
            vec!["let", "s", "=", "\"a b\"", ";", "/* note */"]
        );
    }

    #[test]
    fn literal_kinds() {
        assert!(is_literal_kind("string_literal"));
        assert!(is_literal_kind("raw_string_literal"));
        assert!(is_literal_kind("line_comment"));
        assert!(is_literal_kind("char_literal"));
        assert!(!is_literal_kind("identifier"));
    }

    #[test]
    fn provider_selected_by_extension() {
        assert!(provider_for_path(Path::new("a/b.rs"), Version(0), "fn f() {}").is_some());
        assert!(provider_for_path(Path::new("notes.txt"), Version(0), "hi").is_none());
    }
}
