use std::ops::Range;

use core_text::Version;
use tracing::trace;
use tree_sitter::{Language, Parser, Tree};

use crate::{NodeRef, SyntaxError, SyntaxProvider};

#[derive(Debug)]
struct NodeRecord {
    kind: &'static str,
    range: Range<usize>,
    named: bool,
    parent: Option<u32>,
    children: Vec<u32>,
}

/// Tree-sitter parse flattened into an index arena.
pub struct TreeSitterSyntax {
    parser: Parser,
    version: Version,
    nodes: Vec<NodeRecord>,
}

impl TreeSitterSyntax {
    pub fn new(language: Language, version: Version, text: &str) -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| SyntaxError::Language(e.to_string()))?;
        let mut syntax = Self {
            parser,
            version,
            nodes: Vec::new(),
        };
        syntax.reparse(version, text)?;
        Ok(syntax)
    }

    pub fn rust(version: Version, text: &str) -> Result<Self, SyntaxError> {
        Self::new(tree_sitter_rust::LANGUAGE.into(), version, text)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn check(&self, node: NodeRef) -> Result<&NodeRecord, SyntaxError> {
        if node.version() != self.version {
            return Err(SyntaxError::StaleNode {
                node: node.version(),
                tree: self.version,
            });
        }
        self.nodes.get(node.index()).ok_or(SyntaxError::StaleNode {
            node: node.version(),
            tree: self.version,
        })
    }

    fn check_version(&self, requested: Version) -> Result<(), SyntaxError> {
        if requested != self.version {
            return Err(SyntaxError::VersionMismatch {
                requested,
                tree: self.version,
            });
        }
        Ok(())
    }

    fn node(&self, index: u32) -> NodeRef {
        NodeRef::new(self.version, index)
    }

    fn sibling(&self, node: NodeRef, step: isize) -> Result<Option<NodeRef>, SyntaxError> {
        let record = self.check(node)?;
        let Some(parent) = record.parent else {
            return Ok(None);
        };
        let siblings = &self.nodes[parent as usize].children;
        let Some(pos) = siblings.iter().position(|&c| c as usize == node.index()) else {
            return Ok(None);
        };
        let target = pos as isize + step;
        if target < 0 {
            return Ok(None);
        }
        Ok(siblings.get(target as usize).map(|&i| self.node(i)))
    }
}

fn flatten(tree: &Tree) -> Vec<NodeRecord> {
    let mut nodes: Vec<NodeRecord> = Vec::new();
    let mut stack = vec![(tree.root_node(), None::<u32>)];
    while let Some((node, parent)) = stack.pop() {
        let index = nodes.len() as u32;
        nodes.push(NodeRecord {
            kind: node.kind(),
            range: node.byte_range(),
            named: node.is_named(),
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            nodes[p as usize].children.push(index);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        // Reverse push keeps pre-order, so sibling indices ascend.
        for child in children.into_iter().rev() {
            stack.push((child, Some(index)));
        }
    }
    nodes
}

fn covers(node: &Range<usize>, query: &Range<usize>) -> bool {
    if query.is_empty() {
        node.start <= query.start && query.start < node.end
    } else {
        node.start <= query.start && query.end <= node.end
    }
}

impl SyntaxProvider for TreeSitterSyntax {
    fn version(&self) -> Version {
        self.version
    }

    fn root(&self, version: Version) -> Result<NodeRef, SyntaxError> {
        self.check_version(version)?;
        Ok(self.node(0))
    }

    fn node_at(&self, version: Version, range: Range<usize>) -> Result<NodeRef, SyntaxError> {
        self.check_version(version)?;
        let mut current = 0u32;
        loop {
            let next = self.nodes[current as usize]
                .children
                .iter()
                .copied()
                .find(|&c| covers(&self.nodes[c as usize].range, &range));
            match next {
                Some(child) => current = child,
                None => return Ok(self.node(current)),
            }
        }
    }

    fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>, SyntaxError> {
        Ok(self.check(node)?.parent.map(|p| self.node(p)))
    }

    fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>, SyntaxError> {
        Ok(self
            .check(node)?
            .children
            .iter()
            .map(|&c| self.node(c))
            .collect())
    }

    fn next_sibling(&self, node: NodeRef) -> Result<Option<NodeRef>, SyntaxError> {
        self.sibling(node, 1)
    }

    fn previous_sibling(&self, node: NodeRef) -> Result<Option<NodeRef>, SyntaxError> {
        self.sibling(node, -1)
    }

    fn range(&self, node: NodeRef) -> Result<Range<usize>, SyntaxError> {
        Ok(self.check(node)?.range.clone())
    }

    fn kind(&self, node: NodeRef) -> Result<&str, SyntaxError> {
        Ok(self.check(node)?.kind)
    }

    fn is_named(&self, node: NodeRef) -> Result<bool, SyntaxError> {
        Ok(self.check(node)?.named)
    }

    fn reparse(&mut self, version: Version, text: &str) -> Result<(), SyntaxError> {
        let tree = self.parser.parse(text, None).ok_or(SyntaxError::ParseFailed)?;
        self.nodes = flatten(&tree);
        self.version = version;
        trace!(
            target: "syntax.parse",
            version = version.0,
            nodes = self.nodes.len(),
            "tree_built"
        );
        Ok(())
    }
}
