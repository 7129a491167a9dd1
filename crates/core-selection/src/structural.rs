//! Syntax-node navigation over named nodes of a [`SyntaxProvider`].

use core_syntax::{NodeRef, SyntaxProvider};
use core_text::Version;

use crate::{EngineError, Resolution, Selection};

pub(crate) struct Structure<'a> {
    provider: &'a dyn SyntaxProvider,
    version: Version,
    kinds: &'a [String],
}

impl<'a> Structure<'a> {
    pub(crate) fn new(
        provider: &'a dyn SyntaxProvider,
        version: Version,
        kinds: &'a [String],
    ) -> Result<Self, EngineError> {
        if provider.version() != version {
            return Err(EngineError::ContractViolation(format!(
                "syntax tree at {:?} but buffer at {:?}",
                provider.version(),
                version
            )));
        }
        Ok(Self {
            provider,
            version,
            kinds,
        })
    }

    fn check(&self, node: NodeRef) -> Result<NodeRef, EngineError> {
        if node.version() != self.version {
            return Err(EngineError::ContractViolation(format!(
                "node from {:?} returned for {:?}",
                node.version(),
                self.version
            )));
        }
        Ok(node)
    }

    fn is_root(&self, node: NodeRef) -> Result<bool, EngineError> {
        Ok(self.provider.parent(node)?.is_none())
    }

    fn qualifies(&self, node: NodeRef) -> Result<bool, EngineError> {
        if !self.provider.is_named(node)? || self.provider.range(node)?.is_empty() {
            return Ok(false);
        }
        if self.kinds.is_empty() {
            return Ok(true);
        }
        let kind = self.provider.kind(node)?;
        Ok(self.kinds.iter().any(|k| k == kind))
    }

    fn selection(&self, node: NodeRef) -> Result<Resolution, EngineError> {
        let range = self.provider.range(node)?;
        Ok(Resolution::Found(Selection::new(range)))
    }

    /// Node represented by `sel`: the smallest qualifying node covering it,
    /// widened to the outermost non-root ancestor sharing its range.
    fn node_for(&self, sel: &Selection) -> Result<Option<NodeRef>, EngineError> {
        let mut node = self.check(self.provider.node_at(self.version, sel.range())?)?;
        while !self.qualifies(node)? {
            match self.provider.parent(node)? {
                Some(parent) => node = self.check(parent)?,
                None => return Ok(None),
            }
        }
        let range = self.provider.range(node)?;
        while let Some(parent) = self.provider.parent(node)? {
            let parent = self.check(parent)?;
            if self.is_root(parent)?
                || self.provider.range(parent)? != range
                || !self.qualifies(parent)?
            {
                break;
            }
            node = parent;
        }
        Ok(Some(node))
    }

    /// Qualifying siblings of `node`, in order, including `node` itself.
    fn siblings(&self, node: NodeRef) -> Result<Vec<NodeRef>, EngineError> {
        let Some(parent) = self.provider.parent(node)? else {
            return Ok(vec![node]);
        };
        let mut out = Vec::new();
        for child in self.provider.children(parent)? {
            let child = self.check(child)?;
            if child == node || self.qualifies(child)? {
                out.push(child);
            }
        }
        Ok(out)
    }

    fn sibling_at(
        &self,
        sel: &Selection,
        pick: impl Fn(&[NodeRef], usize) -> Option<NodeRef>,
    ) -> Result<Resolution, EngineError> {
        let Some(node) = self.node_for(sel)? else {
            return Ok(Resolution::NoMatch);
        };
        let siblings = self.siblings(node)?;
        let pos = siblings.iter().position(|&n| n == node).unwrap_or(0);
        match pick(&siblings, pos) {
            Some(target) if target != node || sel.range() != self.provider.range(node)? => {
                self.selection(target)
            }
            _ => Ok(Resolution::NoMatch),
        }
    }

    pub(crate) fn current(&self, sel: &Selection) -> Result<Resolution, EngineError> {
        match self.node_for(sel)? {
            Some(node) => self.selection(node),
            None => Ok(Resolution::NoMatch),
        }
    }

    pub(crate) fn next(&self, sel: &Selection) -> Result<Resolution, EngineError> {
        self.sibling_at(sel, |s, i| s.get(i + 1).copied())
    }

    pub(crate) fn previous(&self, sel: &Selection) -> Result<Resolution, EngineError> {
        self.sibling_at(sel, |s, i| i.checked_sub(1).and_then(|p| s.get(p).copied()))
    }

    pub(crate) fn first(&self, sel: &Selection) -> Result<Resolution, EngineError> {
        self.sibling_at(sel, |s, _| s.first().copied())
    }

    pub(crate) fn last(&self, sel: &Selection) -> Result<Resolution, EngineError> {
        self.sibling_at(sel, |s, _| s.last().copied())
    }

    pub(crate) fn index(&self, sel: &Selection, n: usize) -> Result<Resolution, EngineError> {
        self.sibling_at(sel, |s, _| s.get(n).copied())
    }

    /// Nearest qualifying ancestor with a strictly larger range, short of the root.
    pub(crate) fn up(&self, sel: &Selection) -> Result<Resolution, EngineError> {
        let Some(node) = self.node_for(sel)? else {
            return Ok(Resolution::NoMatch);
        };
        let range = self.provider.range(node)?;
        let mut current = node;
        while let Some(parent) = self.provider.parent(current)? {
            let parent = self.check(parent)?;
            if self.is_root(parent)? {
                break;
            }
            if self.provider.range(parent)? != range && self.qualifies(parent)? {
                return self.selection(parent);
            }
            current = parent;
        }
        Ok(Resolution::NoMatch)
    }

    /// First qualifying descendant (depth first) with a strictly smaller range.
    pub(crate) fn down(&self, sel: &Selection) -> Result<Resolution, EngineError> {
        let Some(node) = self.node_for(sel)? else {
            return Ok(Resolution::NoMatch);
        };
        let range = self.provider.range(node)?;
        let mut stack: Vec<NodeRef> = self.provider.children(node)?.into_iter().rev().collect();
        while let Some(candidate) = stack.pop() {
            let candidate = self.check(candidate)?;
            if self.qualifies(candidate)? && self.provider.range(candidate)? != range {
                return self.selection(candidate);
            }
            stack.extend(self.provider.children(candidate)?.into_iter().rev());
        }
        Ok(Resolution::NoMatch)
    }

    /// Every qualifying node, outermost first, for select-all.
    pub(crate) fn all(&self) -> Result<Vec<Selection>, EngineError> {
        let mut out = Vec::new();
        let root = self.check(self.provider.root(self.version)?)?;
        let mut stack: Vec<NodeRef> = self.provider.children(root)?.into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            let node = self.check(node)?;
            if self.qualifies(node)? {
                out.push(Selection::new(self.provider.range(node)?));
                continue;
            }
            stack.extend(self.provider.children(node)?.into_iter().rev());
        }
        Ok(out)
    }
}
